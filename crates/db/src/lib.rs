//! MongoDB client factory.
//!
//! The driver connects lazily; [`connect`] builds the client and
//! [`ping`] is used to verify the deployment is reachable.

use anyhow::Context;
use booklist_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, options::ClientOptions, Client, Database};

const APP_NAME: &str = "booklist-app";

/// Build client options from the configured URI and timeouts.
pub async fn client_options(settings: &DatabaseSettings) -> anyhow::Result<ClientOptions> {
    let mut options = ClientOptions::parse(&settings.uri)
        .await
        .with_context(|| "failed to parse MongoDB connection string")?;

    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(settings.connect_timeout());
    options.server_selection_timeout = Some(settings.connect_timeout());

    Ok(options)
}

/// Create a client and return a handle to the configured database.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let options = client_options(settings).await?;
    let client = Client::with_options(options).with_context(|| "failed to create MongoDB client")?;

    tracing::info!(
        target: "booklist-db",
        database = %settings.name,
        "MongoDB client created"
    );

    Ok(client.database(&settings.name))
}

/// Round-trip a `ping` command to the deployment.
pub async fn ping(database: &Database) -> anyhow::Result<()> {
    database
        .run_command(doc! { "ping": 1 })
        .await
        .with_context(|| "MongoDB ping failed")?;
    Ok(())
}
