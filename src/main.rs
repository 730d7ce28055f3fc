use anyhow::Context;
use booklist_app::modules;
use booklist_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load booklist settings")?;

    booklist_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        database = %settings.database.name,
        "booklist-app bootstrap starting"
    );

    let store = modules::books::store::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, &settings);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("booklist-app bootstrap complete");

    let served = booklist_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
