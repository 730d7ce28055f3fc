pub mod books;

use std::sync::Arc;

use booklist_kernel::{settings::Settings, ModuleRegistry};

use books::store::BookStore;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<dyn BookStore>, settings: &Settings) {
    registry.register(books::create_module(store, settings));
}
