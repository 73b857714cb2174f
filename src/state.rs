use crate::plugin::Catalogue;

/// Shared application state injected into every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalogue: Catalogue,
}
