use std::sync::Arc;

use crate::supabase::{ContentStore, IdentityVerifier, UserDirectory};

/// Shared application state.
///
/// The external-service clients are constructed once at startup and injected
/// here so the gates depend on seams rather than module-level singletons;
/// tests substitute in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub directory: Arc<dyn UserDirectory>,
    pub posts: Arc<dyn ContentStore>,
}
