use std::sync::Arc;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::email::Mailer;
use crate::store::Store;

/// Shared handles for every request. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthProvider>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        auth: Arc<dyn AuthProvider>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            auth,
            mailer,
        }
    }
}
