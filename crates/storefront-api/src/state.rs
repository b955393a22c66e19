use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use storefront_db::Database;

use crate::error::ApiError;
use crate::identity::{IdentityProvider, JwtIdentity};

pub type AppState = Arc<AppStateInner>;

/// Account and token settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Lower-cased emails that are granted admin rights at registration.
    pub admin_emails: Vec<String>,
}

pub struct AppStateInner {
    pub db: Database,
    /// Resolves callers on every request.
    pub identity: Arc<dyn IdentityProvider>,
    /// Issues tokens at login/registration.
    pub tokens: JwtIdentity,
    pub admin_emails: Vec<String>,
}

impl AppStateInner {
    /// State that resolves callers from the JWTs it issues.
    pub fn new(db: Database, settings: AuthSettings) -> Self {
        let tokens = JwtIdentity::new(settings.jwt_secret, settings.token_ttl);
        Self {
            db,
            identity: Arc::new(tokens.clone()),
            tokens,
            admin_emails: settings.admin_emails,
        }
    }

    /// Swap in another identity provider.
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = identity;
        self
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|e| *e == email)
    }
}

/// Run a blocking DB call off the async runtime. `what` names the operation
/// in the server log if it fails.
pub(crate) async fn run_db<F, T>(state: &AppState, what: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("{}: worker failed", what))
        })?
        .map_err(|e| ApiError::Internal(e.context(what)))
}
