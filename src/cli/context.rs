use std::sync::Arc;

use crate::cli::config::token_file;
use crate::cli::OutputFormat;
use crate::config::{config, BackendKind};
use crate::gateway::{AuthChange, DataGateway, RestGateway, SupabaseGateway};
use crate::router::{Navigation, Route, RouteGuard};
use crate::storage::{usable_token, FileTokenStore, TokenStore};
use crate::store::Store;

/// Everything a command needs, wired once per invocation
pub struct CliContext {
    pub store: Store,
    pub guard: RouteGuard,
    pub backend: BackendKind,
    pub output: OutputFormat,
}

impl CliContext {
    pub fn build(backend: Option<BackendKind>, output: OutputFormat) -> anyhow::Result<Self> {
        let app = config();
        let backend = backend.unwrap_or(app.backend.kind);
        let file_store = FileTokenStore::new(token_file()?);
        tracing::debug!("Token storage at {}", file_store.path().display());
        let tokens: Arc<dyn TokenStore> = Arc::new(file_store);

        let (gateway, token_key): (Arc<dyn DataGateway>, String) = match backend {
            BackendKind::Supabase => {
                let key = app.storage.token_key.clone();
                let gateway = SupabaseGateway::new(&app.backend)?;
                gateway.restore_session(usable_token(tokens.as_ref(), &key));
                log_auth_changes(&gateway);
                (Arc::new(gateway), key)
            }
            BackendKind::Rest => {
                let key = app.storage.rest_token_key.clone();
                let gateway = RestGateway::new(&app.rest, tokens.clone(), key.clone())?;
                (Arc::new(gateway), key)
            }
        };
        tracing::debug!("Using {} backend", gateway.name());

        Ok(Self {
            store: Store::new(gateway, tokens.clone(), token_key.clone()),
            guard: RouteGuard::new(tokens, token_key),
            backend,
            output,
        })
    }

    /// Refuse a gated command the way navigation to its view would be refused
    pub fn require(&self, route: Route) -> anyhow::Result<()> {
        match self.guard.check(route) {
            Navigation::Proceed => Ok(()),
            Navigation::Redirect(to) => Err(anyhow::anyhow!(
                "{} requires a signed-in user (redirected to {}; run `poetry auth login <email>`)",
                route.path(),
                to.path()
            )),
        }
    }
}

fn log_auth_changes(gateway: &SupabaseGateway) {
    let mut changes = gateway.subscribe_auth_changes();
    tokio::spawn(async move {
        while let Ok(change) = changes.recv().await {
            match change {
                AuthChange::SignedIn { user, .. } => {
                    let email = user.and_then(|u| u.email).unwrap_or_default();
                    tracing::debug!("Auth state changed: signed in {}", email);
                }
                AuthChange::SignedOut => tracing::debug!("Auth state changed: signed out"),
            }
        }
    });
}
