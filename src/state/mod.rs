use crate::api::{Backend, BackendClient, EnvConfig};
use crate::models::Session;
use crate::session::SessionStore;
use crate::shell::is_native_shell;
use crate::storage::LocalStore;
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub config: StoredValue<EnvConfig>,
    pub backend: RwSignal<BackendClient>,
    /// Signed-in identity. Persisted only inside the native shell.
    pub session: RwSignal<SessionStore>,
}

impl AppState {
    pub fn new() -> Self {
        let config = EnvConfig::new();
        let mut backend = BackendClient::from_config(&config);
        let mut session = SessionStore::new(LocalStore, is_native_shell());
        session.restore(&mut backend);

        log::debug!(
            "backend at {}, signed in: {}",
            config.url,
            session.is_signed_in()
        );

        Self {
            config: StoredValue::new(config),
            backend: RwSignal::new(backend),
            session: RwSignal::new(session),
        }
    }

    /// Snapshot of the client for an async task.
    pub fn client(&self) -> BackendClient {
        self.backend.get_untracked()
    }

    /// Email of the signed-in user. Tracks the session signal.
    pub fn signed_in_email(&self) -> Option<String> {
        self.session.with(|s| s.email().map(str::to_string))
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.with(|s| s.is_signed_in())
    }

    pub fn store_session(&self, session: Session) {
        self.backend.update(|client| {
            self.session.update(|store| store.set(session, client));
        });
    }

    pub fn clear_session(&self) {
        self.backend.update(|client| {
            self.session.update(|store| store.clear(client));
        });
    }

    /// Drop a restored session the backend no longer accepts.
    pub fn verify_session(&self) {
        let client = self.client();
        if !client.is_authenticated() {
            return;
        }
        let state = *self;
        spawn_local(async move {
            match client.current_user().await {
                Ok(Some(user)) => log::debug!("session valid for {:?}", user.email),
                Ok(None) => {
                    log::info!("stored session rejected, signing out locally");
                    state.clear_session();
                }
                Err(e) => log::warn!("could not verify session: {e}"),
            }
        });
    }

    pub fn default_profile_photo(&self) -> String {
        self.config.with_value(|c| c.default_profile_photo.clone())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
