use crate::api::Backend;
use crate::models::Session;
use crate::storage::{load_json, save_json, KeyValueStore, LocalStore, SESSION_KEY};

/// The signed-in identity for the app's lifetime.
///
/// One slot, last write wins. When `persist` is set (mobile shell builds) the slot is
/// mirrored to device storage so the next launch can restore it.
#[derive(Clone, Debug)]
pub(crate) struct SessionStore<S: KeyValueStore = LocalStore> {
    storage: S,
    persist: bool,
    slot: Option<Session>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S, persist: bool) -> Self {
        Self {
            storage,
            persist,
            slot: None,
        }
    }

    /// Re-hydrate from device storage and hand the session to the backend.
    ///
    /// No-op when persistence is off or nothing was stored.
    pub fn restore(&mut self, backend: &mut impl Backend) -> Option<&Session> {
        if !self.persist {
            return self.slot.as_ref();
        }

        if let Some(stored) = load_json::<Session>(&self.storage, SESSION_KEY) {
            log::debug!("restored session for {:?}", stored.email());
            backend.set_session(Some(stored.clone()));
            self.slot = Some(stored);
        }
        self.slot.as_ref()
    }

    pub fn email(&self) -> Option<&str> {
        self.slot.as_ref().and_then(|s| s.email())
    }

    pub fn is_signed_in(&self) -> bool {
        self.slot.is_some()
    }

    pub fn set(&mut self, session: Session, backend: &mut impl Backend) {
        if self.persist {
            save_json(&self.storage, SESSION_KEY, &session);
        }
        backend.set_session(Some(session.clone()));
        self.slot = Some(session);
    }

    pub fn clear(&mut self, backend: &mut impl Backend) {
        if self.persist {
            self.storage.remove_item(SESSION_KEY);
        }
        backend.set_session(None);
        self.slot = None;
    }
}
