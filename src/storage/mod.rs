use serde::{Deserialize, Serialize};

/// Device key for the mirrored auth session (mobile shell only).
pub(crate) const SESSION_KEY: &str = "user_session";

/// String key-value storage that survives app restarts.
pub(crate) trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// `window.localStorage`. Inside the mobile shell's webview this is app-private
/// and persists across launches.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalStore;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl KeyValueStore for LocalStore {
    fn get_item(&self, key: &str) -> Option<String> {
        local_storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Some(storage) = local_storage() {
            if storage.set_item(key, value).is_err() {
                log::warn!("localStorage write failed for {key}");
            }
        }
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = local_storage() {
            if storage.remove_item(key).is_err() {
                log::warn!("localStorage remove failed for {key}");
            }
        }
    }
}

pub(crate) fn load_json<T: for<'de> Deserialize<'de>>(
    store: &impl KeyValueStore,
    key: &str,
) -> Option<T> {
    let json = store.get_item(key)?;
    match serde_json::from_str(&json) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("discarding unreadable {key}: {e}");
            None
        }
    }
}

pub(crate) fn save_json<T: Serialize>(store: &impl KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => store.set_item(key, &json),
        Err(e) => log::warn!("could not serialize {key}: {e}"),
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Item {
        n: u32,
    }

    #[test]
    fn test_json_roundtrip() {
        let store = MemoryStore::default();
        save_json(&store, "k", &Item { n: 3 });
        assert_eq!(load_json::<Item>(&store, "k"), Some(Item { n: 3 }));
    }

    #[test]
    fn test_unreadable_json_is_none() {
        let store = MemoryStore::default();
        store.set_item("k", "{not json");
        assert_eq!(load_json::<Item>(&store, "k"), None);
    }
}
