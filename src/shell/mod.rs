//! Bridge to the native mobile shell, when the app runs inside one.
//!
//! The shell injects `window.Capacitor`; on a plain browser every call here is a no-op.

use js_sys::{Function, Promise, Reflect};
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

const BACK_BUTTON_EVENT: &str = "backButton";

fn capacitor() -> Option<JsValue> {
    let window = web_sys::window()?;
    let cap = Reflect::get(&window, &"Capacitor".into()).ok()?;
    (!cap.is_undefined() && !cap.is_null()).then_some(cap)
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &name.into())
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

/// True inside the native shell, false in a browser tab.
pub(crate) fn is_native_shell() -> bool {
    let Some(cap) = capacitor() else {
        return false;
    };
    method(&cap, "isNativePlatform")
        .and_then(|f| f.call0(&cap).ok())
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

fn app_plugin() -> Option<JsValue> {
    let plugins = Reflect::get(&capacitor()?, &"Plugins".into()).ok()?;
    let app = Reflect::get(&plugins, &"App".into()).ok()?;
    (!app.is_undefined()).then_some(app)
}

/// Something that can detach a native listener.
pub(crate) trait ListenerHandle {
    fn remove(&self);
}

/// Lifecycle of one listener registration.
///
/// Registration is asynchronous, so the view may unmount before the native handle
/// exists. A handle attached after release is removed on the spot.
pub(crate) enum ListenerSlot<H> {
    Pending,
    Active(H),
    Released,
}

impl<H: ListenerHandle> ListenerSlot<H> {
    pub fn attach(&mut self, handle: H) {
        match self {
            ListenerSlot::Released => handle.remove(),
            ListenerSlot::Active(old) => {
                old.remove();
                *self = ListenerSlot::Active(handle);
            }
            ListenerSlot::Pending => *self = ListenerSlot::Active(handle),
        }
    }

    pub fn release(&mut self) {
        if let ListenerSlot::Active(handle) = std::mem::replace(self, ListenerSlot::Released) {
            handle.remove();
        }
    }
}

/// Native listener handle plus the JS callback it points at.
struct NativeListener {
    handle: JsValue,
    _callback: Closure<dyn Fn()>,
}

impl ListenerHandle for NativeListener {
    fn remove(&self) {
        match method(&self.handle, "remove") {
            Some(f) => {
                if let Err(e) = f.call0(&self.handle) {
                    log::warn!("failed to remove {BACK_BUTTON_EVENT} listener: {e:?}");
                }
            }
            None => log::warn!("{BACK_BUTTON_EVENT} listener handle has no remove()"),
        }
    }
}

/// Run `on_back` whenever the hardware back button is pressed while the calling
/// view is mounted.
///
/// The subscription is released when the view's owner is cleaned up, which covers
/// normal unmount, navigating away and error-boundary teardown.
pub(crate) fn use_back_button(on_back: impl Fn() + 'static) {
    let Some(app) = app_plugin() else {
        return;
    };
    let Some(add_listener) = method(&app, "addListener") else {
        return;
    };

    let slot = StoredValue::new_local(ListenerSlot::<NativeListener>::Pending);
    on_cleanup(move || {
        slot.try_update_value(|s| s.release());
    });

    let callback = Closure::<dyn Fn()>::new(on_back);
    let registered = match add_listener.call2(
        &app,
        &BACK_BUTTON_EVENT.into(),
        callback.as_ref(),
    ) {
        Ok(v) => v,
        Err(e) => {
            log::error!("could not subscribe to {BACK_BUTTON_EVENT}: {e:?}");
            return;
        }
    };

    spawn_local(async move {
        // `addListener` resolves to the handle; older shells return it directly.
        let handle = match JsFuture::from(Promise::resolve(&registered)).await {
            Ok(h) => h,
            Err(e) => {
                log::error!("{BACK_BUTTON_EVENT} registration failed: {e:?}");
                return;
            }
        };
        let listener = NativeListener {
            handle,
            _callback: callback,
        };

        // The owner may already be gone; then nobody else can release it.
        let mut pending = Some(listener);
        slot.try_update_value(|s| {
            if let Some(l) = pending.take() {
                s.attach(l);
            }
        });
        if let Some(orphan) = pending {
            orphan.remove();
        }
    });
}
