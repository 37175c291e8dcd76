use leptos_router::hooks::use_navigate;
use leptos_router::NavigateOptions;

/// Client-side routes and their builders. Query values are URL-encoded.
pub(crate) mod routes {
    use urlencoding::encode;

    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const SIGNUP: &str = "/signup";
    pub const CHANGE_PASSWORD: &str = "/change-password";
    pub const PROFILE: &str = "/profile";
    pub const POST_BLOG: &str = "/postblog";

    pub fn check_email(email: &str) -> String {
        format!("/check-email?email={}", encode(email))
    }

    pub fn post_detail(article_id: &str) -> String {
        format!("/postdetail?post_id={}", encode(article_id))
    }

    pub fn author(username: &str) -> String {
        format!("/author?username={}", encode(username))
    }

    pub fn search(query: &str) -> String {
        format!("/search?query={}", encode(query))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BackAction {
    /// One step back in history.
    Back,
    /// Nothing to go back to (deep link); go home instead.
    Home,
}

pub(crate) fn back_action(history_depth: u32) -> BackAction {
    if history_depth > 1 {
        BackAction::Back
    } else {
        BackAction::Home
    }
}

/// What the coordinator needs from the environment.
pub(crate) trait NavigationHost {
    fn history_depth(&self) -> u32;
    fn back(&self);
    fn push(&self, path: &str);
}

/// Browser history plus the router's navigate function.
#[derive(Clone)]
pub(crate) struct BrowserHost<F> {
    navigate: F,
}

impl<F> NavigationHost for BrowserHost<F>
where
    F: Fn(&str, NavigateOptions),
{
    fn history_depth(&self) -> u32 {
        web_sys::window()
            .and_then(|w| w.history().ok())
            .and_then(|h| h.length().ok())
            .unwrap_or(0)
    }

    fn back(&self) {
        if let Some(history) = web_sys::window().and_then(|w| w.history().ok()) {
            if let Err(e) = history.back() {
                log::warn!("history.back failed: {e:?}");
            }
        }
    }

    fn push(&self, path: &str) {
        (self.navigate)(path, NavigateOptions::default());
    }
}

/// Resolves in-app links and the back gesture into router navigations.
#[derive(Clone)]
pub(crate) struct Navigator<H> {
    host: H,
}

impl<H: NavigationHost> Navigator<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn go_to(&self, path: &str) {
        log::debug!("navigate -> {path}");
        self.host.push(path);
    }

    pub fn go_to_author(&self, username: &str) {
        self.go_to(&routes::author(username));
    }

    pub fn go_to_post(&self, article_id: &str) {
        self.go_to(&routes::post_detail(article_id));
    }

    pub fn go_back(&self) {
        match back_action(self.host.history_depth()) {
            BackAction::Back => self.host.back(),
            BackAction::Home => self.go_to(routes::HOME),
        }
    }
}

/// Navigator bound to the current router. Must be called under a `<Router>`.
pub(crate) fn use_navigator(
) -> Navigator<BrowserHost<impl Fn(&str, NavigateOptions) + Clone + Send + Sync + 'static>> {
    Navigator::new(BrowserHost {
        navigate: use_navigate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeHost {
        depth: u32,
        backs: RefCell<u32>,
        pushed: RefCell<Vec<String>>,
    }

    impl NavigationHost for FakeHost {
        fn history_depth(&self) -> u32 {
            self.depth
        }

        fn back(&self) {
            *self.backs.borrow_mut() += 1;
        }

        fn push(&self, path: &str) {
            self.pushed.borrow_mut().push(path.to_string());
        }
    }

    fn nav(depth: u32) -> Navigator<FakeHost> {
        Navigator::new(FakeHost {
            depth,
            ..FakeHost::default()
        })
    }

    #[test]
    fn test_go_back_with_shallow_history_goes_home() {
        for depth in [0, 1] {
            let n = nav(depth);
            n.go_back();
            assert_eq!(*n.host.backs.borrow(), 0);
            assert_eq!(*n.host.pushed.borrow(), vec!["/".to_string()]);
        }
    }

    #[test]
    fn test_go_back_with_history_steps_back_once() {
        for depth in [2, 7] {
            let n = nav(depth);
            n.go_back();
            assert_eq!(*n.host.backs.borrow(), 1);
            assert!(n.host.pushed.borrow().is_empty());
        }
    }

    #[test]
    fn test_link_targets() {
        let n = nav(1);
        n.go_to_author("ann lee");
        n.go_to_post("42");
        assert_eq!(
            *n.host.pushed.borrow(),
            vec![
                "/author?username=ann%20lee".to_string(),
                "/postdetail?post_id=42".to_string()
            ]
        );
    }

    #[test]
    fn test_route_builders_encode_values() {
        assert_eq!(routes::search("cats & dogs"), "/search?query=cats%20%26%20dogs");
        assert_eq!(
            routes::check_email("a+b@example.com"),
            "/check-email?email=a%2Bb%40example.com"
        );
    }
}
