use crate::pages::{
    AuthorPage, ChangePasswordPage, CheckEmailPage, HomePage, LoginPage, PostBlogPage,
    PostDetailPage, ProfilePage, SearchPage, SignupPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();
    state.verify_session();
    provide_context(AppContext(state));

    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("") view=HomePage />
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("signup") view=SignupPage />
                <Route path=path!("check-email") view=CheckEmailPage />
                <Route path=path!("change-password") view=ChangePasswordPage />
                <Route path=path!("profile") view=ProfilePage />
                <Route path=path!("postblog") view=PostBlogPage />
                <Route path=path!("postdetail") view=PostDetailPage />
                <Route path=path!("author") view=AuthorPage />
                <Route path=path!("search") view=SearchPage />
            </Routes>
        </Router>
    }
}
