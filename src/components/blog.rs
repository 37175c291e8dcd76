use crate::actions;
use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::models::Article;
use crate::nav::{routes, use_navigator};
use crate::preview::preview_text;
use crate::shell::use_back_button;
use crate::state::AppContext;
use crate::util::display_date;
use icons::{ChevronLeft, Menu, X};
use leptos::prelude::*;
use leptos::task::spawn_local;

const NO_CONTENT: &str = "No content available";

const PRIMARY_LINK: &str =
    "block w-full rounded-md bg-primary px-4 py-2 text-center text-sm font-medium text-primary-foreground hover:bg-primary/90";
const SECONDARY_LINK: &str =
    "block w-full rounded-md border border-border px-4 py-2 text-center text-sm font-medium hover:bg-accent";

#[component]
pub fn BlogList(posts: Vec<Article>) -> impl IntoView {
    let navigator = StoredValue::new(use_navigator());

    view! {
        <div class="mx-auto flex max-w-4xl flex-col gap-4">
            {posts
                .into_iter()
                .map(|post| {
                    let post_id = post.id.clone();
                    let author = post.username.clone();
                    let preview = preview_text(&post.content);
                    let preview = if preview.is_empty() { NO_CONTENT.to_string() } else { preview };

                    view! {
                        <article class="rounded-lg border border-border bg-card p-4 shadow-sm">
                            <Button
                                variant=ButtonVariant::Link
                                size=ButtonSize::Inline
                                class="text-left text-lg font-semibold whitespace-normal"
                                on:click=move |_| navigator.with_value(|n| n.go_to_post(&post_id))
                            >
                                {post.title}
                            </Button>
                            <p class="mt-1 text-xs text-muted-foreground">
                                "Posted by "
                                <Button
                                    variant=ButtonVariant::Link
                                    size=ButtonSize::Inline
                                    class="text-xs"
                                    on:click=move |_| navigator.with_value(|n| n.go_to_author(&author))
                                >
                                    {post.username}
                                </Button>
                                {format!(" on {}", display_date(&post.posted_at))}
                            </p>
                            <p class="mt-2 whitespace-pre-line text-sm text-foreground/80">{preview}</p>
                        </article>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
pub fn SearchBar(#[prop(into, optional)] initial: String) -> impl IntoView {
    let query: RwSignal<String> = RwSignal::new(initial);
    let navigator = StoredValue::new(use_navigator());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let q = query.get_untracked();
        let q = q.trim();
        if !q.is_empty() {
            navigator.with_value(|n| n.go_to(&routes::search(q)));
        }
    };

    view! {
        <form class="mx-auto flex w-full max-w-xl gap-2" on:submit=on_submit>
            <Input name="query" placeholder="Search posts..." bind_value=query class="h-10" />
            <Button size=ButtonSize::Lg>"Search"</Button>
        </form>
    }
}

/// Slide-in menu: profile and logout when signed in, login otherwise, home always.
#[component]
pub fn Sidebar(open: RwSignal<bool>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());
    let signed_in = move || app_state.0.is_signed_in();

    let on_logout = move |_| {
        let client = app_state.0.client();
        spawn_local(async move {
            actions::sign_out(&client).await;
            app_state.0.clear_session();
            open.try_set(false);
            navigator.try_with_value(|n| n.go_to(routes::HOME));
        });
    };

    let panel_class = move || {
        if open.get() {
            "fixed top-0 right-0 z-40 flex h-full w-64 flex-col border-l border-border bg-background shadow-lg transition-transform translate-x-0"
        } else {
            "fixed top-0 right-0 z-40 flex h-full w-64 flex-col border-l border-border bg-background shadow-lg transition-transform translate-x-full"
        }
    };

    view! {
        <aside class=panel_class>
            <div class="flex items-center justify-between p-6">
                <h2 class="text-lg font-semibold text-primary">"Menu"</h2>
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Icon
                    attr:aria-label="Close menu"
                    on:click=move |_| open.set(false)
                >
                    <X />
                </Button>
            </div>
            <nav class="flex flex-col gap-3 px-6">
                <Show
                    when=signed_in
                    fallback=|| view! { <a href=routes::LOGIN class=PRIMARY_LINK>"Login"</a> }
                >
                    <a href=routes::PROFILE class=PRIMARY_LINK>"Profile"</a>
                    <a href=routes::POST_BLOG class=SECONDARY_LINK>"New post"</a>
                    <Button variant=ButtonVariant::Destructive class="w-full" on:click=on_logout>
                        "Logout"
                    </Button>
                </Show>
                <a href=routes::HOME class=SECONDARY_LINK>"Home"</a>
            </nav>
        </aside>
    }
}

/// Back arrow that also answers the device back button while mounted.
#[component]
pub fn BackButton() -> impl IntoView {
    let navigator = StoredValue::new(use_navigator());
    use_back_button(move || {
        navigator.try_with_value(|n| n.go_back());
    });

    view! {
        <Button
            variant=ButtonVariant::Ghost
            size=ButtonSize::Icon
            attr:aria-label="Back"
            on:click=move |_| navigator.with_value(|n| n.go_back())
        >
            <ChevronLeft />
        </Button>
    }
}

/// Top bar shared by every content page: optional back arrow, title and menu toggle.
#[component]
pub fn PageHeader(
    #[prop(into, optional)] title: String,
    #[prop(optional)] with_back: bool,
) -> impl IntoView {
    let menu_open: RwSignal<bool> = RwSignal::new(false);

    view! {
        <Sidebar open=menu_open />
        <header class="mx-auto flex max-w-4xl items-center justify-between gap-2 py-4">
            <div class="w-9">
                <Show when=move || with_back fallback=|| ().into_view()>
                    <BackButton />
                </Show>
            </div>
            <h1 class="text-center text-xl font-semibold">{title}</h1>
            <div class="w-9">
                <Show when=move || !menu_open.get() fallback=|| ().into_view()>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Icon
                        attr:aria-label="Open menu"
                        on:click=move |_| menu_open.set(true)
                    >
                        <Menu />
                    </Button>
                </Show>
            </div>
        </header>
    }
}
