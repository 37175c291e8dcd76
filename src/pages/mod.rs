use crate::actions::{self, PhotoUpload};
use crate::components::blog::{BlogList, PageHeader, SearchBar};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardFooter, CardHeader, CardTitle, Input, Label, LoadingLine, Spinner,
    Textarea,
};
use crate::content::{
    fetch_post, fetch_posts_by_author, fetch_profile, fetch_recent_posts, search_posts, PageState,
    RequestCounter,
};
use crate::models::{Article, Profile};
use crate::nav::{routes, use_navigator};
use crate::preview::sanitize_markup;
use crate::state::AppContext;
use crate::util::{display_date, read_file_bytes};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::set_timeout;
use leptos_router::hooks::use_query_map;
use std::time::Duration;

const NO_BODY: &str = "No Content Available";

/// Read a non-blank query parameter from the current URL.
fn use_query_param(key: &'static str) -> impl Fn() -> Option<String> + Copy + 'static {
    let query = use_query_map();
    move || {
        query
            .with(|q| q.get(key))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn error_alert(message: String) -> impl IntoView {
    view! {
        <Alert class="border-destructive/30">
            <AlertDescription class="text-destructive text-xs">{message}</AlertDescription>
        </Alert>
    }
}

fn muted_note(message: String) -> impl IntoView {
    view! {
        <div class="rounded-md border border-border bg-muted p-4 text-sm text-muted-foreground">
            {message}
        </div>
    }
}

/// Store `state` only if `ticket` is still the latest fetch for `slot`.
fn set_if_current<T: Send + Sync + 'static>(
    requests: StoredValue<RequestCounter>,
    ticket: u64,
    slot: RwSignal<PageState<T>>,
    state: PageState<T>,
) {
    if requests.try_with_value(|r| r.is_current(ticket)) == Some(true) {
        slot.try_set(state);
    } else {
        log::debug!("dropping stale response {ticket}");
    }
}

/// Post list body shared by home, author and search pages.
fn post_list_view(
    state: PageState<Vec<Article>>,
    empty: String,
    error_prefix: &'static str,
) -> AnyView {
    match state {
        PageState::Loading => view! { <LoadingLine label="Loading..." /> }.into_any(),
        PageState::Ready(posts) if posts.is_empty() => muted_note(empty).into_any(),
        PageState::Ready(posts) => view! { <BlogList posts=posts /> }.into_any(),
        PageState::NotFound => muted_note(empty).into_any(),
        PageState::Error(e) => error_alert(format!("{error_prefix}: {e}")).into_any(),
    }
}

#[component]
fn FormField(
    #[prop(into)] id: String,
    #[prop(into)] label: String,
    #[prop(default = "text")] kind: &'static str,
    #[prop(into, optional)] placeholder: String,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="flex flex-col gap-1.5">
            <Label html_for=id.clone() class="text-xs">{label}</Label>
            <Input
                id=id
                r#type=kind
                placeholder=placeholder
                bind_value=value
                required=true
                class="h-8 text-sm"
            />
        </div>
    }
}

#[component]
fn ErrorNotice(error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <Show when=move || error.get().is_some() fallback=|| ().into_view()>
            {move || error.get().map(error_alert)}
        </Show>
    }
}

#[component]
fn SubmitButton(
    loading: RwSignal<bool>,
    idle: &'static str,
    busy: &'static str,
) -> impl IntoView {
    view! {
        <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
            <span class="inline-flex items-center gap-2">
                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner />
                </Show>
                {move || if loading.get() { busy } else { idle }}
            </span>
        </Button>
    }
}

#[component]
fn CenteredCard(
    #[prop(into)] title: String,
    #[prop(into, optional)] description: String,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href=routes::HOME class="text-sm font-medium text-foreground">"Argentic Blog"</a>
                </div>
                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{title}</CardTitle>
                        <CardDescription class="text-xs">{description}</CardDescription>
                    </CardHeader>
                    <CardContent>{children()}</CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn ContentLayout(
    #[prop(into, optional)] title: String,
    #[prop(optional)] with_back: bool,
    children: Children,
) -> impl IntoView {
    view! {
        <div class="min-h-screen bg-background px-4 pb-10 text-foreground">
            <PageHeader title=title with_back=with_back />
            <main class="mx-auto flex max-w-4xl flex-col gap-6">{children()}</main>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let posts: RwSignal<PageState<Vec<Article>>> = RwSignal::new(PageState::Loading);

    Effect::new(move |_| {
        let client = app_state.0.client();
        spawn_local(async move {
            let state = fetch_recent_posts(&client).await;
            posts.try_set(state);
        });
    });

    view! {
        <ContentLayout title="Argentic Blog">
            <SearchBar />
            <h2 class="text-center text-3xl font-bold text-primary">"Latest Blog Posts"</h2>
            {move || post_list_view(posts.get(), "No posts yet.".to_string(), "Error loading posts")}
        </ContentLayout>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get_untracked();
        let password_val = password.get_untracked();
        let client = app_state.0.client();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match actions::sign_in(&client, &email_val, &password_val).await {
                Ok(session) => {
                    app_state.0.store_session(session);
                    navigator.try_with_value(|n| n.go_to(routes::HOME));
                }
                Err(e) => {
                    error.try_set(Some(e.to_string()));
                }
            }
            loading.try_set(false);
        });
    };

    view! {
        <CenteredCard title="Log in" description="Use your email and password to continue.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <FormField id="email" label="Email" kind="email" placeholder="you@example.com" value=email />
                <FormField id="password" label="Password" kind="password" placeholder="••••••••" value=password />
                <ErrorNotice error=error />
                <SubmitButton loading=loading idle="Continue" busy="Signing in..." />
                <div class="pt-1 text-xs text-muted-foreground">
                    "No account? "
                    <a class="text-primary underline underline-offset-4" href=routes::SIGNUP>"Sign up"</a>
                </div>
            </form>
        </CenteredCard>
    }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get_untracked();
        let username_val = username.get_untracked();
        let password_val = password.get_untracked();
        let default_photo = app_state.0.default_profile_photo();
        let client = app_state.0.client();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match actions::sign_up(&client, &email_val, &username_val, &password_val, &default_photo)
                .await
            {
                Ok(()) => {
                    let target = routes::check_email(email_val.trim());
                    navigator.try_with_value(|n| n.go_to(&target));
                }
                Err(e) => {
                    error.try_set(Some(e.to_string()));
                }
            }
            loading.try_set(false);
        });
    };

    view! {
        <CenteredCard title="Create account" description="Pick a username for your posts.">
            <form class="flex flex-col gap-3" on:submit=on_submit>
                <FormField id="email" label="Email" kind="email" placeholder="you@example.com" value=email />
                <FormField id="username" label="Username" placeholder="yourname" value=username />
                <FormField id="password" label="Password" kind="password" placeholder="••••••••" value=password />
                <ErrorNotice error=error />
                <SubmitButton loading=loading idle="Sign up" busy="Creating account..." />
                <div class="pt-1 text-xs text-muted-foreground">
                    "Already registered? "
                    <a class="text-primary underline underline-offset-4" href=routes::LOGIN>"Log in"</a>
                </div>
            </form>
        </CenteredCard>
    }
}

#[component]
pub fn CheckEmailPage() -> impl IntoView {
    let email = use_query_param("email");

    view! {
        <CenteredCard title="Check Your Email">
            <div class="flex flex-col gap-3 text-sm">
                <p>
                    "A confirmation email has been sent to "
                    <span class="font-semibold text-primary">{move || email().unwrap_or_default()}</span>
                    "."
                </p>
                <p class="text-muted-foreground">
                    "Please check your inbox and follow the instructions to activate your account."
                </p>
                <p class="text-xs text-muted-foreground">
                    "Didn't receive the email? Check your spam folder or "
                    <a class="text-primary underline underline-offset-4" href=routes::SIGNUP>"try signing up again"</a>
                    "."
                </p>
                <a class="text-primary underline underline-offset-4" href=routes::LOGIN>"Go to Login"</a>
            </div>
        </CenteredCard>
    }
}

#[component]
pub fn ChangePasswordPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());

    let email: RwSignal<String> =
        RwSignal::new(app_state.0.session.with_untracked(|s| s.email().unwrap_or_default().to_string()));
    let old_password: RwSignal<String> = RwSignal::new(String::new());
    let new_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let success: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let email_val = email.get_untracked();
        let old_val = old_password.get_untracked();
        let new_val = new_password.get_untracked();
        let mut client = app_state.0.client();

        loading.set(true);
        error.set(None);
        success.set(None);

        spawn_local(async move {
            match actions::change_password(&mut client, &email_val, &old_val, &new_val).await {
                Ok(session) => {
                    app_state.0.store_session(session);
                    success.try_set(Some("Password changed successfully!".to_string()));
                    set_timeout(
                        move || {
                            navigator.try_with_value(|n| n.go_to(routes::LOGIN));
                        },
                        Duration::from_secs(2),
                    );
                }
                Err(e) => {
                    error.try_set(Some(e.to_string()));
                }
            }
            loading.try_set(false);
        });
    };

    view! {
        <ContentLayout title="Change Password" with_back=true>
            <Card class="mx-auto w-full max-w-md">
                <CardContent>
                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        <FormField id="email" label="Email" kind="email" placeholder="Email" value=email />
                        <FormField id="old-password" label="Old password" kind="password" placeholder="Old Password" value=old_password />
                        <FormField id="new-password" label="New password" kind="password" placeholder="New Password" value=new_password />
                        <ErrorNotice error=error />
                        <Show when=move || success.get().is_some() fallback=|| ().into_view()>
                            <Alert>
                                <AlertDescription class="text-xs">
                                    {move || success.get().unwrap_or_default()}
                                </AlertDescription>
                            </Alert>
                        </Show>
                        <SubmitButton loading=loading idle="Change Password" busy="Changing..." />
                    </form>
                </CardContent>
            </Card>
        </ContentLayout>
    }
}

#[component]
pub fn ProfilePage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());

    let profile: RwSignal<PageState<Profile>> = RwSignal::new(PageState::Loading);
    let username: RwSignal<String> = RwSignal::new(String::new());
    let photo_url: RwSignal<String> = RwSignal::new(app_state.0.default_profile_photo());
    let message: RwSignal<Option<String>> = RwSignal::new(None);
    let saving: RwSignal<bool> = RwSignal::new(false);
    let photo_input: NodeRef<html::Input> = NodeRef::new();

    let email = move || app_state.0.signed_in_email();

    Effect::new(move |_| {
        let Some(email) = email() else {
            return;
        };
        profile.set(PageState::Loading);
        let client = app_state.0.client();
        let placeholder = app_state.0.default_profile_photo();
        spawn_local(async move {
            let state = fetch_profile(&client, &email).await;
            if let Some(p) = state.ready() {
                username.try_set(p.username.clone());
                photo_url.try_set(p.photo_or(&placeholder).to_string());
            }
            profile.try_set(state);
        });
    });

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let Some(email_val) = email() else {
            return;
        };

        let username_val = username.get_untracked();
        let file = photo_input
            .get()
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        let client = app_state.0.client();

        saving.set(true);
        message.set(None);

        spawn_local(async move {
            let photo = match file {
                Some(file) => match read_file_bytes(&file).await {
                    Ok(bytes) => {
                        let content_type = match file.type_() {
                            t if t.is_empty() => "application/octet-stream".to_string(),
                            t => t,
                        };
                        Some(PhotoUpload {
                            file_name: file.name(),
                            content_type,
                            bytes,
                        })
                    }
                    Err(e) => {
                        log::error!("{e}");
                        message.try_set(Some(format!("Error uploading image: {e}")));
                        saving.try_set(false);
                        return;
                    }
                },
                None => None,
            };

            match actions::update_profile(&client, &email_val, &username_val, photo).await {
                Ok(new_photo) => {
                    if let Some(url) = new_photo {
                        photo_url.try_set(url);
                    }
                    message.try_set(Some("Profile updated successfully!".to_string()));
                }
                Err(e) => {
                    message.try_set(Some(e.to_string()));
                }
            }
            saving.try_set(false);
        });
    };

    let on_logout = move |_| {
        let client = app_state.0.client();
        spawn_local(async move {
            actions::sign_out(&client).await;
            app_state.0.clear_session();
            navigator.try_with_value(|n| n.go_to(routes::HOME));
        });
    };

    let my_posts = move |_| {
        let name = username.get_untracked();
        navigator.with_value(|n| n.go_to_author(&name));
    };

    view! {
        <ContentLayout title="Profile" with_back=true>
            <Show
                when=move || email().is_some()
                fallback=|| view! {
                    <div class="flex flex-col items-center gap-3">
                        {muted_note("You need to be logged in to view your profile.".to_string())}
                        <a class="text-primary underline underline-offset-4" href=routes::LOGIN>"Log in"</a>
                    </div>
                }
            >
                {move || match profile.get() {
                    PageState::Loading => view! { <LoadingLine label="Loading profile..." /> }.into_any(),
                    PageState::NotFound => muted_note("No profile found for this account.".to_string()).into_any(),
                    PageState::Error(e) => error_alert(format!("Error fetching user: {e}")).into_any(),
                    PageState::Ready(_) => view! {
                        <Card class="mx-auto w-full max-w-lg">
                            <CardHeader class="items-center">
                                <img
                                    src=move || photo_url.get()
                                    alt="Profile Photo"
                                    class="size-28 rounded-full border border-border object-cover"
                                />
                                <CardTitle class="mt-2 text-xl">
                                    {move || {
                                        let name = username.get();
                                        if name.is_empty() { "Username".to_string() } else { name }
                                    }}
                                </CardTitle>
                                <CardDescription>{move || email().unwrap_or_default()}</CardDescription>
                            </CardHeader>
                            <CardContent>
                                <form class="flex flex-col gap-3" on:submit=on_submit>
                                    <div class="flex flex-col gap-1.5">
                                        <Label html_for="photo" class="text-xs">"Profile photo"</Label>
                                        <input
                                            id="photo"
                                            type="file"
                                            accept="image/*"
                                            class="text-xs"
                                            node_ref=photo_input
                                        />
                                    </div>
                                    <FormField id="username" label="Username" placeholder="Enter new username" value=username />
                                    <Show when=move || message.get().is_some() fallback=|| ().into_view()>
                                        <p class="text-xs text-muted-foreground">
                                            {move || message.get().unwrap_or_default()}
                                        </p>
                                    </Show>
                                    <SubmitButton loading=saving idle="Update Profile" busy="Saving..." />
                                </form>
                            </CardContent>
                            <CardFooter class="flex-wrap justify-center">
                                <a class="text-sm text-primary underline underline-offset-4" href=routes::CHANGE_PASSWORD>
                                    "Change Password"
                                </a>
                                <a class="text-sm text-primary underline underline-offset-4" href=routes::POST_BLOG>
                                    "Write a Post"
                                </a>
                                <Button variant=ButtonVariant::Link size=ButtonSize::Sm on:click=my_posts>
                                    "My Posts"
                                </Button>
                                <Button variant=ButtonVariant::Destructive size=ButtonSize::Sm on:click=on_logout>
                                    "Logout"
                                </Button>
                            </CardFooter>
                        </Card>
                    }
                    .into_any(),
                }}
            </Show>
        </ContentLayout>
    }
}

#[component]
pub fn PostBlogPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());

    let title: RwSignal<String> = RwSignal::new(String::new());
    let content: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let title_val = title.get_untracked();
        let content_val = content.get_untracked();
        let client = app_state.0.client();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match actions::publish_post(&client, &title_val, &content_val).await {
                Ok(()) => {
                    log::info!("published \"{}\"", title_val.trim());
                    navigator.try_with_value(|n| n.go_to(routes::HOME));
                }
                Err(e) => {
                    error.try_set(Some(e.to_string()));
                }
            }
            loading.try_set(false);
        });
    };

    view! {
        <ContentLayout title="New Post" with_back=true>
            <Show
                when=move || app_state.0.is_signed_in()
                fallback=|| view! {
                    <div class="flex flex-col items-center gap-3">
                        {muted_note("You need to be logged in to write a post.".to_string())}
                        <a class="text-primary underline underline-offset-4" href=routes::LOGIN>"Log in"</a>
                    </div>
                }
            >
                <form class="flex flex-col gap-3" on:submit=on_submit>
                    <FormField id="title" label="Title" placeholder="Title" value=title />
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="content" class="text-xs">"Content"</Label>
                        <Textarea id="content" placeholder="Write your post here..." rows=14 bind_value=content />
                    </div>
                    <ErrorNotice error=error />
                    <SubmitButton loading=loading idle="Publish" busy="Publishing..." />
                </form>
            </Show>
        </ContentLayout>
    }
}

#[component]
pub fn PostDetailPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = StoredValue::new(use_navigator());
    let post_id = use_query_param("post_id");
    let post: RwSignal<PageState<Article>> = RwSignal::new(PageState::Loading);
    let requests = StoredValue::new(RequestCounter::default());

    Effect::new(move |_| {
        let Some(id) = post_id() else {
            return;
        };
        let Some(ticket) = requests.try_update_value(RequestCounter::begin) else {
            return;
        };
        post.set(PageState::Loading);
        let client = app_state.0.client();
        spawn_local(async move {
            let state = fetch_post(&client, &id).await;
            set_if_current(requests, ticket, post, state);
        });
    });

    view! {
        <ContentLayout with_back=true>
            {move || {
                if post_id().is_none() {
                    return error_alert("Invalid post ID".to_string()).into_any();
                }
                match post.get() {
                    PageState::Loading => view! { <LoadingLine label="Loading..." /> }.into_any(),
                    PageState::NotFound => error_alert("Post not found".to_string()).into_any(),
                    PageState::Error(e) => error_alert(format!("Error loading post: {e}")).into_any(),
                    PageState::Ready(article) => {
                        let author = article.username.clone();
                        let body = if article.content.is_empty() {
                            NO_BODY.to_string()
                        } else {
                            sanitize_markup(&article.content)
                        };
                        view! {
                            <article class="mx-auto w-full max-w-3xl">
                                <h1 class="text-3xl font-bold text-primary">{article.title}</h1>
                                <p class="text-sm text-muted-foreground">
                                    {format!("Posted on {}", display_date(&article.posted_at))}
                                </p>
                                <p class="text-sm text-muted-foreground">
                                    "By "
                                    <Button
                                        variant=ButtonVariant::Link
                                        size=ButtonSize::Inline
                                        on:click=move |_| navigator.with_value(|n| n.go_to_author(&author))
                                    >
                                        {article.username}
                                    </Button>
                                </p>
                                <div class="prose mt-4 max-w-none text-foreground/90" inner_html=body></div>
                            </article>
                        }
                        .into_any()
                    }
                }
            }}
        </ContentLayout>
    }
}

#[component]
pub fn AuthorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let username = use_query_param("username");
    let posts: RwSignal<PageState<Vec<Article>>> = RwSignal::new(PageState::Loading);
    let requests = StoredValue::new(RequestCounter::default());

    Effect::new(move |_| {
        let Some(name) = username() else {
            return;
        };
        let Some(ticket) = requests.try_update_value(RequestCounter::begin) else {
            return;
        };
        posts.set(PageState::Loading);
        let client = app_state.0.client();
        spawn_local(async move {
            let state = fetch_posts_by_author(&client, &name).await;
            set_if_current(requests, ticket, posts, state);
        });
    });

    view! {
        <ContentLayout with_back=true>
            {move || match username() {
                None => error_alert("Invalid username".to_string()).into_any(),
                Some(name) => view! {
                    <h2 class="text-3xl font-bold text-primary">{format!("Posts by {name}")}</h2>
                    {move || post_list_view(posts.get(), "No posts found".to_string(), "Error loading posts")}
                }
                .into_any(),
            }}
        </ContentLayout>
    }
}

#[component]
pub fn SearchPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let term = use_query_param("query");
    let results: RwSignal<PageState<Vec<Article>>> = RwSignal::new(PageState::Loading);
    let requests = StoredValue::new(RequestCounter::default());

    Effect::new(move |_| {
        let q = term().unwrap_or_default();
        let Some(ticket) = requests.try_update_value(RequestCounter::begin) else {
            return;
        };
        results.set(PageState::Loading);
        let client = app_state.0.client();
        spawn_local(async move {
            let state = search_posts(&client, &q).await;
            set_if_current(requests, ticket, results, state);
        });
    });

    view! {
        <ContentLayout title="Search Results" with_back=true>
            <SearchBar initial=term().unwrap_or_default() />
            {move || match term() {
                None => muted_note("Type a query and press Search.".to_string()).into_any(),
                Some(q) => view! {
                    <h2 class="text-xl font-semibold">{format!("Results for \"{q}\"")}</h2>
                    {move || post_list_view(
                        results.get(),
                        format!("No results found for \"{q}\"."),
                        "Error searching posts",
                    )}
                }
                .into_any(),
            }}
        </ContentLayout>
    }
}
