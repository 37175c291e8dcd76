use icons::LoaderCircle;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <LoaderCircle class=merged_class attr:role="status" attr:aria-label="Loading" /> }
}

/// Inline spinner with a caption, used while a page's fetch is in flight.
#[component]
pub fn LoadingLine(#[prop(into)] label: String) -> impl IntoView {
    view! {
        <div class="flex items-center gap-2 text-sm text-muted-foreground">
            <Spinner />
            {label}
        </div>
    }
}
