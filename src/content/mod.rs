use crate::api::{ApiResult, Backend, Filter, Table, TableQuery};
use crate::models::{Article, Profile};

pub(crate) const POSTED_AT_COLUMN: &str = "PostTimeStamp";

/// Per-page fetch state. Starts at `Loading`; every other state is terminal until the
/// page's key (post id, username, search term) changes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PageState<T> {
    Loading,
    Ready(T),
    /// The query succeeded but matched nothing.
    NotFound,
    Error(String),
}

impl<T> PageState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            PageState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Numbers the fetches a page issues into one state slot. Only the most recent
/// ticket may write its result.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RequestCounter {
    issued: u64,
}

impl RequestCounter {
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.issued
    }
}

fn list_state<T>(res: ApiResult<Vec<T>>, what: &str) -> PageState<Vec<T>> {
    match res {
        Ok(rows) => PageState::Ready(rows),
        Err(e) => {
            log::error!("Error fetching {what}: {e}");
            PageState::Error(e.to_string())
        }
    }
}

fn single_state<T>(res: ApiResult<Vec<T>>, what: &str) -> PageState<T> {
    match res {
        Ok(rows) => rows
            .into_iter()
            .next()
            .map_or(PageState::NotFound, PageState::Ready),
        Err(e) => {
            log::error!("Error fetching {what}: {e}");
            PageState::Error(e.to_string())
        }
    }
}

pub(crate) fn recent_posts_query() -> TableQuery {
    TableQuery::new(Table::Articles).order_by(POSTED_AT_COLUMN, false)
}

pub(crate) fn posts_by_author_query(username: &str) -> TableQuery {
    TableQuery::new(Table::Articles).filter(Filter::eq("username", username))
}

pub(crate) fn post_query(article_id: &str) -> TableQuery {
    TableQuery::new(Table::Articles)
        .filter(Filter::eq("articleid", article_id))
        .limit(1)
}

pub(crate) fn search_posts_query(term: &str) -> TableQuery {
    TableQuery::new(Table::Articles)
        .filter(Filter::Or(vec![
            Filter::contains("title", term),
            Filter::contains("content", term),
        ]))
        .order_by(POSTED_AT_COLUMN, false)
}

pub(crate) fn profile_query(email: &str) -> TableQuery {
    TableQuery::new(Table::Profiles)
        .filter(Filter::eq("email", email))
        .limit(1)
}

pub(crate) async fn fetch_recent_posts(backend: &impl Backend) -> PageState<Vec<Article>> {
    list_state(backend.select(&recent_posts_query()).await, "posts")
}

pub(crate) async fn fetch_posts_by_author(
    backend: &impl Backend,
    username: &str,
) -> PageState<Vec<Article>> {
    list_state(
        backend.select(&posts_by_author_query(username)).await,
        "author posts",
    )
}

pub(crate) async fn fetch_post(backend: &impl Backend, article_id: &str) -> PageState<Article> {
    single_state(backend.select(&post_query(article_id)).await, "post")
}

/// Title or body contains `term` (case-insensitive), newest first.
///
/// A blank term is an empty result; no query is issued.
pub(crate) async fn search_posts(backend: &impl Backend, term: &str) -> PageState<Vec<Article>> {
    let term = term.trim();
    if term.is_empty() {
        return PageState::Ready(vec![]);
    }
    list_state(
        backend.select(&search_posts_query(term)).await,
        "search results",
    )
}

pub(crate) async fn fetch_profile(backend: &impl Backend, email: &str) -> PageState<Profile> {
    single_state(backend.select(&profile_query(email)).await, "profile")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryBackend;
    use futures::executor::block_on;
    use serde_json::json;

    fn article(id: &str, title: &str, username: &str, content: Option<&str>, at: &str) -> serde_json::Value {
        json!({
            "articleid": id,
            "title": title,
            "username": username,
            "email": format!("{username}@example.com"),
            "content": content,
            "PostTimeStamp": at,
            "commentidlist": [],
            "ratings": 0,
            "ratingsidlist": []
        })
    }

    fn sample() -> MemoryBackend {
        MemoryBackend::with_rows(
            Table::Articles,
            vec![
                article("1", "Cats are great", "ann", Some("<p>Furry.</p>"), "2025-01-01T10:00:00Z"),
                article("2", "Dogs", "bob", Some("I love my cat"), "2025-02-01T10:00:00Z"),
                article("3", "Weather", "ann", None, "2025-03-01T10:00:00Z"),
            ],
        )
    }

    #[test]
    fn test_stale_request_loses_to_newer_one() {
        let mut counter = RequestCounter::default();
        let first = counter.begin();
        assert!(counter.is_current(first));

        let second = counter.begin();
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
    }

    #[test]
    fn test_search_matches_title_or_body_newest_first() {
        let backend = sample();
        let state = block_on(search_posts(&backend, "cat"));
        let ids: Vec<String> = state
            .ready()
            .expect("search should succeed")
            .iter()
            .map(|a| a.id.clone())
            .collect();
        assert_eq!(ids, vec!["2".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_search_blank_term_issues_no_query() {
        let backend = sample();
        let state = block_on(search_posts(&backend, "   "));
        assert_eq!(state, PageState::Ready(vec![]));
        assert!(backend.selects.borrow().is_empty());
    }

    #[test]
    fn test_posts_by_author() {
        let backend = sample();
        let state = block_on(fetch_posts_by_author(&backend, "ann"));
        let posts = state.ready().expect("should be ready");
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.username == "ann"));
    }

    #[test]
    fn test_null_body_is_empty_string() {
        let backend = sample();
        let state = block_on(fetch_post(&backend, "3"));
        match state {
            PageState::Ready(a) => assert_eq!(a.content, ""),
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_post_is_not_found_not_error() {
        let backend = sample();
        let state = block_on(fetch_post(&backend, "does-not-exist"));
        assert_eq!(state, PageState::NotFound);
    }

    #[test]
    fn test_query_failure_becomes_error_state() {
        let backend = MemoryBackend::failing("connection refused");
        let state = block_on(fetch_post(&backend, "1"));
        assert_eq!(state, PageState::Error("connection refused".to_string()));

        let state = block_on(fetch_recent_posts(&backend));
        assert!(matches!(state, PageState::Error(ref e) if e == "connection refused"));
    }

    #[test]
    fn test_recent_posts_newest_first() {
        let backend = sample();
        let state = block_on(fetch_recent_posts(&backend));
        let first = state.ready().and_then(|p| p.first()).map(|a| a.id.clone());
        assert_eq!(first.as_deref(), Some("3"));
    }

    #[test]
    fn test_profile_lookup() {
        let backend = MemoryBackend::with_rows(
            Table::Profiles,
            vec![json!({ "email": "ann@example.com", "username": "ann", "profile_photo": null })],
        );
        let state = block_on(fetch_profile(&backend, "ann@example.com"));
        assert_eq!(state.ready().map(|p| p.username.as_str()), Some("ann"));

        let state = block_on(fetch_profile(&backend, "nobody@example.com"));
        assert_eq!(state, PageState::NotFound);
    }
}
