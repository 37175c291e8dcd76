use serde::{Deserialize, Deserializer, Serialize};

/// Null and missing are both treated as an empty body.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids may be text or integer columns depending on the schema; both read as text.
fn id_text<E: serde::de::Error>(value: serde_json::Value) -> Result<String, E> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!("invalid id: {other}"))),
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_text(serde_json::Value::deserialize(deserializer)?)
}

/// Id list column. Null reads as empty; elements follow `id_text`.
fn null_as_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<serde_json::Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(id_text)
        .collect()
}

/// A row of the `articles` table.
///
/// Column names follow the hosted schema, which mixes conventions
/// (`articleid`, `PostTimeStamp`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Article {
    #[serde(rename = "articleid", deserialize_with = "id_as_string")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    /// Author username; denormalized, not enforced as a foreign key.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,

    /// Stored markup. Always a string once deserialized.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,

    #[serde(rename = "PostTimeStamp", default, deserialize_with = "null_as_empty")]
    pub posted_at: String,

    #[serde(rename = "commentidlist", default, deserialize_with = "null_as_id_list")]
    pub comment_ids: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ratings: i64,

    #[serde(rename = "ratingsidlist", default, deserialize_with = "null_as_id_list")]
    pub rater_ids: Vec<String>,
}

/// Insert payload for a new article. The id is assigned by the backend.
#[derive(Serialize, Clone, Debug)]
pub(crate) struct NewArticle {
    pub title: String,
    pub content: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "PostTimeStamp")]
    pub posted_at: String,
    #[serde(rename = "commentidlist")]
    pub comment_ids: Vec<String>,
    pub ratings: i64,
    #[serde(rename = "ratingsidlist")]
    pub rater_ids: Vec<String>,
}

/// A row of the `profiles` table. `email` is the natural key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Profile {
    pub email: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,

    /// Empty when the row has no photo; callers substitute the configured placeholder.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub profile_photo: String,

    #[serde(rename = "articleidlist", default, deserialize_with = "null_as_id_list")]
    pub article_ids: Vec<String>,

    #[serde(rename = "commentidlist", default, deserialize_with = "null_as_id_list")]
    pub comment_ids: Vec<String>,

    #[serde(rename = "ratingsidlist", default, deserialize_with = "null_as_id_list")]
    pub rating_ids: Vec<String>,
}

impl Profile {
    pub fn photo_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        if self.profile_photo.trim().is_empty() {
            placeholder
        } else {
            &self.profile_photo
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct NewProfile {
    pub email: String,
    pub username: String,
    pub profile_photo: String,
    #[serde(rename = "articleidlist")]
    pub article_ids: Vec<String>,
    #[serde(rename = "commentidlist")]
    pub comment_ids: Vec<String>,
    #[serde(rename = "ratingsidlist")]
    pub rating_ids: Vec<String>,
}

impl NewProfile {
    pub fn new(email: &str, username: &str, profile_photo: &str) -> Self {
        Self {
            email: email.to_string(),
            username: username.to_string(),
            profile_photo: profile_photo.to_string(),
            article_ids: vec![],
            comment_ids: vec![],
            rating_ids: vec![],
        }
    }
}

#[derive(Serialize, Clone, Debug, Default)]
pub(crate) struct ProfileUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

/// The user object embedded in auth responses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Auth session as returned by the password grant.
///
/// Serialized as-is into device storage on mobile builds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref().filter(|e| !e.trim().is_empty())
    }
}
