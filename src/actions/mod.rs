use crate::api::{ApiError, ApiErrorKind, Backend, Filter, Table, TableQuery, PROFILE_PHOTO_BUCKET};
use crate::models::{NewArticle, NewProfile, ProfileUpdate, Session};
use crate::util::{file_extension, now_rfc3339};
use serde::Deserialize;
use thiserror::Error;

/// A failed form submission. `Display` is the message shown next to the form.
#[derive(Clone, Debug, PartialEq, Error)]
pub(crate) enum FormError {
    #[error("{0} is required.")]
    Required(&'static str),
    #[error("Username is already taken. Please choose a different one.")]
    UsernameTaken,
    #[error("Email is already in use. Please choose a different one.")]
    EmailTaken,
    #[error("Invalid email or password.")]
    InvalidCredentials,
    #[error("You need to be logged in to do that.")]
    NotSignedIn,
    #[error("No profile found for {0}.")]
    MissingProfile(String),
    #[error("{0}")]
    Service(String),
}

impl From<ApiError> for FormError {
    fn from(e: ApiError) -> Self {
        FormError::Service(e.message)
    }
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FormError> {
    let v = value.trim();
    if v.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(v)
    }
}

fn require_password<'a>(value: &'a str, field: &'static str) -> Result<&'a str, FormError> {
    if value.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(value)
    }
}

#[derive(Deserialize)]
struct UsernameRow {
    username: String,
}

async fn profile_exists(backend: &impl Backend, column: &str, value: &str) -> Result<bool, FormError> {
    let query = TableQuery::new(Table::Profiles)
        .select(column)
        .filter(Filter::eq(column, value))
        .limit(1);
    Ok(!backend.select_rows(&query).await?.is_empty())
}

async fn username_for(backend: &impl Backend, email: &str) -> Result<String, FormError> {
    let query = TableQuery::new(Table::Profiles)
        .select("username")
        .filter(Filter::eq("email", email))
        .limit(1);
    backend
        .select::<UsernameRow>(&query)
        .await?
        .into_iter()
        .next()
        .map(|r| r.username)
        .ok_or_else(|| FormError::MissingProfile(email.to_string()))
}

/// Create the auth account and its profile row.
///
/// Username and email must both be unused by existing profiles.
pub(crate) async fn sign_up(
    backend: &impl Backend,
    email: &str,
    username: &str,
    password: &str,
    default_photo: &str,
) -> Result<(), FormError> {
    let email = require(email, "Email")?;
    let username = require(username, "Username")?;
    let password = require_password(password, "Password")?;

    if profile_exists(backend, "username", username).await? {
        return Err(FormError::UsernameTaken);
    }
    if profile_exists(backend, "email", email).await? {
        return Err(FormError::EmailTaken);
    }

    backend.sign_up(email, password).await?;
    backend
        .insert(
            Table::Profiles,
            &[NewProfile::new(email, username, default_photo)],
        )
        .await?;

    log::info!("signed up {email} as {username}");
    Ok(())
}

pub(crate) async fn sign_in(
    backend: &impl Backend,
    email: &str,
    password: &str,
) -> Result<Session, FormError> {
    let email = require(email, "Email")?;
    let password = require_password(password, "Password")?;

    backend.sign_in(email, password).await.map_err(|e| {
        log::warn!("sign in failed for {email}: {e}");
        match e.kind {
            ApiErrorKind::Network => FormError::Service(e.message),
            _ => FormError::InvalidCredentials,
        }
    })
}

/// Insert an article authored by the signed-in user.
pub(crate) async fn publish_post(
    backend: &impl Backend,
    title: &str,
    content: &str,
) -> Result<(), FormError> {
    let title = require(title, "Title")?;
    if content.trim().is_empty() {
        return Err(FormError::Required("Content"));
    }

    let email = backend
        .session()
        .and_then(|s| s.email())
        .map(|e| e.to_string())
        .ok_or(FormError::NotSignedIn)?;
    let username = username_for(backend, &email).await?;

    let article = NewArticle {
        title: title.to_string(),
        content: content.to_string(),
        email,
        username,
        posted_at: now_rfc3339(),
        comment_ids: vec![],
        ratings: 0,
        rater_ids: vec![],
    };
    backend.insert(Table::Articles, &[article]).await?;
    Ok(())
}

/// A picked profile photo, already read into memory.
#[derive(Clone, Debug)]
pub(crate) struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub(crate) fn photo_path(username: &str, file_name: &str) -> String {
    format!(
        "profile_photos/profile_{}.{}",
        username,
        file_extension(file_name)
    )
}

/// Rename the profile and optionally replace its photo.
///
/// Returns the new public photo URL when one was uploaded.
pub(crate) async fn update_profile(
    backend: &impl Backend,
    email: &str,
    username: &str,
    photo: Option<PhotoUpload>,
) -> Result<Option<String>, FormError> {
    let username = require(username, "Username")?;
    let mut update = ProfileUpdate {
        username: username.to_string(),
        profile_photo: None,
    };

    if let Some(photo) = photo {
        let path = photo_path(username, &photo.file_name);
        backend
            .upload(
                PROFILE_PHOTO_BUCKET,
                &path,
                photo.bytes,
                &photo.content_type,
                true,
            )
            .await
            .map_err(|e| FormError::Service(format!("Error uploading image: {e}")))?;
        update.profile_photo = Some(backend.public_url(PROFILE_PHOTO_BUCKET, &path));
    }

    backend
        .update(Table::Profiles, &Filter::eq("email", email), &update)
        .await
        .map_err(|e| FormError::Service(format!("Error updating profile: {e}")))?;

    Ok(update.profile_photo)
}

/// Re-authenticate with the old password, then set the new one.
///
/// The backend is left signed in with the fresh session, which is returned.
pub(crate) async fn change_password(
    backend: &mut impl Backend,
    email: &str,
    old_password: &str,
    new_password: &str,
) -> Result<Session, FormError> {
    let email = require(email, "Email")?;
    let old_password = require_password(old_password, "Old password")?;
    let new_password = require_password(new_password, "New password")?;

    let session = backend.sign_in(email, old_password).await?;
    backend.set_session(Some(session.clone()));
    backend.update_password(new_password).await?;
    Ok(session)
}

/// Best-effort backend sign-out. Local state is cleared by the caller regardless.
pub(crate) async fn sign_out(backend: &impl Backend) {
    if let Err(e) = backend.sign_out().await {
        log::error!("Logout failed: {e}");
    }
}
