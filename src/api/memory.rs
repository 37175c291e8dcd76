//! In-memory `Backend` used by unit tests.

use super::query::{Filter, Table, TableQuery};
use super::{public_url, ApiError, ApiErrorKind, ApiResult, Backend};
use crate::models::{AuthUser, Session};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub tables: RefCell<HashMap<String, Vec<Value>>>,
    pub users: RefCell<HashMap<String, String>>,
    pub uploads: RefCell<Vec<(String, String, usize)>>,
    pub selects: RefCell<Vec<TableQuery>>,
    pub signed_out: RefCell<u32>,
    pub password_updates: RefCell<Vec<String>>,
    pub fail_with: Option<ApiError>,
    pub session: Option<Session>,
}

impl MemoryBackend {
    pub fn with_rows(table: Table, rows: Vec<Value>) -> Self {
        let b = Self::default();
        b.tables.borrow_mut().insert(table.to_string(), rows);
        b
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(ApiError {
                kind: ApiErrorKind::Network,
                message: message.to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.users
            .borrow_mut()
            .insert(email.to_string(), password.to_string());
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .borrow()
            .get(table.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> ApiResult<()> {
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn text(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(v) => v.to_string(),
    }
}

fn matches(filter: &Filter, row: &Value) -> bool {
    match filter {
        Filter::Eq(col, v) => text(row, col) == *v,
        Filter::Contains(col, v) => text(row, col).to_lowercase().contains(&v.to_lowercase()),
        Filter::Or(parts) => parts.iter().any(|f| matches(f, row)),
    }
}

pub(crate) fn session_for(email: &str) -> Session {
    Session {
        access_token: format!("token-{email}"),
        refresh_token: None,
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        expires_at: None,
        user: AuthUser {
            id: format!("id-{email}"),
            email: Some(email.to_string()),
        },
    }
}

impl Backend for MemoryBackend {
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    async fn select_rows(&self, query: &TableQuery) -> ApiResult<Vec<Value>> {
        self.check()?;
        self.selects.borrow_mut().push(query.clone());

        let mut rows: Vec<Value> = self
            .rows(query.table)
            .into_iter()
            .filter(|r| query.filter.as_ref().map_or(true, |f| matches(f, r)))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let (a, b) = (text(a, &order.column), text(b, &order.column));
                if order.ascending {
                    a.cmp(&b)
                } else {
                    b.cmp(&a)
                }
            });
        }
        if let Some(n) = query.limit {
            rows.truncate(n as usize);
        }
        Ok(rows)
    }

    async fn insert_rows(&self, table: Table, rows: Value) -> ApiResult<()> {
        self.check()?;
        let rows = rows.as_array().cloned().unwrap_or_default();
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        Ok(())
    }

    async fn update_rows(&self, table: Table, filter: &Filter, patch: Value) -> ApiResult<()> {
        self.check()?;
        let mut tables = self.tables.borrow_mut();
        let rows = tables.entry(table.to_string()).or_default();
        for row in rows.iter_mut().filter(|r| matches(filter, r)) {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        self.check()?;
        match self.users.borrow().get(email) {
            Some(p) if p == password => Ok(session_for(email)),
            _ => Err(ApiError::http(
                400,
                r#"{"error_description":"Invalid login credentials"}"#,
                "Sign in failed",
            )),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> ApiResult<()> {
        self.check()?;
        self.add_user(email, password);
        Ok(())
    }

    async fn sign_out(&self) -> ApiResult<()> {
        self.check()?;
        *self.signed_out.borrow_mut() += 1;
        Ok(())
    }

    async fn current_user(&self) -> ApiResult<Option<AuthUser>> {
        self.check()?;
        Ok(self.session.as_ref().map(|s| s.user.clone()))
    }

    async fn update_password(&self, new_password: &str) -> ApiResult<()> {
        self.check()?;
        let Some(email) = self.session.as_ref().and_then(|s| s.user.email.clone()) else {
            return Err(ApiError {
                kind: ApiErrorKind::Unauthorized,
                message: "Unauthorized".to_string(),
            });
        };
        self.add_user(&email, new_password);
        self.password_updates
            .borrow_mut()
            .push(new_password.to_string());
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _upsert: bool,
    ) -> ApiResult<()> {
        self.check()?;
        self.uploads
            .borrow_mut()
            .push((bucket.to_string(), path.to_string(), bytes.len()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_url("https://mem.test", bucket, path)
    }
}
