use strum::{AsRefStr, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Table {
    Articles,
    Profiles,
}

/// Row predicate understood by the hosted REST layer.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Filter {
    Eq(String, String),
    /// Case-insensitive substring match.
    Contains(String, String),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn contains(column: &str, term: impl Into<String>) -> Self {
        Filter::Contains(column.to_string(), term.into())
    }

    /// `column=op.value`, used at the top level of the query string.
    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(col, v) => (col.clone(), format!("eq.{v}")),
            Filter::Contains(col, v) => (col.clone(), format!("ilike.%{v}%")),
            Filter::Or(parts) => {
                let inner: Vec<String> = parts.iter().map(Filter::to_grouped).collect();
                ("or".to_string(), format!("({})", inner.join(",")))
            }
        }
    }

    /// `column.op.value`, used inside `or=(...)` groups.
    fn to_grouped(&self) -> String {
        match self {
            Filter::Eq(col, v) => format!("{col}.eq.{}", quote_reserved(v)),
            Filter::Contains(col, v) => {
                format!("{col}.ilike.{}", quote_reserved(&format!("%{v}%")))
            }
            Filter::Or(parts) => {
                let inner: Vec<String> = parts.iter().map(Filter::to_grouped).collect();
                format!("or({})", inner.join(","))
            }
        }
    }
}

/// Values inside a logic group must be double-quoted when they contain
/// characters the group syntax reserves.
fn quote_reserved(v: &str) -> String {
    if v.chars().any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\')) {
        let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        v.to_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A single-table read: predicate, optional ordering, optional row cap.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TableQuery {
    pub table: Table,
    pub columns: String,
    pub filter: Option<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
}

impl TableQuery {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            columns: "*".to_string(),
            filter: None,
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Query string pairs; values are raw and get URL-encoded by the HTTP layer.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut out = vec![("select".to_string(), self.columns.clone())];
        if let Some(f) = &self.filter {
            out.push(f.to_param());
        }
        if let Some(o) = &self.order {
            let dir = if o.ascending { "asc" } else { "desc" };
            out.push(("order".to_string(), format!("{}.{dir}", o.column)));
        }
        if let Some(n) = self.limit {
            out.push(("limit".to_string(), n.to_string()));
        }
        out
    }
}
