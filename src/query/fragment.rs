//! Immutable SQL fragments and CTE chaining.
//!
//! A [`Fragment`] pairs SQL text holding `$n` placeholders, numbered from 1
//! within the fragment, with the values those placeholders bind. Combinators
//! never mutate their inputs: they return a new fragment whose later parts
//! are renumbered to follow the earlier ones.
//!
//! ```rust
//! use rowmap::query::{chain, with_ctes, Cte, Fragment};
//! use sea_query::Value;
//!
//! let active = Fragment::new(
//!     "SELECT id FROM trader WHERE status = $1",
//!     vec![Value::String(Some("active".into()))],
//! );
//! let terminal = Fragment::new(
//!     "SELECT * FROM \"active\" WHERE id > $1",
//!     vec![Value::BigInt(Some(10))],
//! );
//! let query = with_ctes(&[Cte::new("active", &active)?], &terminal)?;
//! assert_eq!(
//!     query.sql(),
//!     "WITH \"active\" AS (SELECT id FROM trader WHERE status = $1) SELECT * FROM \"active\" WHERE id > $2"
//! );
//! assert_eq!(query.values().len(), 2);
//! # Ok::<(), rowmap::MapError>(())
//! ```

use crate::error::MapError;
use sea_query::{
    DeleteStatement, InsertStatement, PostgresQueryBuilder, SelectStatement, UpdateStatement,
    Value, Values,
};

/// SQL text plus the values of its `$n` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    sql: String,
    values: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// A fragment without placeholders.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Values) {
        (self.sql, Values(self.values))
    }

    /// `self` followed directly by `other`.
    pub fn append(&self, other: &Fragment) -> Fragment {
        let mut sql = String::with_capacity(self.sql.len() + other.sql.len());
        sql.push_str(&self.sql);
        sql.push_str(&renumber(&other.sql, self.values.len()));

        let mut values = self.values.clone();
        values.extend(other.values.iter().cloned());
        Fragment { sql, values }
    }

    /// `prefix`, then `self`, then `suffix`. The wrapping text must not bind values.
    pub fn wrap(&self, prefix: &str, suffix: &str) -> Fragment {
        Fragment {
            sql: format!("{prefix}{}{suffix}", self.sql),
            values: self.values.clone(),
        }
    }

    /// Concatenate `parts` with `separator` between them.
    pub fn join(parts: &[Fragment], separator: &str) -> Fragment {
        let sep = Fragment::raw(separator);
        parts
            .iter()
            .enumerate()
            .fold(Fragment::default(), |acc, (i, part)| {
                if i == 0 {
                    acc.append(part)
                } else {
                    acc.append(&sep).append(part)
                }
            })
    }
}

/// Shift every `$n` placeholder of `sql` by `offset`, leaving quoted string
/// literals and quoted identifiers untouched.
fn renumber(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                // '' and "" escapes close and reopen, which reads the same.
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            '$' if chars.peek().is_some_and(char::is_ascii_digit) => {
                let mut digits = String::new();
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                match digits.parse::<usize>() {
                    Ok(n) => {
                        out.push('$');
                        out.push_str(&(n + offset).to_string());
                    }
                    Err(_) => {
                        out.push('$');
                        out.push_str(&digits);
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Quote an identifier for Postgres.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Anything that renders to a [`Fragment`].
pub trait Sqlizer {
    /// # Errors
    ///
    /// `MapError::QueryBuild` when the SQL cannot be produced.
    fn to_fragment(&self) -> Result<Fragment, MapError>;
}

impl Sqlizer for Fragment {
    fn to_fragment(&self) -> Result<Fragment, MapError> {
        Ok(self.clone())
    }
}

macro_rules! impl_sqlizer_for_statement {
    ($($stmt:ty),+ $(,)?) => {
        $(
            impl Sqlizer for $stmt {
                fn to_fragment(&self) -> Result<Fragment, MapError> {
                    let (sql, values) = self.build(PostgresQueryBuilder);
                    Ok(Fragment::new(sql, values.0))
                }
            }
        )+
    };
}

// Writes render with `RETURNING` when asked, so their rows scan like a select's.
impl_sqlizer_for_statement!(SelectStatement, InsertStatement, UpdateStatement, DeleteStatement);

impl<S: Sqlizer + ?Sized> Sqlizer for &S {
    fn to_fragment(&self) -> Result<Fragment, MapError> {
        (**self).to_fragment()
    }
}

/// A named query referenced by later parts of the same statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    alias: String,
    body: Fragment,
}

impl Cte {
    pub fn new(alias: impl Into<String>, query: &impl Sqlizer) -> Result<Self, MapError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(MapError::QueryBuild("CTE alias must not be empty".to_string()));
        }
        Ok(Self {
            alias,
            body: query.to_fragment()?,
        })
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn body(&self) -> &Fragment {
        &self.body
    }

    fn definition(&self) -> Fragment {
        self.body
            .wrap(&format!("{} AS (", quote_ident(&self.alias)), ")")
    }
}

/// `WITH "a" AS (...), "b" AS (...)`; empty for no CTEs.
pub fn chain(ctes: &[Cte]) -> Fragment {
    if ctes.is_empty() {
        return Fragment::default();
    }
    let definitions: Vec<Fragment> = ctes.iter().map(Cte::definition).collect();
    Fragment::join(&definitions, ", ").wrap("WITH ", "")
}

/// The CTE chain followed by `terminal`.
pub fn with_ctes(ctes: &[Cte], terminal: &impl Sqlizer) -> Result<Fragment, MapError> {
    let terminal = terminal.to_fragment()?;
    if ctes.is_empty() {
        return Ok(terminal);
    }
    Ok(chain(ctes).append(&terminal.wrap(" ", "")))
}

/// `WITH "alias" AS (query)` for a single query.
pub fn to_cte(alias: impl Into<String>, query: &impl Sqlizer) -> Result<Fragment, MapError> {
    Ok(chain(&[Cte::new(alias, query)?]))
}
