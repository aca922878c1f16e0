//! Primary table expressions: `trader`, `trader t`, `public.trader t`.

use super::Ident;
use crate::error::MapError;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::SelectStatement;

// Each name is either double-quoted (spaces and dots allowed) or a bare word.
static TABLE_EXPR: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(?:(?P<schema>"[^"]+"|[^\s."]+)\.)?(?P<table>"[^"]+"|[^\s."]+)(?:\s+(?P<alias>"[^"]+"|[^\s."]+))?\s*$"#,
    )
});

/// A parsed table expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExpr {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

fn unquote(part: &str) -> &str {
    part.trim_matches('"')
}

impl TableExpr {
    /// Parse `[schema.]table [alias]`, tolerating double quotes around each name.
    pub fn parse(expr: &str) -> Result<Self, MapError> {
        let regex = TABLE_EXPR
            .as_ref()
            .map_err(|e| MapError::QueryBuild(format!("table expression pattern: {e}")))?;
        let captures = regex
            .captures(expr)
            .ok_or_else(|| MapError::QueryBuild(format!("invalid table expression '{expr}'")))?;

        let name = |group: &str| captures.name(group).map(|m| unquote(m.as_str()));
        let table = name("table").unwrap_or_default();
        if table.is_empty() {
            return Err(MapError::QueryBuild(format!(
                "invalid table expression '{expr}'"
            )));
        }
        let schema = name("schema");
        let alias = name("alias");

        Ok(Self {
            schema: schema.map(str::to_string),
            table: table.to_string(),
            alias: alias.map(str::to_string),
        })
    }

    /// The name other clauses use to qualify columns: the alias if any.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Add this table as the `FROM` of `stmt`.
    pub fn apply_from(&self, stmt: &mut SelectStatement) {
        let table = Ident::new(&self.table);
        match (&self.schema, &self.alias) {
            (Some(schema), Some(alias)) => {
                stmt.from_as((Ident::new(schema), table), Ident::new(alias));
            }
            (Some(schema), None) => {
                stmt.from((Ident::new(schema), table));
            }
            (None, Some(alias)) => {
                stmt.from_as(table, Ident::new(alias));
            }
            (None, None) => {
                stmt.from(table);
            }
        }
    }
}
