//! Translates [`FilterExpr`] into a parameterized SQL fragment.
//!
//! Only four columns are ever referenced (`relative_path`, `file_extension`,
//! `start_line`, `end_line`), so there is no injection surface: field names
//! come from the enum, not from caller-supplied strings. Values are always
//! bound as parameters, never interpolated into the SQL text.

use crate::domain::types::{FilterExpr, FilterField};
use rusqlite::types::Value;

/// A SQL `WHERE` fragment (without the leading `WHERE`) plus its bound
/// parameters, in the order the `?` placeholders appear.
pub struct CompiledFilter {
    /// The SQL boolean expression, e.g. `(file_extension = ?)`
    pub sql: String,
    /// Parameters bound to the `?` placeholders in [`Self::sql`], in order
    pub params: Vec<Value>,
}

fn column(field: FilterField) -> &'static str {
    match field {
        FilterField::RelativePath => "relative_path",
        FilterField::FileExtension => "file_extension",
        FilterField::StartLine => "start_line",
        FilterField::EndLine => "end_line",
    }
}

/// Compile a [`FilterExpr`] into SQL + bound parameters.
pub fn compile(expr: &FilterExpr) -> CompiledFilter {
    let mut params = Vec::new();
    let sql = compile_into(expr, &mut params);
    CompiledFilter { sql, params }
}

fn compile_into(expr: &FilterExpr, params: &mut Vec<Value>) -> String {
    match expr {
        FilterExpr::Eq(field, value) => {
            params.push(Value::Text(value.clone()));
            format!("({} = ?)", column(*field))
        }
        FilterExpr::In(field, values) => {
            if values.is_empty() {
                return "(0)".to_string();
            }
            let placeholders = values
                .iter()
                .map(|v| {
                    params.push(Value::Text(v.clone()));
                    "?"
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({} IN ({}))", column(*field), placeholders)
        }
        FilterExpr::And(lhs, rhs) => {
            let left = compile_into(lhs, params);
            let right = compile_into(rhs, params);
            format!("({left} AND {right})")
        }
        FilterExpr::Or(lhs, rhs) => {
            let left = compile_into(lhs, params);
            let right = compile_into(rhs, params);
            format!("({left} OR {right})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_eq() {
        let expr = FilterExpr::Eq(FilterField::FileExtension, ".rs".to_string());
        let compiled = compile(&expr);
        assert_eq!(compiled.sql, "(file_extension = ?)");
        assert_eq!(compiled.params.len(), 1);
    }

    #[test]
    fn compiles_in_and_or() {
        let expr = FilterExpr::And(
            Box::new(FilterExpr::In(
                FilterField::FileExtension,
                vec![".rs".to_string(), ".ts".to_string()],
            )),
            Box::new(FilterExpr::Or(
                Box::new(FilterExpr::Eq(FilterField::RelativePath, "a.rs".to_string())),
                Box::new(FilterExpr::Eq(FilterField::RelativePath, "b.rs".to_string())),
            )),
        );
        let compiled = compile(&expr);
        assert_eq!(compiled.params.len(), 4);
        assert!(compiled.sql.contains("IN (?, ?)"));
    }

    #[test]
    fn empty_in_is_always_false() {
        let expr = FilterExpr::In(FilterField::FileExtension, vec![]);
        let compiled = compile(&expr);
        assert_eq!(compiled.sql, "(0)");
    }
}
