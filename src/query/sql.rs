//! Render predicates to parameterised SQL

use crate::error::RegisterError;
use crate::query::predicate::Predicate;
use crate::query::schema::EntitySchema;
use rusqlite::types::Value;

/// SQL text with `?` placeholders and the values bound to them, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self { sql: sql.into(), params }
    }

    /// `self AND other`, each side parenthesised
    pub fn and(self, other: SqlFragment) -> SqlFragment {
        let mut params = self.params;
        params.extend(other.params);
        SqlFragment {
            sql: format!("({}) AND ({})", self.sql, other.sql),
            params,
        }
    }
}

/// Render `predicate` as a WHERE condition over the table aliased `alias`.
///
/// `Predicate::All` renders as `1 = 1`. Unknown fields and operands that do
/// not fit the column type are errors.
pub fn render_predicate(
    predicate: &Predicate,
    schema: &EntitySchema,
    alias: &str,
) -> Result<SqlFragment, RegisterError> {
    let mut params = Vec::new();
    let sql = render_into(predicate, schema, alias, &mut params)?;
    Ok(SqlFragment { sql, params })
}

fn render_into(
    predicate: &Predicate,
    schema: &EntitySchema,
    alias: &str,
    params: &mut Vec<Value>,
) -> Result<String, RegisterError> {
    let qualified = |field: &str| -> Result<String, RegisterError> {
        Ok(format!("{}.{}", alias, schema.column(field)?.column))
    };

    let sql = match predicate {
        Predicate::All => "1 = 1".to_string(),
        Predicate::IsNull { field } => format!("{} IS NULL", qualified(field)?),
        Predicate::IsNotNull { field } => format!("{} IS NOT NULL", qualified(field)?),
        Predicate::Equals { field, value } => comparison(schema, alias, field, "=", value, params)?,
        Predicate::NotEquals { field, value } => comparison(schema, alias, field, "<>", value, params)?,
        Predicate::GreaterThan { field, value } => comparison(schema, alias, field, ">", value, params)?,
        Predicate::LessThan { field, value } => comparison(schema, alias, field, "<", value, params)?,
        Predicate::Like { field, pattern } => {
            let column = qualified(field)?;
            params.push(Value::Text(pattern.clone()));
            format!("{} LIKE ?", column)
        }
        Predicate::And { predicates } => join(predicates, " AND ", schema, alias, params)?,
        Predicate::Or { predicates } => join(predicates, " OR ", schema, alias, params)?,
    };

    Ok(sql)
}

fn comparison(
    schema: &EntitySchema,
    alias: &str,
    field: &str,
    op: &str,
    value: &str,
    params: &mut Vec<Value>,
) -> Result<String, RegisterError> {
    let column = schema.column(field)?;
    params.push(column.bind(value)?);
    Ok(format!("{}.{} {} ?", alias, column.column, op))
}

fn join(
    predicates: &[Predicate],
    separator: &str,
    schema: &EntitySchema,
    alias: &str,
    params: &mut Vec<Value>,
) -> Result<String, RegisterError> {
    if predicates.is_empty() {
        return Ok("1 = 1".to_string());
    }
    let parts = predicates
        .iter()
        .map(|p| render_into(p, schema, alias, params).map(|sql| format!("({})", sql)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(separator))
}
