use crate::error::RegisterError;
use rusqlite::types::Value;
use rusqlite::Row;

/// Storage type of a field, used to bind filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    /// ISO-8601 date stored as text
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
        }
    }
}

/// Mapping of one public field key to its column
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub field: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl Column {
    pub const fn new(field: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { field, column, kind }
    }

    /// Convert a filter operand to a bound value of this column's kind
    pub fn bind(&self, raw: &str) -> Result<Value, RegisterError> {
        let invalid = || RegisterError::InvalidValue {
            field: self.field.to_string(),
            value: raw.to_string(),
            expected: self.kind.as_str(),
        };

        match self.kind {
            FieldKind::Text | FieldKind::Date => Ok(Value::Text(raw.to_string())),
            FieldKind::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|_| invalid()),
            FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Integer(1)),
                "false" | "0" => Ok(Value::Integer(0)),
                _ => Err(invalid()),
            },
        }
    }
}

/// Static description of a securable entity's table
///
/// `columns` lists every selectable column in the order `Entity::from_row`
/// reads them. `acl_class` is the class name under which grants for this
/// entity are registered.
#[derive(Debug)]
pub struct EntitySchema {
    pub name: &'static str,
    pub table: &'static str,
    pub acl_class: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [Column],
}

impl EntitySchema {
    /// Resolve a field key to its column
    pub fn column(&self, field: &str) -> Result<&Column, RegisterError> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .ok_or_else(|| RegisterError::UnknownField {
                entity: self.name.to_string(),
                field: field.to_string(),
            })
    }

    /// Comma-separated select list qualified by `alias`
    pub fn select_list(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", alias, c.column))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A row type stored in a table described by an [`EntitySchema`]
pub trait Entity: Sized {
    fn schema() -> &'static EntitySchema;

    /// Build the entity from a row selected with [`EntitySchema::select_list`]
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Identifier used as the ACL object identity
    fn id(&self) -> Option<i64>;
}
