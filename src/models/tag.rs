use crate::query::{Column, Entity, EntitySchema, FieldKind};
use serde::{Deserialize, Serialize};

const TAG_COLUMNS: &[Column] = &[
    Column::new("id", "id", FieldKind::Integer),
    Column::new("name", "name", FieldKind::Text),
    Column::new("description", "description", FieldKind::Text),
    Column::new("createdBy", "created_by", FieldKind::Text),
    Column::new("createdAt", "created_at", FieldKind::Integer),
];

pub static TAG_SCHEMA: EntitySchema = EntitySchema {
    name: "Tag",
    table: "tags",
    acl_class: "Tag",
    id_column: "id",
    columns: TAG_COLUMNS,
};

/// Tag that can be attached to registry members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: i64,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            description: None,
            created_by: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl Entity for Tag {
    fn schema() -> &'static EntitySchema {
        &TAG_SCHEMA
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            created_by: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}
