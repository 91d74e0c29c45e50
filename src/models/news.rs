use crate::query::{Column, Entity, EntitySchema, FieldKind};
use serde::{Deserialize, Serialize};

const NEWS_COLUMNS: &[Column] = &[
    Column::new("id", "id", FieldKind::Integer),
    Column::new("visibleFrom", "visible_from", FieldKind::Date),
    Column::new("visibleTo", "visible_to", FieldKind::Date),
    Column::new("subject", "subject", FieldKind::Text),
    Column::new("text", "text", FieldKind::Text),
    Column::new("published", "published", FieldKind::Boolean),
    Column::new("createdBy", "created_by", FieldKind::Text),
    Column::new("createdAt", "created_at", FieldKind::Integer),
];

pub static NEWS_SCHEMA: EntitySchema = EntitySchema {
    name: "News",
    table: "news",
    acl_class: "News",
    id_column: "id",
    columns: NEWS_COLUMNS,
};

/// News item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    pub id: Option<i64>,
    pub visible_from: Option<String>, // ISO date
    pub visible_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub published: bool,
    pub created_by: Option<String>,
    pub created_at: i64,
}

impl News {
    /// Create a new unpublished news item
    pub fn new(subject: String, text: String) -> Self {
        Self {
            id: None,
            visible_from: None,
            visible_to: None,
            subject,
            text,
            published: false,
            created_by: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl Entity for News {
    fn schema() -> &'static EntitySchema {
        &NEWS_SCHEMA
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(News {
            id: Some(row.get(0)?),
            visible_from: row.get(1)?,
            visible_to: row.get(2)?,
            subject: row.get(3)?,
            text: row.get(4)?,
            published: row.get::<_, i64>(5)? != 0,
            created_by: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn id(&self) -> Option<i64> {
        self.id
    }
}
