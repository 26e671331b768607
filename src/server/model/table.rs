use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// A point in floor-plan pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// One table record as the gateway stores it.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Table {
    pub id: i64,
    pub restaurant_id: i64,
    pub position: Position,
    pub capacity: i16,
    pub is_available: bool,
    pub created_by: i64,
}

impl Table {
    /// Typed ingress from a gateway row; a malformed row is an error, never
    /// a silently coerced record.
    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            restaurant_id: row.try_get("restaurant_id")?,
            position: Position {
                x: row.try_get("pos_x")?,
                y: row.try_get("pos_y")?,
            },
            capacity: row.try_get("capacity")?,
            is_available: row.try_get("is_available")?,
            created_by: row.try_get("created_by")?,
        })
    }
}

/// One (capacity, count) unit of a bulk create form.
#[derive(Debug, Deserialize)]
pub(crate) struct TableSpec {
    pub capacity: i16,
    pub count: i16,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetTablesResponse {
    pub tables: Vec<Table>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTablesRequest {
    pub created_by: i64,
    pub specs: Vec<TableSpec>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTablesResponse {
    pub created: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchPositionRequest {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchAvailabilityRequest {
    pub is_available: bool,
}
