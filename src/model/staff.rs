use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

const STAFF_COLUMNS: &str = "staff_id, name, department, position, qr_code, created_at";

/// A registered staff member. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "staffId": "K7Q2M9XA",
    "name": "Ada Obi",
    "department": "Engineering",
    "position": "Backend Engineer",
    "qrCode": "<svg ...>",
    "createdAt": "2025-05-27T08:00:00Z"
}))]
pub struct Staff {
    pub staff_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    /// SVG markup of a QR code encoding `staff_id`.
    pub qr_code: String,
    #[schema(example = "2025-05-27T08:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl Staff {
    pub async fn find(pool: &MySqlPool, staff_id: &str) -> Result<Option<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?"
        ))
        .bind(staff_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &MySqlPool) -> Result<Vec<Staff>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(&format!(
            "SELECT {STAFF_COLUMNS} FROM staff ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn exists(pool: &MySqlPool, staff_id: &str) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staff WHERE staff_id = ?")
            .bind(staff_id)
            .fetch_one(pool)
            .await?;
        Ok(count > 0)
    }

    /// Fails with a duplicate-key error if `staff_id` is already taken.
    pub async fn insert(&self, pool: &MySqlPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO staff (staff_id, name, department, position, qr_code, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.staff_id)
        .bind(&self.name)
        .bind(&self.department)
        .bind(&self.position)
        .bind(&self.qr_code)
        .bind(self.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
