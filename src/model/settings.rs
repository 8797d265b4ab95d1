use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::utils::clock::is_valid_hhmm;

pub const DEFAULT_LATENESS_TIME: &str = "09:00";
pub const DEFAULT_WORK_END_TIME: &str = "17:00";

/// Singleton attendance thresholds, both local `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    /// Check-ins strictly after this time are late.
    #[schema(example = "09:00")]
    pub lateness_time: String,
    /// Check-outs strictly before this time are early.
    #[schema(example = "17:00")]
    pub work_end_time: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            lateness_time: DEFAULT_LATENESS_TIME.to_string(),
            work_end_time: DEFAULT_WORK_END_TIME.to_string(),
        }
    }
}

impl AdminSettings {
    pub fn validate(&self) -> AppResult<()> {
        if !is_valid_hhmm(&self.lateness_time) {
            return Err(AppError::validation("latenessTime must be HH:MM"));
        }
        if !is_valid_hhmm(&self.work_end_time) {
            return Err(AppError::validation("workEndTime must be HH:MM"));
        }
        Ok(())
    }

    async fn fetch(pool: &MySqlPool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminSettings>(
            "SELECT lateness_time, work_end_time FROM settings WHERE id = 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Reads the singleton, persisting the defaults the first time it is
    /// missing. `INSERT IGNORE` on the fixed primary key keeps concurrent
    /// first reads from creating two rows.
    pub async fn load_or_init(pool: &MySqlPool) -> Result<Self, sqlx::Error> {
        if let Some(settings) = Self::fetch(pool).await? {
            return Ok(settings);
        }

        let defaults = Self::default();
        let created = sqlx::query(
            "INSERT IGNORE INTO settings (id, lateness_time, work_end_time) VALUES (1, ?, ?)",
        )
        .bind(&defaults.lateness_time)
        .bind(&defaults.work_end_time)
        .execute(pool)
        .await?;

        if created.rows_affected() > 0 {
            tracing::info!("Created default attendance settings");
            return Ok(defaults);
        }

        // Lost the race to another first read; use what it wrote.
        Ok(Self::fetch(pool).await?.unwrap_or(defaults))
    }

    pub async fn save(&self, pool: &MySqlPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, lateness_time, work_end_time)
            VALUES (1, ?, ?)
            ON DUPLICATE KEY UPDATE
                lateness_time = VALUES(lateness_time),
                work_end_time = VALUES(work_end_time)
            "#,
        )
        .bind(&self.lateness_time)
        .bind(&self.work_end_time)
        .execute(pool)
        .await?;
        Ok(())
    }
}
