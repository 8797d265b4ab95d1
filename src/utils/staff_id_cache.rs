use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// Staff ids known to be taken. Only taken ids are stored.
pub static STAFF_ID_CACHE: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(staff_id: &str) {
    STAFF_ID_CACHE.insert(staff_id.to_string(), ()).await;
}

pub async fn is_taken(staff_id: &str) -> bool {
    STAFF_ID_CACHE.get(staff_id).await.is_some()
}

async fn batch_mark(staff_ids: &[String]) {
    let futures: Vec<_> = staff_ids
        .iter()
        .map(|id| STAFF_ID_CACHE.insert(id.clone(), ()))
        .collect();

    futures::future::join_all(futures).await;
}

/// Load ids of staff registered in the last `days` days (batched).
pub async fn warmup_staff_id_cache(pool: &MySqlPool, days: u32, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        r#"
        SELECT staff_id
        FROM staff
        WHERE created_at >= NOW() - INTERVAL ? DAY
        ORDER BY created_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (staff_id,) = row?;
        batch.push(staff_id);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Staff id cache warmup complete: {} recent staff (last {} days)",
        total_count,
        days
    );

    Ok(())
}
