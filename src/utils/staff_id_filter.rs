use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Sized for a single organization's roster.
const FILTER_CAPACITY: usize = 20_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static STAFF_ID_FILTER: Lazy<RwLock<CuckooFilter<str>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// False means the id is definitely unused. True may be a false positive.
pub fn might_exist(staff_id: &str) -> bool {
    match STAFF_ID_FILTER.read() {
        Ok(filter) => filter.contains(staff_id),
        // A poisoned filter can no longer rule ids out.
        Err(_) => true,
    }
}

pub fn insert(staff_id: &str) {
    if let Ok(mut filter) = STAFF_ID_FILTER.write() {
        filter.add(staff_id);
    }
}

/// Warm up the staff id filter using streaming + batching
pub async fn warmup_staff_id_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT staff_id FROM staff").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (staff_id,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(staff_id);
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Staff id filter warmup complete: {} staff", total);
    Ok(())
}

fn insert_batch(staff_ids: &[String]) {
    if let Ok(mut filter) = STAFF_ID_FILTER.write() {
        for staff_id in staff_ids {
            filter.add(staff_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_ids_are_reported_as_possibly_existing() {
        let id = "ZZTEST01";
        insert(id);
        assert!(might_exist(id));
    }
}
