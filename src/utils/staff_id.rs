use rand::Rng;
use sqlx::MySqlPool;

use crate::model::staff::Staff;
use crate::utils::{staff_id_cache, staff_id_filter};

pub const STAFF_ID_LEN: usize = 8;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// True when the id mixes at least one letter and one digit.
pub fn is_mixed(staff_id: &str) -> bool {
    staff_id.bytes().any(|b| b.is_ascii_uppercase()) && staff_id.bytes().any(|b| b.is_ascii_digit())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    loop {
        let candidate: String = (0..STAFF_ID_LEN)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        if is_mixed(&candidate) {
            return candidate;
        }
    }
}

pub fn generate() -> String {
    generate_with(&mut rand::rng())
}

/// true  => id AVAILABLE
/// false => id TAKEN
pub async fn is_available(pool: &MySqlPool, staff_id: &str) -> Result<bool, sqlx::Error> {
    // Filter says "never seen": definitely free.
    if !staff_id_filter::might_exist(staff_id) {
        return Ok(true);
    }

    if staff_id_cache::is_taken(staff_id).await {
        return Ok(false);
    }

    let taken = Staff::exists(pool, staff_id).await?;
    if taken {
        staff_id_cache::mark_taken(staff_id).await;
    }
    Ok(!taken)
}

/// Record a freshly inserted id in both in-memory structures.
pub async fn remember(staff_id: &str) {
    staff_id_filter::insert(staff_id);
    staff_id_cache::mark_taken(staff_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_ids_are_mixed_alphanumeric() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let id = generate_with(&mut rng);
            assert_eq!(id.len(), STAFF_ID_LEN);
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
            assert!(is_mixed(&id), "{id} is not mixed");
        }
    }

    #[test]
    fn rejects_single_class_ids() {
        assert!(!is_mixed("ABCDEFGH"));
        assert!(!is_mixed("12345678"));
        assert!(is_mixed("ABCD1234"));
    }

    #[test]
    fn consecutive_ids_differ() {
        assert_ne!(generate(), generate());
    }
}
