//! Record identifier generation

use chrono::Local;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Random characters appended to each identifier
const SUFFIX_LEN: usize = 4;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The OS random source failed.
///
/// Callers must not fall back to a degraded identifier.
#[derive(Debug, Error)]
#[error("unable to source random characters for the id")]
pub struct RandomSourceError(#[source] rand::Error);

/// Generate a fresh record identifier: a dash-terminated local timestamp
/// prefix at second resolution followed by a 4-character random suffix,
/// e.g. `2024-11-02-09-41-07-kR3x`.
///
/// Identifiers sort lexically by generation time; uniqueness within one
/// second is probabilistic over the suffix space and true collisions are
/// the store's to reject.
pub fn generate_record_id() -> Result<String, RandomSourceError> {
    let mut raw = [0u8; SUFFIX_LEN];
    OsRng.try_fill_bytes(&mut raw).map_err(RandomSourceError)?;

    let suffix: String = raw
        .iter()
        .map(|byte| SUFFIX_CHARSET[*byte as usize % SUFFIX_CHARSET.len()] as char)
        .collect();

    Ok(format!(
        "{}{}",
        Local::now().format("%Y-%m-%d-%H-%M-%S-"),
        suffix
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::collections::HashSet;

    #[test]
    fn id_is_a_timestamp_prefix_plus_alphanumeric_suffix() {
        let id = generate_record_id().unwrap();

        assert_eq!(id.len(), 24);
        NaiveDateTime::parse_from_str(&id[..19], "%Y-%m-%d-%H-%M-%S").unwrap();
        assert_eq!(&id[19..20], "-");
        assert!(id[20..].bytes().all(|b| b.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_in_one_batch_are_distinct() {
        let ids: HashSet<String> = (0..50).map(|_| generate_record_id().unwrap()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn ids_sort_by_generation_time() {
        let first = generate_record_id().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let second = generate_record_id().unwrap();

        assert!(first < second);
    }
}
