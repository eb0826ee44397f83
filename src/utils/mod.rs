//! Shared utilities.
//!
//! - [`fs`] - directory creation, atomic writes and path expansion
//! - [`fingerprint`] - stable hashes keying cached data to its inputs

pub mod fs;

use sha2::{Digest, Sha256};

/// Stable `sha256:<hex>` fingerprint of a list of strings.
///
/// Order-insensitive: the items are sorted and deduplicated before hashing,
/// so the same active plugin set always yields the same fingerprint.
pub fn fingerprint<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for item in &sorted {
        hasher.update(item.as_bytes());
        hasher.update(b"\n");
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
