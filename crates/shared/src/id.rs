use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use validator::ValidationError;

/// Generate a 24-char lowercase hex object id: 4 timestamp bytes followed
/// by 8 random bytes. Keeps ids roughly creation-ordered and matches the
/// id pattern the bulk importer recognizes.
pub fn new_object_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let tail: [u8; 8] = rand::rng().random();

    let mut id = String::with_capacity(24);
    let _ = write!(id, "{secs:08x}");
    for byte in tail {
        let _ = write!(id, "{byte:02x}");
    }
    id
}

pub fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    if is_object_id(value) {
        Ok(())
    } else {
        Err(ValidationError::new("object_id"))
    }
}
