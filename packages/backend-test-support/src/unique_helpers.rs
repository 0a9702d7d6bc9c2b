//! Unique test data, so rows seeded by different tests never collide on the
//! unique email and label indexes.

use ulid::Ulid;

/// `{prefix}-{ulid}`
///
/// ```
/// use backend_test_support::unique_helpers::unique_str;
///
/// let a = unique_str("computer");
/// assert_ne!(a, unique_str("computer"));
/// assert!(a.starts_with("computer-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// `{prefix}-{ulid}@example.test`
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new())
}

/// A fresh identifier in the lowercase form stored in `uuid` columns.
pub fn unique_uuid() -> String {
    Ulid::new().to_string().to_lowercase()
}
