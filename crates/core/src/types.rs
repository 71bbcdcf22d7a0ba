/// Integer primary-key type used across the platform.
pub type DbId = i64;

/// UTC timestamp type used across the platform.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
