/// Job identifiers are short lowercase hex strings.
pub type TaskId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
