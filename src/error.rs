use thiserror::Error;

/// Errors raised by the progression model and the curriculum catalog.
///
/// These are programmer errors (bad index, unknown id, malformed catalog),
/// never conditions a learner can trigger with valid input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    #[error("duplicate entity in sequence: {0}")]
    DuplicateEntity(String),

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error("unknown level {level} in course {course}")]
    UnknownLevel { course: String, level: String },

    #[error("level {level} in course {course} has no quiz")]
    NoQuiz { course: String, level: String },

    #[error("course {course} is only {percent}% complete")]
    CourseIncomplete { course: String, percent: u8 },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Errors raised by profile stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid user name: {0}")]
    InvalidUser(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by a [`crate::session::ProgressSession`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Progress(#[from] ProgressError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} is locked")]
    Locked(String),
}

/// Errors raised while loading [`crate::config::Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
