use thiserror::Error;

/// Failures reported by a [`Calendar`](crate::calendar::Calendar).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("an incidence with uid `{uid}` already exists")]
    DuplicateUid { uid: String },

    #[error("no incidence with uid `{uid}`")]
    NotFound { uid: String },
}

pub type Result<T, E = CalendarError> = std::result::Result<T, E>;
