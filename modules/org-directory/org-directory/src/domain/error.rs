use org_directory_sdk::{DirectoryError, NoMatchReason};

/// Domain-level errors for the org directory.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("No match: {reason}")]
    NoMatch { reason: NoMatchReason },

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Storage failure: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn no_match(reason: NoMatchReason) -> Self {
        Self::NoMatch { reason }
    }

    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn storage(e: impl Into<anyhow::Error>) -> Self {
        Self::Storage(e.into())
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Storage(e.into())
    }
}

impl From<DomainError> for DirectoryError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { entity, id } => Self::NotFound { entity, id },
            DomainError::NoMatch { reason } => Self::NoMatch { reason },
            DomainError::Validation { field, message } => Self::Validation {
                field: field.to_owned(),
                message,
            },
            DomainError::Storage(source) => Self::Storage(format!("{source:#}")),
            DomainError::Cancelled => Self::Cancelled,
        }
    }
}
