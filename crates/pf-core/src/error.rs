//! Error types shared by every controller

use thiserror::Error;

/// Errors that can occur while wiring or driving the page controllers
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("Missing page element: {0}")]
    MissingElement(String),

    #[error("Preference storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("The page controllers were already started")]
    AlreadyStarted,
}

impl PortfolioError {
    /// Wrap a failure reported by an external collaborator
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        PortfolioError::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}

/// Contact form validation failures; the display text is shown to the visitor
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Please enter a valid email address")]
    InvalidEmail,
}

pub type Result<T> = std::result::Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_user_facing() {
        let err: PortfolioError = ValidationError::InvalidEmail.into();
        assert_eq!(err.to_string(), "Please enter a valid email address");
    }

    #[test]
    fn test_collaborator_error_names_source() {
        let err = PortfolioError::collaborator("search", "index offline");
        assert_eq!(err.to_string(), "search failed: index offline");
    }
}
