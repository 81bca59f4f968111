use applybot_common::retry::Retryable;
use applybot_common::ApplyError;
use fantoccini::error::{CmdError, ErrorStatus};

/// A page interaction fault, classified for the retry combinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InteractionError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("element not interactable: {0}")]
    NotInteractable(String),

    #[error("stale element reference: {0}")]
    Stale(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser session lost: {0}")]
    SessionLost(String),

    #[error("script error: {0}")]
    Script(String),
}

impl Retryable for InteractionError {
    fn is_transient(&self) -> bool {
        !matches!(
            self,
            InteractionError::SessionLost(_) | InteractionError::Script(_)
        )
    }
}

impl InteractionError {
    pub fn is_session_lost(&self) -> bool {
        matches!(self, InteractionError::SessionLost(_))
    }

    /// Attach the action being attempted and lift into the shared error type.
    pub fn while_doing(self, action: impl Into<String>) -> ApplyError {
        match self {
            InteractionError::SessionLost(reason) => ApplyError::Session(reason),
            other => ApplyError::Interaction {
                action: action.into(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<InteractionError> for ApplyError {
    fn from(err: InteractionError) -> Self {
        err.while_doing("interacting with the page")
    }
}

/// Map a W3C WebDriver status onto an interaction fault.
pub fn classify_status(status: &ErrorStatus, message: String) -> InteractionError {
    match status {
        ErrorStatus::NoSuchElement => InteractionError::NotFound(message),
        ErrorStatus::StaleElementReference => InteractionError::Stale(message),
        ErrorStatus::ElementNotInteractable
        | ErrorStatus::ElementClickIntercepted
        | ErrorStatus::InvalidElementState => InteractionError::NotInteractable(message),
        ErrorStatus::Timeout | ErrorStatus::ScriptTimeout => InteractionError::Timeout(message),
        ErrorStatus::NoSuchWindow | ErrorStatus::NoSuchFrame => {
            InteractionError::Navigation(message)
        }
        ErrorStatus::InvalidSessionId | ErrorStatus::SessionNotCreated => {
            InteractionError::SessionLost(message)
        }
        _ => InteractionError::Script(message),
    }
}

impl From<CmdError> for InteractionError {
    fn from(err: CmdError) -> Self {
        if err.is_no_such_element() {
            return InteractionError::NotFound(err.to_string());
        }
        match err {
            CmdError::Standard(wd) => {
                let message = wd.to_string();
                classify_status(&wd.error, message)
            }
            CmdError::Lost(e) => InteractionError::SessionLost(e.to_string()),
            CmdError::BadUrl(e) => InteractionError::Navigation(e.to_string()),
            other => InteractionError::Script(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_classified() {
        let m = || "m".to_string();
        assert_eq!(
            classify_status(&ErrorStatus::StaleElementReference, m()),
            InteractionError::Stale(m())
        );
        assert_eq!(
            classify_status(&ErrorStatus::ElementClickIntercepted, m()),
            InteractionError::NotInteractable(m())
        );
        assert_eq!(
            classify_status(&ErrorStatus::InvalidSessionId, m()),
            InteractionError::SessionLost(m())
        );
        assert_eq!(
            classify_status(&ErrorStatus::NoSuchElement, m()),
            InteractionError::NotFound(m())
        );
    }

    #[test]
    fn command_errors_keep_their_status() {
        use fantoccini::error::WebDriver;

        let missing = CmdError::Standard(WebDriver::new(ErrorStatus::NoSuchElement, "no button"));
        assert!(matches!(InteractionError::from(missing), InteractionError::NotFound(_)));
        let gone = CmdError::Standard(WebDriver::new(ErrorStatus::InvalidSessionId, "closed"));
        assert!(InteractionError::from(gone).is_session_lost());
    }

    #[test]
    fn only_session_and_script_faults_are_permanent() {
        assert!(InteractionError::Stale("x".into()).is_transient());
        assert!(InteractionError::NotFound("x".into()).is_transient());
        assert!(InteractionError::Timeout("x".into()).is_transient());
        assert!(!InteractionError::SessionLost("x".into()).is_transient());
        assert!(!InteractionError::Script("x".into()).is_transient());
    }

    #[test]
    fn lost_sessions_become_fatal_apply_errors() {
        let err = InteractionError::SessionLost("gone".into()).while_doing("clicking");
        assert!(err.is_fatal());
        let err = InteractionError::NotFound("button".into()).while_doing("clicking");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("clicking"));
    }
}
