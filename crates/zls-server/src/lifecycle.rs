//! Lifecycle state machine.
//!
//! The session moves along a DAG with no back-edges: uninitialized →
//! initializing → initialized → shutdown → exiting. Which methods may be
//! handled depends only on the current state; the checks here gate dispatch
//! before any handler runs.

use crate::error::HandlerError;

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No `initialize` request has been accepted yet.
    #[default]
    Uninitialized,
    /// `initialize` answered; waiting for the `initialized` notification.
    Initializing,
    /// Normal operation.
    Initialized,
    /// `shutdown` answered; only `exit` remains.
    Shutdown,
    /// Terminating with a zero exit status.
    ExitingSuccess,
    /// Terminating with a non-zero exit status.
    ExitingFailure,
}

impl Status {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Shutdown => "shutdown",
            Self::ExitingSuccess => "exiting_success",
            Self::ExitingFailure => "exiting_failure",
        }
    }

    /// Whether the process is terminating.
    #[must_use]
    pub const fn is_exiting(self) -> bool {
        matches!(self, Self::ExitingSuccess | Self::ExitingFailure)
    }
}

/// Gates a request method against the current state.
///
/// # Errors
///
/// Returns `ServerNotInitialized` before `initialize` and `InvalidRequest`
/// for requests the current state forbids.
pub fn check_request(status: Status, method: &str) -> Result<(), HandlerError> {
    match status {
        Status::Uninitialized if method == "initialize" => Ok(()),
        Status::Uninitialized => Err(HandlerError::ServerNotInitialized),
        Status::Initializing => Err(HandlerError::InvalidRequest),
        Status::Initialized if method == "initialize" => Err(HandlerError::InvalidRequest),
        Status::Initialized => Ok(()),
        Status::Shutdown => Err(HandlerError::InvalidRequest),
        Status::ExitingSuccess | Status::ExitingFailure => {
            unreachable!("dispatch while exiting")
        }
    }
}

/// Gates a notification method against the current state.
///
/// # Errors
///
/// Same taxonomy as [`check_request`]; the dispatcher swallows the error
/// for notifications after logging it.
pub fn check_notification(status: Status, method: &str) -> Result<(), HandlerError> {
    match status {
        Status::Uninitialized if method == "exit" => Ok(()),
        Status::Uninitialized => Err(HandlerError::ServerNotInitialized),
        Status::Initializing if matches!(method, "initialized" | "$/progress") => Ok(()),
        Status::Initializing => Err(HandlerError::InvalidRequest),
        Status::Initialized => Ok(()),
        Status::Shutdown if method == "exit" => Ok(()),
        Status::Shutdown => Err(HandlerError::InvalidRequest),
        Status::ExitingSuccess | Status::ExitingFailure => {
            unreachable!("dispatch while exiting")
        }
    }
}

/// State reached by `exit`, or `None` when the transition is refused.
///
/// `exit` after `shutdown` terminates cleanly; `exit` from a session that
/// never shut down terminates with a failure status. The protocol leaves
/// `exit` during `initializing` undefined, so the transition is refused.
#[must_use]
pub fn exit_transition(status: Status) -> Option<Status> {
    match status {
        Status::Shutdown => Some(Status::ExitingSuccess),
        Status::Uninitialized | Status::Initialized => Some(Status::ExitingFailure),
        Status::Initializing => None,
        Status::ExitingSuccess | Status::ExitingFailure => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::initialize_first(Status::Uninitialized, "initialize", Ok(()))]
    #[case::hover_too_early(
        Status::Uninitialized,
        "textDocument/hover",
        Err(HandlerError::ServerNotInitialized)
    )]
    #[case::shutdown_too_early(
        Status::Uninitialized,
        "shutdown",
        Err(HandlerError::ServerNotInitialized)
    )]
    #[case::request_while_initializing(
        Status::Initializing,
        "textDocument/hover",
        Err(HandlerError::InvalidRequest)
    )]
    #[case::second_initialize(
        Status::Initialized,
        "initialize",
        Err(HandlerError::InvalidRequest)
    )]
    #[case::hover_when_ready(Status::Initialized, "textDocument/hover", Ok(()))]
    #[case::shutdown_when_ready(Status::Initialized, "shutdown", Ok(()))]
    #[case::request_after_shutdown(
        Status::Shutdown,
        "textDocument/hover",
        Err(HandlerError::InvalidRequest)
    )]
    fn request_gating(
        #[case] status: Status,
        #[case] method: &str,
        #[case] expected: Result<(), HandlerError>,
    ) {
        assert_eq!(check_request(status, method), expected);
    }

    #[rstest]
    #[case::exit_before_initialize(Status::Uninitialized, "exit", Ok(()))]
    #[case::open_before_initialize(
        Status::Uninitialized,
        "textDocument/didOpen",
        Err(HandlerError::ServerNotInitialized)
    )]
    #[case::initialized_handshake(Status::Initializing, "initialized", Ok(()))]
    #[case::progress_while_initializing(Status::Initializing, "$/progress", Ok(()))]
    #[case::open_while_initializing(
        Status::Initializing,
        "textDocument/didOpen",
        Err(HandlerError::InvalidRequest)
    )]
    #[case::open_when_ready(Status::Initialized, "textDocument/didOpen", Ok(()))]
    #[case::exit_after_shutdown(Status::Shutdown, "exit", Ok(()))]
    #[case::open_after_shutdown(
        Status::Shutdown,
        "textDocument/didOpen",
        Err(HandlerError::InvalidRequest)
    )]
    fn notification_gating(
        #[case] status: Status,
        #[case] method: &str,
        #[case] expected: Result<(), HandlerError>,
    ) {
        assert_eq!(check_notification(status, method), expected);
    }

    #[rstest]
    #[case::clean(Status::Shutdown, Some(Status::ExitingSuccess))]
    #[case::abrupt(Status::Initialized, Some(Status::ExitingFailure))]
    #[case::never_started(Status::Uninitialized, Some(Status::ExitingFailure))]
    #[case::mid_handshake(Status::Initializing, None)]
    fn exit_transitions(#[case] status: Status, #[case] expected: Option<Status>) {
        assert_eq!(exit_transition(status), expected);
    }

    #[test]
    #[should_panic(expected = "dispatch while exiting")]
    fn gating_while_exiting_is_a_programmer_error() {
        let _ = check_request(Status::ExitingSuccess, "shutdown");
    }
}
