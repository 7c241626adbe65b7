use anyhow::Error;
use thiserror::Error;

use crate::core::uri::Uri;

/// An error surfaced to the host embedding the router.
///
/// These are configuration and lifecycle errors, and indicate a bug in the
/// caller rather than a misbehaving peer.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A realm is already registered under the URI.
    #[error("realm exists: {0}")]
    RealmExists(Uri),
    /// The peer failed authentication against the realm.
    #[error("authentication error: {0}")]
    Authentication(String),
    /// The router is closing, so new connections are not allowed.
    #[error("router is closing, no new connections are allowed")]
    ShuttingDown,
    /// The router was closed more than once.
    #[error("already closed")]
    AlreadyClosed,
}

/// A basic error that occurs while processing a WAMP message.
#[derive(Debug, Error)]
pub enum BasicError {
    /// A generic resource was not found.
    ///
    /// WAMP defines standard URIs for not finding specific resource types.
    /// This error should only be used when the standard URI cannot be used.
    #[error("{0}")]
    NotFound(String),
    /// An invalid argument was passed.
    #[error("{0}")]
    InvalidArgument(String),
    /// The operation is not allowed based on process configuration.
    #[error("{0}")]
    NotAllowed(String),
    /// Some internal error occurred.
    #[error("{0}")]
    Internal(String),
}

impl BasicError {
    /// The trailing URI component for the error.
    pub fn uri_component(&self) -> &str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotAllowed(_) => "not_allowed",
            Self::Internal(_) => "internal",
        }
    }
}

/// An interaction error that occurs while processing a WAMP message.
///
/// Interaction errors are clearly defined in the WAMP standard and are
/// reserved for errors that peers must be able to parse easily.
#[derive(Debug, Error)]
pub enum InteractionError {
    /// The incoming message violates the WAMP protocol.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    /// The realm being referenced does not exist.
    #[error("no such realm")]
    NoSuchRealm,
    /// The subscription being referenced does not exist.
    #[error("no such subscription")]
    NoSuchSubscription,
    /// The procedure being called does not exist.
    #[error("no such procedure")]
    NoSuchProcedure,
    /// The registration being referenced does not exist.
    #[error("no such registration")]
    NoSuchRegistration,
    /// The peer could not be authenticated against the realm.
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),
    /// The peer did not respond in time.
    #[error("timed out")]
    Timeout,
}

impl InteractionError {
    /// The trailing URI component for the error.
    pub fn uri_component(&self) -> &str {
        match self {
            Self::ProtocolViolation(_) => "protocol_violation",
            Self::NoSuchRealm => "no_such_realm",
            Self::NoSuchSubscription => "no_such_subscription",
            Self::NoSuchProcedure => "no_such_procedure",
            Self::NoSuchRegistration => "no_such_registration",
            Self::AuthorizationFailed(_) => "authorization_failed",
            Self::Timeout => "timeout",
        }
    }
}

/// The `wamp.error.*` reason URI describing an error.
///
/// Errors outside the WAMP-standard taxonomies map to `wamp.error.internal`.
pub fn reason_for_error(error: &Error) -> Uri {
    if let Some(err) = error.downcast_ref::<InteractionError>() {
        return Uri::from_known(format!("wamp.error.{}", err.uri_component()));
    }
    if let Some(err) = error.downcast_ref::<BasicError>() {
        return Uri::from_known(format!("wamp.error.{}", err.uri_component()));
    }
    if let Some(RouterError::ShuttingDown) = error.downcast_ref::<RouterError>() {
        return Uri::from_known("wamp.error.system_shutdown");
    }
    Uri::from_known("wamp.error.internal")
}

#[cfg(test)]
mod error_test {
    use crate::core::error::{
        reason_for_error,
        BasicError,
        InteractionError,
        RouterError,
    };

    #[test]
    fn maps_errors_to_reason_uris() {
        assert_eq!(
            reason_for_error(&InteractionError::NoSuchRealm.into()).as_ref(),
            "wamp.error.no_such_realm"
        );
        assert_eq!(
            reason_for_error(&InteractionError::AuthorizationFailed("denied".to_owned()).into())
                .as_ref(),
            "wamp.error.authorization_failed"
        );
        assert_eq!(
            reason_for_error(&RouterError::ShuttingDown.into()).as_ref(),
            "wamp.error.system_shutdown"
        );
        assert_eq!(
            reason_for_error(&BasicError::NotAllowed("nope".to_owned()).into()).as_ref(),
            "wamp.error.not_allowed"
        );
        assert_eq!(
            reason_for_error(&anyhow::Error::msg("anything else")).as_ref(),
            "wamp.error.internal"
        );
    }
}
