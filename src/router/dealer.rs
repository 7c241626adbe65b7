use anyhow::Error;
use async_trait::async_trait;
use log::{
    error,
    warn,
};

use crate::{
    core::error::{
        BasicError,
        InteractionError,
    },
    message::{
        common::error_for_request,
        message::Message,
    },
    router::session::SessionHandle,
};

/// The RPC subsystem of a realm: routes CALLs to registered procedures.
///
/// This crate only consumes the interface; realms accept any implementation.
/// Like [`Broker`][`crate::router::Broker`] operations, dealer operations do
/// not fail to the caller.
#[async_trait]
pub trait Dealer: Send + Sync {
    /// Routes one RPC message from an established session.
    async fn handle_message(&self, session: &SessionHandle, message: Message);
    /// Removes all registrations and pending calls held by the session.
    async fn remove_session(&self, session: &SessionHandle);
}

/// A dealer with no procedures, for broker-only realms.
///
/// RPC requests are answered with the WAMP error a procedure-less dealer
/// would produce, rather than being dropped silently.
#[derive(Default)]
pub struct NullDealer {}

#[async_trait]
impl Dealer for NullDealer {
    async fn handle_message(&self, session: &SessionHandle, message: Message) {
        let error: Error = match &message {
            Message::Call(_) => InteractionError::NoSuchProcedure.into(),
            Message::Register(_) => {
                BasicError::NotAllowed("realm does not accept registrations".to_owned()).into()
            }
            Message::Unregister(_) => InteractionError::NoSuchRegistration.into(),
            _ => {
                warn!(
                    "Dropping unhandled {} message from session {}",
                    message.message_name(),
                    session.id()
                );
                return;
            }
        };
        if let Err(err) = session.send(error_for_request(&message, &error)).await {
            error!(
                "Failed to respond to {} from session {}: {err}",
                message.message_name(),
                session.id()
            );
        }
    }

    async fn remove_session(&self, _: &SessionHandle) {}
}
