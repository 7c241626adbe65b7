use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::message::message::Message;

/// An error on a peer channel.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The channel is closed, either locally or by the remote end.
    #[error("peer is closed")]
    Closed,
    /// No message arrived within the requested window.
    #[error("timed out waiting for a message")]
    Timeout,
}

/// A bidirectional, typed-message channel to one WAMP peer.
///
/// Transports implement this over their framing and serialization; the
/// routing core only ever sees [`Message`]s.
#[async_trait]
pub trait Peer: Send + Sync {
    /// Enqueues one message for transmission to the remote end.
    ///
    /// Success means the transport accepted the message, not that the remote
    /// end acknowledged it.
    async fn send(&self, message: Message) -> Result<()>;

    /// Blocks until the next inbound message arrives.
    async fn receive(&self) -> Result<Message>;

    /// Receives the next inbound message, failing with [`PeerError::Timeout`]
    /// if none arrives within the duration.
    async fn receive_timeout(&self, duration: Duration) -> Result<Message> {
        match tokio::time::timeout(duration, self.receive()).await {
            Ok(result) => result,
            Err(_) => Err(PeerError::Timeout.into()),
        }
    }

    /// Closes the channel. Idempotent; further sends and receives fail.
    async fn close(&self) -> Result<()>;
}
