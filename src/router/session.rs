use std::sync::Arc;

use anyhow::Result;
use log::debug;
use tokio::sync::{
    broadcast,
    mpsc,
};

use crate::{
    core::{
        id::Id,
        uri::Uri,
    },
    message::message::Message,
    peer::peer::Peer,
};

/// A live session bound to one accepted peer.
///
/// Owned by the realm's message loop for the session's whole lifetime. The
/// routing tables and the router itself hold [`SessionHandle`]s instead.
pub struct Session {
    handle: SessionHandle,
    kill_rx: mpsc::Receiver<Uri>,
}

impl Session {
    pub fn new(id: Id, peer: Arc<dyn Peer>) -> Self {
        // Single-slot kill channel, so one signal is retained and extra
        // signals never block the sender.
        let (kill_tx, kill_rx) = mpsc::channel(1);
        let (closed_tx, _) = broadcast::channel(1);
        Self {
            handle: SessionHandle {
                id,
                peer,
                kill_tx,
                closed_tx,
            },
            kill_rx,
        }
    }

    /// The session ID, as reported out to the peer.
    pub fn id(&self) -> Id {
        self.handle.id
    }

    /// Generates a handle to the session, which can be saved separately from
    /// the session's lifecycle.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Receives the next kill signal, carrying the close reason.
    ///
    /// Selectable alongside the peer receive in the session's message loop.
    pub async fn recv_kill(&mut self) -> Option<Uri> {
        self.kill_rx.recv().await
    }
}

/// A cloneable handle to a live [`Session`].
#[derive(Clone)]
pub struct SessionHandle {
    id: Id,
    peer: Arc<dyn Peer>,
    kill_tx: mpsc::Sender<Uri>,
    closed_tx: broadcast::Sender<()>,
}

impl SessionHandle {
    /// The session ID.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Sends a message to the session's peer.
    pub async fn send(&self, message: Message) -> Result<()> {
        self.peer.send(message).await
    }

    /// Receives the next message from the session's peer.
    pub async fn receive(&self) -> Result<Message> {
        self.peer.receive().await
    }

    /// Asks the session's message loop to terminate with the given reason.
    ///
    /// Non-blocking: once a kill signal is pending, further signals are
    /// dropped.
    pub fn kill(&self, reason: Uri) {
        self.kill_tx.try_send(reason).ok();
    }

    /// Closes the session's peer.
    pub async fn close(&self) {
        if let Err(err) = self.peer.close().await {
            debug!("Failed to close peer of session {}: {err}", self.id);
        }
    }

    /// The receiver channel that is populated when the session's message loop
    /// exits.
    pub fn closed_rx(&self) -> broadcast::Receiver<()> {
        self.closed_tx.subscribe()
    }

    pub(crate) fn notify_closed(&self) {
        self.closed_tx.send(()).ok();
    }
}
