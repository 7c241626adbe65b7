use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::lock::Mutex;
use tokio::sync::mpsc::{
    unbounded_channel,
    UnboundedReceiver,
    UnboundedSender,
};

use crate::{
    message::message::Message,
    peer::peer::{
        Peer,
        PeerError,
    },
};

/// One end of an in-process peer pipe.
///
/// Messages sent on one end arrive on the other, with no transport or
/// serialization in between. Closing either end fails subsequent operations
/// on both.
#[derive(Debug)]
pub struct LocalPeer {
    tx: Mutex<Option<UnboundedSender<Message>>>,
    rx: Mutex<UnboundedReceiver<Message>>,
    closed: AtomicBool,
}

impl LocalPeer {
    fn new(tx: UnboundedSender<Message>, rx: UnboundedReceiver<Message>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(rx),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Peer for LocalPeer {
    async fn send(&self, message: Message) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PeerError::Closed.into());
        }
        self.tx
            .lock()
            .await
            .as_ref()
            .ok_or(PeerError::Closed)?
            .send(message)
            .map_err(|_| PeerError::Closed.into())
    }

    async fn receive(&self) -> Result<Message> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PeerError::Closed.into());
        }
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| PeerError::Closed.into())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Dropping the sender ends the other side's receives; closing the
        // receiver fails its sends.
        *self.tx.lock().await = None;
        self.rx.lock().await.close();
        Ok(())
    }
}

/// Creates a connected pair of in-process peers.
pub fn local_pipe() -> (LocalPeer, LocalPeer) {
    let (a_tx, b_rx) = unbounded_channel();
    let (b_tx, a_rx) = unbounded_channel();
    (LocalPeer::new(a_tx, a_rx), LocalPeer::new(b_tx, b_rx))
}
