use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::future::join_all;
use log::{
    debug,
    error,
    info,
    warn,
};
use tokio::sync::RwLock;

use crate::{
    auth::authenticator::Authenticator,
    core::{
        close::CloseReason,
        error::InteractionError,
        hash::HashMap,
        id::Id,
        types::{
            Dictionary,
            Value,
        },
        uri::Uri,
    },
    message::{
        common::goodbye_and_out,
        message::{
            GoodbyeMessage,
            Message,
            WelcomeMessage,
        },
    },
    peer::peer::Peer,
    router::{
        broker::{
            Broker,
            StandardBroker,
        },
        dealer::{
            Dealer,
            NullDealer,
        },
        session::{
            Session,
            SessionHandle,
        },
    },
};

/// How long a peer may take to answer an authentication challenge.
const AUTHENTICATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a closing realm waits for its session loops to drain.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for a [`StandardRealm`].
#[derive(Debug, Clone)]
pub struct RealmConfig {
    pub name: String,
    pub uri: Uri,
}

/// A named namespace on a router, owning one broker and one dealer.
///
/// The router admits peers against a realm; the realm then drives each
/// session's message loop until the session ends.
#[async_trait]
pub trait Realm: Send + Sync {
    /// Sets up realm resources. Idempotent; called on registration.
    async fn init(&self);

    /// Examines a joining peer's HELLO details and produces a WELCOME draft,
    /// or fails with the reason authentication was denied.
    ///
    /// May perform a CHALLENGE/AUTHENTICATE round trip on the peer before
    /// returning. The draft's session ID is assigned by the router.
    async fn handle_auth(&self, peer: &dyn Peer, details: &Dictionary) -> Result<WelcomeMessage>;

    /// Runs the session's message loop. Blocks until the session terminates,
    /// at which point all of the session's routing state has been removed.
    async fn handle_session(&self, session: Session, details: Dictionary);

    /// Kills every live session and waits (bounded) for their loops to drain.
    async fn close(&self);
}

/// Realm with a pluggable broker, dealer, and authenticator set.
pub struct StandardRealm {
    config: RealmConfig,
    broker: Box<dyn Broker>,
    dealer: Box<dyn Dealer>,
    authenticators: Vec<Box<dyn Authenticator>>,
    sessions: RwLock<HashMap<Id, SessionHandle>>,
}

impl StandardRealm {
    /// Creates a realm with a [`StandardBroker`] and a [`NullDealer`].
    pub fn new(config: RealmConfig) -> Self {
        Self {
            config,
            broker: Box::new(StandardBroker::new()),
            dealer: Box::new(NullDealer::default()),
            authenticators: Vec::default(),
            sessions: RwLock::new(HashMap::default()),
        }
    }

    /// Replaces the realm's broker.
    pub fn with_broker(mut self, broker: Box<dyn Broker>) -> Self {
        self.broker = broker;
        self
    }

    /// Replaces the realm's dealer.
    pub fn with_dealer(mut self, dealer: Box<dyn Dealer>) -> Self {
        self.dealer = dealer;
        self
    }

    /// Adds an authenticator. A realm with authenticators only admits peers
    /// that pass one of them.
    pub fn with_authenticator(mut self, authenticator: Box<dyn Authenticator>) -> Self {
        self.authenticators.push(authenticator);
        self
    }

    /// The realm URI.
    pub fn uri(&self) -> &Uri {
        &self.config.uri
    }

    fn find_authenticator(&self, details: &Dictionary) -> Option<&dyn Authenticator> {
        let methods = details.get("authmethods").and_then(|val| val.list())?;
        self.authenticators
            .iter()
            .find(|authenticator| {
                methods.contains(&Value::String(authenticator.auth_method().to_owned()))
            })
            .map(|authenticator| authenticator.as_ref())
    }

    /// Dispatches one message from the session's peer. Returns whether the
    /// message loop should exit.
    async fn handle_message(&self, handle: &SessionHandle, message: Message) -> bool {
        debug!(
            "Received {} message from session {}: {message:?}",
            message.message_name(),
            handle.id()
        );
        match message {
            Message::Goodbye(_) => {
                if let Err(err) = handle.send(goodbye_and_out()).await {
                    debug!(
                        "Failed to reply GOODBYE to session {}: {err}",
                        handle.id()
                    );
                }
                true
            }
            Message::Publish(message) => {
                self.broker.publish(handle, message).await;
                false
            }
            Message::Subscribe(message) => {
                self.broker.subscribe(handle, message).await;
                false
            }
            Message::Unsubscribe(message) => {
                self.broker.unsubscribe(handle, message).await;
                false
            }
            message @ (Message::Call(_)
            | Message::Register(_)
            | Message::Unregister(_)
            | Message::Yield(_)) => {
                self.dealer.handle_message(handle, message).await;
                false
            }
            message => {
                warn!(
                    "Unhandled {} message from session {}",
                    message.message_name(),
                    handle.id()
                );
                false
            }
        }
    }
}

#[async_trait]
impl Realm for StandardRealm {
    async fn init(&self) {
        debug!("Initialized realm {}", self.uri());
    }

    async fn handle_auth(&self, peer: &dyn Peer, details: &Dictionary) -> Result<WelcomeMessage> {
        let mut welcome_details = Dictionary::default();
        if let Some(authenticator) = self.find_authenticator(details) {
            let challenge = authenticator.challenge(details).await?;
            peer.send(Message::Challenge(challenge)).await?;
            let authenticate = match peer.receive_timeout(AUTHENTICATE_TIMEOUT).await? {
                Message::Authenticate(message) => message,
                message => {
                    return Err(InteractionError::ProtocolViolation(format!(
                        "expected AUTHENTICATE, received {}",
                        message.message_name()
                    ))
                    .into())
                }
            };
            let identity = authenticator.authenticate(&authenticate).await?;
            welcome_details.insert(
                "authmethod".to_owned(),
                Value::String(authenticator.auth_method().to_owned()),
            );
            welcome_details.insert("authid".to_owned(), Value::String(identity.id));
            welcome_details.insert("authrole".to_owned(), Value::String(identity.role));
        } else if !self.authenticators.is_empty() {
            return Err(InteractionError::AuthorizationFailed(
                "no supported authentication method offered".to_owned(),
            )
            .into());
        }
        // The router assigns the final session ID.
        Ok(WelcomeMessage {
            id: Id::default(),
            details: welcome_details,
        })
    }

    async fn handle_session(&self, mut session: Session, _details: Dictionary) {
        let handle = session.handle();
        self.sessions.write().await.insert(handle.id(), handle.clone());
        info!("Session {} joined realm {}", handle.id(), self.uri());

        loop {
            tokio::select! {
                message = handle.receive() => match message {
                    Ok(message) => {
                        if self.handle_message(&handle, message).await {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!("Lost session {}: {err}", handle.id());
                        break;
                    }
                },
                reason = session.recv_kill() => {
                    let reason = reason.unwrap_or_else(|| CloseReason::Killed.uri());
                    if let Err(err) = handle
                        .send(Message::Goodbye(GoodbyeMessage {
                            details: Dictionary::default(),
                            reason,
                        }))
                        .await
                    {
                        debug!(
                            "Failed to send GOODBYE to killed session {}: {err}",
                            handle.id()
                        );
                    }
                    break;
                }
            }
        }

        // The session must leave the routing tables before its record drops.
        self.broker.remove_subscriber(&handle).await;
        self.dealer.remove_session(&handle).await;
        self.sessions.write().await.remove(&handle.id());
        handle.notify_closed();
        info!("Session {} left realm {}", handle.id(), self.uri());
    }

    async fn close(&self) {
        let sessions = self
            .sessions
            .read()
            .await
            .values()
            .cloned()
            .collect::<Vec<_>>();
        let mut closed = Vec::default();
        for session in &sessions {
            closed.push(session.closed_rx());
            session.kill(CloseReason::SystemShutdown.uri());
        }

        tokio::select! {
            _ = join_all(closed.iter_mut().map(|rx| rx.recv())) => {}
            _ = tokio::time::sleep(CLOSE_TIMEOUT) => {
                error!(
                    "Timed out waiting for sessions of realm {} to close cleanly",
                    self.uri()
                );
            }
        }

        self.sessions.write().await.clear();
    }
}
