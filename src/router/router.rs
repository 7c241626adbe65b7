use std::{
    sync::Arc,
    time::Duration,
};

use anyhow::{
    Error,
    Result,
};
use futures_util::lock::Mutex;
use log::{
    debug,
    info,
};
use tokio::sync::RwLock;

use crate::{
    core::{
        error::{
            InteractionError,
            RouterError,
        },
        hash::HashMap,
        id::{
            Id,
            IdAllocator,
            RandomIdAllocator,
        },
        types::{
            Dictionary,
            Value,
        },
        uri::Uri,
    },
    message::{
        common::abort_message_for_error,
        message::{
            AbortMessage,
            Message,
        },
    },
    peer::{
        local::{
            local_pipe,
            LocalPeer,
        },
        peer::Peer,
    },
    router::{
        realm::Realm,
        session::Session,
    },
};

/// How long a connecting peer may take to send its HELLO.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

/// The details every WELCOME carries unless the realm already negotiated
/// them.
fn default_welcome_details() -> Dictionary {
    Dictionary::from_iter([(
        "roles".to_owned(),
        Value::Dictionary(Dictionary::from_iter([
            ("broker".to_owned(), Value::Dictionary(Dictionary::default())),
            ("dealer".to_owned(), Value::Dictionary(Dictionary::default())),
        ])),
    )])
}

/// Configuration for a [`Router`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Agent name, communicated to peers.
    pub agent: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            agent: DEFAULT_AGENT.to_owned(),
        }
    }
}

/// Callback observing a session opening or closing. Receives the session ID,
/// the realm URI, and the WELCOME details.
pub type SessionCallback = Arc<dyn Fn(Id, String, Dictionary) + Send + Sync>;

/// A WAMP router: accepts peers, negotiates sessions against named realms,
/// and hands accepted sessions to their realm.
pub struct Router {
    config: RouterConfig,
    realms: RwLock<HashMap<Uri, Arc<dyn Realm>>>,
    closing: Mutex<bool>,
    session_open_callbacks: Mutex<Vec<SessionCallback>>,
    session_close_callbacks: Mutex<Vec<SessionCallback>>,
    id_allocator: Box<dyn IdAllocator>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            realms: RwLock::new(HashMap::default()),
            closing: Mutex::new(false),
            session_open_callbacks: Mutex::new(Vec::default()),
            session_close_callbacks: Mutex::new(Vec::default()),
            id_allocator: Box::new(RandomIdAllocator::default()),
        }
    }

    /// Registers a realm under the URI.
    ///
    /// Fails if a realm is already registered under the same URI. Must be
    /// called before [`Self::accept`] admits traffic for the realm.
    pub async fn register_realm(&self, uri: Uri, realm: Arc<dyn Realm>) -> Result<()> {
        let mut realms = self.realms.write().await;
        if realms.contains_key(&uri) {
            return Err(RouterError::RealmExists(uri).into());
        }
        realm.init().await;
        info!("Registered realm {uri}");
        realms.insert(uri, realm);
        Ok(())
    }

    /// Registers a callback fired whenever a session is established.
    ///
    /// Callbacks run in their own tasks; the router neither waits for them
    /// nor orders them, and a panicking callback is contained to its task.
    pub async fn add_session_open_callback(&self, callback: SessionCallback) {
        self.session_open_callbacks.lock().await.push(callback);
    }

    /// Registers a callback fired whenever a session ends.
    pub async fn add_session_close_callback(&self, callback: SessionCallback) {
        self.session_close_callbacks.lock().await.push(callback);
    }

    /// Admits one connecting peer: performs the HELLO handshake, delegates
    /// authentication to the selected realm, sends WELCOME, and starts the
    /// realm's session loop in its own task.
    ///
    /// On any admission failure the peer receives an ABORT naming the reason
    /// and is closed; the error is returned for the host to log.
    pub async fn accept(&self, peer: Arc<dyn Peer>) -> Result<()> {
        if *self.closing.lock().await {
            let err: Error = RouterError::ShuttingDown.into();
            self.abort_and_close(peer.as_ref(), &err).await;
            return Err(err);
        }

        let message = match peer.receive_timeout(HELLO_TIMEOUT).await {
            Ok(message) => message,
            Err(err) => {
                if let Err(err) = peer.close().await {
                    debug!("Failed to close peer: {err}");
                }
                return Err(err);
            }
        };
        debug!("{}: {message:?}", message.message_name());

        let hello = match message {
            Message::Hello(hello) => hello,
            message => {
                let err: Error = InteractionError::ProtocolViolation(format!(
                    "expected HELLO, received {}",
                    message.message_name()
                ))
                .into();
                self.abort_and_close(peer.as_ref(), &err).await;
                return Err(err);
            }
        };

        let realm = self.realms.read().await.get(&hello.realm).cloned();
        let realm = match realm {
            Some(realm) => realm,
            None => {
                let err: Error = InteractionError::NoSuchRealm.into();
                self.abort_and_close(peer.as_ref(), &err).await;
                return Err(err);
            }
        };

        let mut welcome = match realm.handle_auth(peer.as_ref(), &hello.details).await {
            Ok(welcome) => welcome,
            Err(err) => {
                let abort = Message::Abort(AbortMessage {
                    details: Dictionary::from_iter([(
                        "error".to_owned(),
                        Value::String(err.to_string()),
                    )]),
                    // TODO: the WAMP standard names
                    // wamp.error.authentication_failed for a failed
                    // authentication exchange; switch once peers expect it.
                    reason: Uri::from_known("wamp.error.authorization_failed"),
                });
                if let Err(err) = peer.send(abort).await {
                    debug!("Failed to send ABORT: {err}");
                }
                if let Err(err) = peer.close().await {
                    debug!("Failed to close peer: {err}");
                }
                return Err(RouterError::Authentication(err.to_string()).into());
            }
        };

        welcome.id = self.id_allocator.generate_id().await;
        welcome
            .details
            .entry("agent".to_owned())
            .or_insert_with(|| Value::String(self.config.agent.clone()));
        for (key, value) in default_welcome_details() {
            welcome.details.entry(key).or_insert(value);
        }
        peer.send(Message::Welcome(welcome.clone())).await?;
        info!("Established session {}", welcome.id);

        let session = Session::new(welcome.id, peer);
        let handle = session.handle();
        let realm_uri = hello.realm;
        for callback in self.session_open_callbacks.lock().await.iter().cloned() {
            let realm_uri = realm_uri.to_string();
            let details = welcome.details.clone();
            let id = welcome.id;
            tokio::spawn(async move { callback(id, realm_uri, details) });
        }

        let close_callbacks = self.session_close_callbacks.lock().await.clone();
        let details = welcome.details;
        tokio::spawn(async move {
            realm.handle_session(session, details.clone()).await;
            handle.close().await;
            for callback in close_callbacks {
                let realm_uri = realm_uri.to_string();
                let details = details.clone();
                let id = handle.id();
                tokio::spawn(async move { callback(id, realm_uri, details) });
            }
        });
        Ok(())
    }

    /// Returns an in-process peer attached to the named realm.
    ///
    /// The session bypasses HELLO and authentication; its message loop is
    /// already running when this returns.
    pub async fn local_peer(&self, realm_uri: &Uri, details: Dictionary) -> Result<LocalPeer> {
        let realm = self
            .realms
            .read()
            .await
            .get(realm_uri)
            .cloned()
            .ok_or(InteractionError::NoSuchRealm)?;
        let (router_end, peer_end) = local_pipe();
        let session = Session::new(self.id_allocator.generate_id().await, Arc::new(router_end));
        info!("Established internal session {}", session.id());
        tokio::spawn(async move { realm.handle_session(session, details).await });
        Ok(peer_end)
    }

    /// Closes the router: every realm kills its live sessions, and further
    /// [`Self::accept`] calls are rejected.
    ///
    /// Closing twice fails with [`RouterError::AlreadyClosed`].
    pub async fn close(&self) -> Result<()> {
        {
            let mut closing = self.closing.lock().await;
            if *closing {
                return Err(RouterError::AlreadyClosed.into());
            }
            *closing = true;
        }
        info!("Closing router");
        let realms = self.realms.read().await.values().cloned().collect::<Vec<_>>();
        for realm in realms {
            realm.close().await;
        }
        Ok(())
    }

    async fn abort_and_close(&self, peer: &dyn Peer, error: &Error) {
        if let Err(err) = peer.send(abort_message_for_error(error)).await {
            debug!("Failed to send ABORT: {err}");
        }
        if let Err(err) = peer.close().await {
            debug!("Failed to close peer: {err}");
        }
    }
}
