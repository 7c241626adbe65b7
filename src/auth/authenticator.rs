use anyhow::Result;
use async_trait::async_trait;
use futures_util::lock::Mutex;

use crate::{
    auth::identity::Identity,
    core::{
        error::InteractionError,
        hash::HashMap,
        types::Dictionary,
    },
    message::message::{
        AuthenticateMessage,
        ChallengeMessage,
    },
};

/// Module for authenticating peers joining a realm.
///
/// A realm may hold several authenticators for different methods; the one
/// matching a method advertised in the peer's HELLO details runs a single
/// CHALLENGE/AUTHENTICATE round trip.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authentication method, as advertised in `authmethods`.
    fn auth_method(&self) -> &str;

    /// Generates the authentication challenge from the peer's HELLO details.
    async fn challenge(&self, details: &Dictionary) -> Result<ChallengeMessage>;

    /// Authenticates the peer's response to the challenge.
    async fn authenticate(&self, message: &AuthenticateMessage) -> Result<Identity>;
}

/// Ticket-based authenticator: the peer proves its identity by presenting the
/// static ticket stored for its authentication ID.
pub struct TicketAuthenticator {
    tickets: HashMap<String, String>,
    pending: Mutex<Option<String>>,
}

impl TicketAuthenticator {
    /// Creates an authenticator over a static authid-to-ticket table.
    pub fn new<I, S, T>(tickets: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            tickets: tickets
                .into_iter()
                .map(|(id, ticket)| (id.into(), ticket.into()))
                .collect(),
            pending: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Authenticator for TicketAuthenticator {
    fn auth_method(&self) -> &str {
        "ticket"
    }

    async fn challenge(&self, details: &Dictionary) -> Result<ChallengeMessage> {
        let id = details
            .get("authid")
            .and_then(|val| val.string())
            .ok_or_else(|| {
                InteractionError::AuthorizationFailed("missing authid".to_owned())
            })?;
        if !self.tickets.contains_key(id) {
            return Err(
                InteractionError::AuthorizationFailed(format!("no such principal: {id}")).into(),
            );
        }
        *self.pending.lock().await = Some(id.to_owned());
        Ok(ChallengeMessage {
            auth_method: self.auth_method().to_owned(),
            extra: Dictionary::default(),
        })
    }

    async fn authenticate(&self, message: &AuthenticateMessage) -> Result<Identity> {
        let pending = self.pending.lock().await;
        let id = pending.as_ref().ok_or_else(|| {
            InteractionError::AuthorizationFailed("no pending challenge".to_owned())
        })?;
        match self.tickets.get(id) {
            Some(ticket) if *ticket == message.signature => Ok(Identity {
                id: id.clone(),
                role: "user".to_owned(),
            }),
            _ => Err(InteractionError::AuthorizationFailed("bad ticket".to_owned()).into()),
        }
    }
}

#[cfg(test)]
mod authenticator_test {
    use crate::{
        auth::{
            authenticator::{
                Authenticator,
                TicketAuthenticator,
            },
            identity::Identity,
        },
        core::{
            error::InteractionError,
            types::{
                Dictionary,
                Value,
            },
        },
        message::message::AuthenticateMessage,
    };

    fn hello_details(authid: &str) -> Dictionary {
        Dictionary::from_iter([("authid".to_owned(), Value::from(authid))])
    }

    #[tokio::test]
    async fn authenticates_matching_ticket() {
        let authenticator = TicketAuthenticator::new([("user", "password123!")]);
        assert_matches::assert_matches!(
            authenticator.challenge(&hello_details("user")).await,
            Ok(challenge) => {
                assert_eq!(challenge.auth_method, "ticket");
            }
        );
        assert_matches::assert_matches!(
            authenticator
                .authenticate(&AuthenticateMessage {
                    signature: "password123!".to_owned(),
                    extra: Dictionary::default(),
                })
                .await,
            Ok(identity) => {
                assert_eq!(identity, Identity {
                    id: "user".to_owned(),
                    role: "user".to_owned(),
                });
            }
        );
    }

    #[tokio::test]
    async fn rejects_bad_ticket() {
        let authenticator = TicketAuthenticator::new([("user", "password123!")]);
        assert_matches::assert_matches!(
            authenticator.challenge(&hello_details("user")).await,
            Ok(_)
        );
        assert_matches::assert_matches!(
            authenticator
                .authenticate(&AuthenticateMessage {
                    signature: "wrong".to_owned(),
                    extra: Dictionary::default(),
                })
                .await,
            Err(err) => {
                assert_matches::assert_matches!(
                    err.downcast::<InteractionError>(),
                    Ok(InteractionError::AuthorizationFailed(_))
                );
            }
        );
    }

    #[tokio::test]
    async fn rejects_unknown_principal() {
        let authenticator = TicketAuthenticator::new([("user", "password123!")]);
        assert_matches::assert_matches!(
            authenticator.challenge(&hello_details("another")).await,
            Err(err) => {
                assert_matches::assert_matches!(
                    err.downcast::<InteractionError>(),
                    Ok(InteractionError::AuthorizationFailed(_))
                );
            }
        );
    }
}
