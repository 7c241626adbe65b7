//! WAMP message records.
//!
//! The routing core consumes and produces these as plain data. Turning them
//! into and out of their wire tuple form is the job of the transport layer
//! behind a [`Peer`][`crate::peer::Peer`].

use crate::core::{
    id::Id,
    types::{
        Dictionary,
        Integer,
        List,
    },
    uri::Uri,
};

/// Opens a session: the peer names the realm it wants to join and describes
/// itself in `details`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HelloMessage {
    pub realm: Uri,
    pub details: Dictionary,
}

/// Accepts a session. The `id` is assigned by the router and stays unique
/// for the router's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub id: Id,
    pub details: Dictionary,
}

/// Tears a session down immediately, skipping the GOODBYE handshake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AbortMessage {
    pub details: Dictionary,
    pub reason: Uri,
}

/// Demands proof of identity from a joining peer before it is welcomed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChallengeMessage {
    pub auth_method: String,
    pub extra: Dictionary,
}

/// Answers a CHALLENGE with the peer's signature.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthenticateMessage {
    pub signature: String,
    pub extra: Dictionary,
}

/// Starts, or answers, the two-way session close handshake.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GoodbyeMessage {
    pub details: Dictionary,
    pub reason: Uri,
}

/// Reports the failure of a single request. `request_type` carries the tag
/// of the message kind that failed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub request_type: Integer,
    pub request: Id,
    pub details: Dictionary,
    pub error: Uri,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Asks the broker to emit an event on a topic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishMessage {
    pub request: Id,
    pub options: Dictionary,
    pub topic: Uri,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Acknowledges a PUBLISH that asked for one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub request: Id,
    pub publication: Id,
}

/// Asks the broker for events published to a topic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscribeMessage {
    pub request: Id,
    pub options: Dictionary,
    pub topic: Uri,
}

/// Confirms a subscription and hands out its ID.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscribedMessage {
    pub request: Id,
    pub subscription: Id,
}

/// Gives a subscription back to the broker by ID.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnsubscribeMessage {
    pub request: Id,
    pub subscription: Id,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnsubscribedMessage {
    pub request: Id,
}

/// One delivery of a publication to one subscription.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub subscription: Id,
    pub publication: Id,
    pub details: Dictionary,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Invokes a procedure through the dealer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallMessage {
    pub request: Id,
    pub options: Dictionary,
    pub procedure: Uri,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Carries a call's outcome back to the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    pub request: Id,
    pub details: Dictionary,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Offers a procedure to the realm.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterMessage {
    pub request: Id,
    pub options: Dictionary,
    pub procedure: Uri,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisteredMessage {
    pub request: Id,
    pub registration: Id,
}

/// Withdraws a procedure by registration ID.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnregisterMessage {
    pub request: Id,
    pub registration: Id,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnregisteredMessage {
    pub request: Id,
}

/// Forwards a call to the callee that registered the procedure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvocationMessage {
    pub request: Id,
    pub registration: Id,
    pub details: Dictionary,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// Returns an invocation's result from the callee.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct YieldMessage {
    pub request: Id,
    pub options: Dictionary,
    pub arguments: List,
    pub arguments_keyword: Dictionary,
}

/// One WAMP message of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Hello(HelloMessage),
    Welcome(WelcomeMessage),
    Abort(AbortMessage),
    Challenge(ChallengeMessage),
    Authenticate(AuthenticateMessage),
    Goodbye(GoodbyeMessage),
    Error(ErrorMessage),
    Publish(PublishMessage),
    Published(PublishedMessage),
    Subscribe(SubscribeMessage),
    Subscribed(SubscribedMessage),
    Unsubscribe(UnsubscribeMessage),
    Unsubscribed(UnsubscribedMessage),
    Event(EventMessage),
    Call(CallMessage),
    Result(ResultMessage),
    Register(RegisterMessage),
    Registered(RegisteredMessage),
    Unregister(UnregisterMessage),
    Unregistered(UnregisteredMessage),
    Invocation(InvocationMessage),
    Yield(YieldMessage),
}

impl Message {
    /// The numeric type tag and upper-case name the WAMP standard assigns to
    /// the message kind.
    fn kind(&self) -> (Integer, &'static str) {
        match self {
            Self::Hello(_) => (1, "HELLO"),
            Self::Welcome(_) => (2, "WELCOME"),
            Self::Abort(_) => (3, "ABORT"),
            Self::Challenge(_) => (4, "CHALLENGE"),
            Self::Authenticate(_) => (5, "AUTHENTICATE"),
            Self::Goodbye(_) => (6, "GOODBYE"),
            Self::Error(_) => (8, "ERROR"),
            Self::Publish(_) => (16, "PUBLISH"),
            Self::Published(_) => (17, "PUBLISHED"),
            Self::Subscribe(_) => (32, "SUBSCRIBE"),
            Self::Subscribed(_) => (33, "SUBSCRIBED"),
            Self::Unsubscribe(_) => (34, "UNSUBSCRIBE"),
            Self::Unsubscribed(_) => (35, "UNSUBSCRIBED"),
            Self::Event(_) => (36, "EVENT"),
            Self::Call(_) => (48, "CALL"),
            Self::Result(_) => (50, "RESULT"),
            Self::Register(_) => (64, "REGISTER"),
            Self::Registered(_) => (65, "REGISTERED"),
            Self::Unregister(_) => (66, "UNREGISTER"),
            Self::Unregistered(_) => (67, "UNREGISTERED"),
            Self::Invocation(_) => (68, "INVOCATION"),
            Self::Yield(_) => (70, "YIELD"),
        }
    }

    /// The numeric message type tag.
    pub fn tag(&self) -> Integer {
        self.kind().0
    }

    /// The message name, mostly for logging.
    pub fn message_name(&self) -> &'static str {
        self.kind().1
    }

    /// The ID of the request this message initiates or answers, for kinds
    /// that carry one.
    pub fn request_id(&self) -> Option<Id> {
        let request = match self {
            Self::Error(message) => message.request,
            Self::Publish(message) => message.request,
            Self::Published(message) => message.request,
            Self::Subscribe(message) => message.request,
            Self::Subscribed(message) => message.request,
            Self::Unsubscribe(message) => message.request,
            Self::Unsubscribed(message) => message.request,
            Self::Call(message) => message.request,
            Self::Result(message) => message.request,
            Self::Register(message) => message.request,
            Self::Registered(message) => message.request,
            Self::Unregister(message) => message.request,
            Self::Unregistered(message) => message.request,
            Self::Invocation(message) => message.request,
            Self::Yield(message) => message.request,
            _ => return None,
        };
        Some(request)
    }
}
