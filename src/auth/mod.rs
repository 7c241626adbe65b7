pub mod authenticator;
pub mod identity;

pub use authenticator::{
    Authenticator,
    TicketAuthenticator,
};
pub use identity::Identity;
