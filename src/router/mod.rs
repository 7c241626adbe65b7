mod broker;
mod dealer;
mod realm;
mod router;
mod session;

pub use broker::{
    Broker,
    StandardBroker,
};
pub use dealer::{
    Dealer,
    NullDealer,
};
pub use realm::{
    Realm,
    RealmConfig,
    StandardRealm,
};
pub use router::{
    Router,
    RouterConfig,
    SessionCallback,
};
pub use session::{
    Session,
    SessionHandle,
};
