pub mod local;
pub mod peer;

pub use local::{
    local_pipe,
    LocalPeer,
};
pub use peer::{
    Peer,
    PeerError,
};
