//! # wamp-router
//!
//! **wamp-router** is the core routing engine of a **Web Application
//! Messaging Protocol** (WAMP) router: realm session admission and pub/sub
//! event brokering.
//!
//! The crate deliberately stops at the transport boundary. Peers are
//! presented to the router as [`Peer`][`crate::peer::Peer`] trait objects,
//! each a bidirectional channel of typed
//! [`Message`][`crate::message::message::Message`]s, so WebSocket or
//! raw-socket framing and JSON/MessagePack serialization live in the
//! embedding host. The RPC (dealer) side of a realm is likewise consumed only
//! through the [`Dealer`][`crate::router::Dealer`] interface.
//!
//! The library uses [`tokio`](https://tokio.rs) as its asynchronous runtime.
//! Each accepted session runs its message loop in its own task; the broker's
//! routing tables are shared across all sessions of a realm.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use wamp_router::{
//!     core::{
//!         types::Dictionary,
//!         uri::Uri,
//!     },
//!     router::{
//!         RealmConfig,
//!         Router,
//!         RouterConfig,
//!         StandardRealm,
//!     },
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = Arc::new(Router::new(RouterConfig::default()));
//!     let realm_uri = Uri::try_from("com.example.realm")?;
//!     router
//!         .register_realm(
//!             realm_uri.clone(),
//!             Arc::new(StandardRealm::new(RealmConfig {
//!                 name: "example".to_owned(),
//!                 uri: realm_uri.clone(),
//!             })),
//!         )
//!         .await?;
//!
//!     // A transport layer hands each accepted connection to the router:
//!     //
//!     //     router.accept(peer).await?;
//!     //
//!     // In-process components can join a realm directly, bypassing the
//!     // handshake.
//!     let _peer = router.local_peer(&realm_uri, Dictionary::default()).await?;
//!
//!     router.close().await?;
//!     Ok(())
//! }
//! ```
pub mod auth;
pub mod core;
pub mod message;
pub mod peer;
pub mod router;
