//! # Rucs: cache-backed sessions with authenticated cookies
//!
//! `rucs` keeps web-session values in a shared cache (Redis, or anything that
//! implements [`cache::CacheClient`]) and gives the browser nothing but the
//! session id, signed and optionally encrypted, in a cookie.
//!
//! A session lives under `<key_prefix><id>` in the cache. The id is 32 random
//! bytes in unpadded base32. Cookies and cache payloads both go through an
//! ordered list of [`codec::Codec`]s: the first one encodes, all of them are
//! tried when decoding, which is how keys are rotated.
//!
//! # Quick Start
//!
//! Here's a basic example with [Axum](https://docs.rs/axum/latest/axum/) and the
//! in-process [`cache::MemoryCache`]. With the `redis-cache` feature, swap in a
//! [`cache::RedisCache`].
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use rucs::{CacheStore, KeyPair, Sessions, SessionLayer};
//! use rucs::cache::MemoryCache;
//! use std::sync::Arc;
//! use tower_cookies::CookieManagerLayer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = CacheStore::new(
//!         Arc::new(MemoryCache::new()),
//!         "sess_",
//!         &[KeyPair::new(b"a-32-byte-or-longer-hash-key....".to_vec())
//!             .with_block_key(b"a-32-byte-encryption-key........".to_vec())],
//!     )
//!     .unwrap();
//!
//!     let app = Router::new()
//!         .route("/", get(handler))
//!         .layer(SessionLayer::new(Arc::new(store)))
//!         .layer(CookieManagerLayer::new()); // CookieManagerLayer must be after
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//!
//! async fn handler(sessions: Sessions<MemoryCache>) -> String {
//!     let (session, _) = sessions.get("session").await;
//!     let mut session = session.lock().await;
//!
//!     let count = session.get::<u32>("count").unwrap().unwrap_or(0) + 1;
//!     session.insert("count", &count).unwrap();
//!     sessions.save(&mut session).await.unwrap();
//!
//!     format!("You've visited this page {} times", count)
//! }
//! ```
//!
//! # Without a framework
//!
//! [`CacheStore::new_session`] and [`CacheStore::save`] work on anything that
//! implements [`CookieTransport`], including a `parking_lot::Mutex<cookie::CookieJar>`.
//!
//! ## Serialization
//! Session values are serialized with one of:
//!
//! - [`bincode`](https://crates.io/crates/bincode) (default)
//! - [`rmp-serde`](https://crates.io/crates/rmp-serde) (MessagePack), with
//!   `default-features = false, features = ["axum", "messagepack"]`.
//!
//! # Important Notes
//!
//! ## Middleware Ordering
//! The `SessionLayer` must be applied **before** the `CookieManagerLayer`, so
//! that the cookie manager wraps it.
//!
//! ## Store configuration
//! [`CacheStore::set_max_length`] and [`CacheStore::set_max_age`] take
//! `&mut self`: configure the store completely before sharing it.

pub use cookie;

pub mod cache;
pub mod codec;

#[cfg(feature = "axum")]
mod extract;
#[cfg(feature = "axum")]
pub use extract::Sessions;

#[cfg(feature = "redis-cache")]
pub use fred;

mod registry;
pub use registry::{Registry, SharedSession};

mod service;
pub use service::*;

mod session;
pub use session::*;

mod store;
pub use store::{CacheStore, CookieTransport, Error, StoreBuilder};

pub use codec::KeyPair;

pub use tower_cookies;
