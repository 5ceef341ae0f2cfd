//! Session middleware for tower applications.
//!
//! This module provides [`SessionLayer`], which gives every request its own
//! [`Registry`] of sessions backed by a shared [`CacheStore`].

use http::Request;
use tower::{Layer, Service};
use tower_cookies::Cookies;

use crate::cache::CacheClient;
use crate::{CacheStore, Registry};
use std::sync::Arc;
use std::task::{Context, Poll};

/// A Tower Middleware that puts an `Arc<Registry<C>>` in the request extensions.
#[derive(Debug)]
pub struct SessionService<S, C: CacheClient> {
    inner: S,
    store: Arc<CacheStore<C>>,
}

impl<S: Clone, C: CacheClient> Clone for SessionService<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<ReqBody, S, C> Service<Request<ReqBody>> for SessionService<S, C>
where
    S: Service<Request<ReqBody>>,
    C: CacheClient,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        match req.extensions().get::<Cookies>().cloned() {
            Some(cookies) => {
                let registry = Registry::new(Arc::clone(&self.store), cookies);
                req.extensions_mut().insert(Arc::new(registry));
            }
            None => {
                tracing::error!("cookies not found in the request extensions");
            }
        }

        self.inner.call(req)
    }
}

/// Layer to apply [`SessionService`] middleware.
///
/// # Example
///
/// ```rust
/// use rucs::{CacheStore, KeyPair, SessionLayer};
/// use rucs::cache::MemoryCache;
/// use std::sync::Arc;
///
/// let store = CacheStore::new(
///     Arc::new(MemoryCache::new()),
///     "sess_",
///     &[KeyPair::new(b"hash-key".to_vec())],
/// )
/// .unwrap();
/// let session_layer = SessionLayer::new(Arc::new(store));
/// ```
#[derive(Debug)]
pub struct SessionLayer<C: CacheClient> {
    store: Arc<CacheStore<C>>,
}

impl<C: CacheClient> Clone for SessionLayer<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<C> SessionLayer<C>
where
    C: CacheClient,
{
    /// Create a new session layer around a fully configured store.
    pub fn new(store: Arc<CacheStore<C>>) -> Self {
        Self { store }
    }
}

impl<S, C> Layer<S> for SessionLayer<C>
where
    C: CacheClient,
{
    type Service = SessionService<S, C>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            store: Arc::clone(&self.store),
        }
    }
}
