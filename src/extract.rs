use std::fmt;
use std::sync::Arc;

use axum_core::extract::FromRequestParts;
use http::{StatusCode, request::Parts};

use crate::cache::CacheClient;
use crate::registry::SharedSession;
use crate::{Error, Registry, Session};

/// Axum extractor for the sessions of the current request.
///
/// Requires [`SessionLayer`](crate::SessionLayer) and, outside of it,
/// `tower_cookies::CookieManagerLayer`.
pub struct Sessions<C: CacheClient> {
    registry: Arc<Registry<C>>,
}

impl<C: CacheClient> Clone for Sessions<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<C: CacheClient> fmt::Debug for Sessions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sessions")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<C: CacheClient> Sessions<C> {
    /// See [`Registry::get`].
    pub async fn get(&self, name: &str) -> (SharedSession, Option<Arc<Error>>) {
        self.registry.get(name).await
    }

    /// See [`Registry::save`].
    pub async fn save(&self, session: &mut Session) -> Result<(), Error> {
        self.registry.save(session).await
    }

    /// See [`Registry::save_all`].
    pub async fn save_all(&self) -> Result<(), Error> {
        self.registry.save_all().await
    }

    /// See [`Registry::destroy`].
    pub async fn destroy(&self, session: &mut Session) -> Result<(), Error> {
        self.registry.destroy(session).await
    }
}

impl<S, C> FromRequestParts<S> for Sessions<C>
where
    S: Send + Sync,
    C: CacheClient,
{
    type Rejection = (StatusCode, &'static str);

    #[tracing::instrument(name = "sessions", skip(parts, _state))]
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let registry = parts
            .extensions
            .get::<Arc<Registry<C>>>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("session registry not found in the request extensions");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "session registry not found in the request extensions",
                )
            })?;

        Ok(Self { registry })
    }
}
