use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::cache::CacheClient;
use crate::{CacheStore, CookieTransport, Error, Session};

/// A session shared between the handlers of one request.
pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    error: Option<Arc<Error>>,
}

/// The sessions of a single request.
///
/// A session is loaded from the store the first time it is asked for; later
/// calls for the same name hand out the same instance and the same load error.
/// Sessions with different names load independently.
pub struct Registry<C: CacheClient> {
    store: Arc<CacheStore<C>>,
    cookies: Box<dyn CookieTransport>,
    sessions: parking_lot::Mutex<HashMap<String, Arc<OnceCell<Entry>>>>,
}

impl<C: CacheClient> Registry<C> {
    pub fn new(store: Arc<CacheStore<C>>, cookies: impl CookieTransport + 'static) -> Self {
        Self {
            store,
            cookies: Box::new(cookies),
            sessions: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<CacheStore<C>> {
        &self.store
    }

    /// Returns the session `name`, loading it on first use.
    ///
    /// The error, if any, is the one [`CacheStore::new_session`] reported when
    /// the session was loaded.
    pub async fn get(&self, name: &str) -> (SharedSession, Option<Arc<Error>>) {
        let cell = Arc::clone(self.sessions.lock().entry(name.to_owned()).or_default());

        let entry = cell
            .get_or_init(|| async {
                let (session, error) = self.store.new_session(&*self.cookies, name).await;
                Entry {
                    session: Arc::new(Mutex::new(session)),
                    error: error.map(Arc::new),
                }
            })
            .await;

        (Arc::clone(&entry.session), entry.error.clone())
    }

    /// Saves one session of this request.
    pub async fn save(&self, session: &mut Session) -> Result<(), Error> {
        self.store.save(&*self.cookies, session).await
    }

    /// Destroys one session of this request.
    pub async fn destroy(&self, session: &mut Session) -> Result<(), Error> {
        self.store.destroy(&*self.cookies, session).await
    }

    /// Saves every session loaded through this registry.
    ///
    /// All sessions are attempted; the first error is returned. A session whose
    /// guard is still held elsewhere is not saved and reported as
    /// [`Error::Busy`].
    pub async fn save_all(&self) -> Result<(), Error> {
        let sessions: Vec<(String, SharedSession)> = self
            .sessions
            .lock()
            .iter()
            .filter_map(|(name, cell)| Some((name.clone(), Arc::clone(&cell.get()?.session))))
            .collect();

        let mut first_error = None;
        for (name, session) in sessions {
            let result = match session.try_lock() {
                Ok(mut session) => self.save(&mut session).await,
                Err(_) => {
                    tracing::warn!(session = %name, "session is still in use, not saving it");
                    Err(Error::Busy(name))
                }
            };

            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<C: CacheClient> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
