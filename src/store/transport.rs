use cookie::{Cookie, CookieJar};
use parking_lot::Mutex;
use tower_cookies::Cookies;

/// Where the store reads the incoming session cookie and writes the outgoing one.
pub trait CookieTransport: Send + Sync {
    fn get_cookie(&self, name: &str) -> Option<Cookie<'static>>;

    fn set_cookie(&self, cookie: Cookie<'static>);
}

impl CookieTransport for Cookies {
    fn get_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.get(name).map(Cookie::into_owned)
    }

    fn set_cookie(&self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}

/// A plain jar, for callers that handle headers themselves: seed it with
/// [`CookieJar::add_original`] and read the outgoing cookies from
/// [`CookieJar::delta`].
impl CookieTransport for Mutex<CookieJar> {
    fn get_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.lock().get(name).cloned()
    }

    fn set_cookie(&self, cookie: Cookie<'static>) {
        self.lock().add(cookie);
    }
}
