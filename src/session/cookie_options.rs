use cookie::time::{Duration, OffsetDateTime};
use cookie::{Cookie, SameSite};

/// Default cookie lifetime: 30 days.
pub const DEFAULT_MAX_AGE: i64 = 86400 * 30;

/// Attributes of the session cookie.
///
/// `max_age` follows the usual session conventions: a positive value sets both
/// `Max-Age` and `Expires`, a negative value removes the cookie and `0` makes
/// it a browser-session cookie.
///
/// # Example
///
/// ```rust
/// use rucs::CookieOptions;
///
/// let cookie_options = CookieOptions::build()
///         .http_only(true)
///         .same_site(cookie::SameSite::Lax)
///         .secure(true)
///         .max_age(60 * 60)
///         .path("/");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<&'static str>,
    pub domain: Option<&'static str>,
    pub max_age: i64,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/"),
            domain: None,
            max_age: DEFAULT_MAX_AGE,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

impl CookieOptions {
    /// Creates a new `CookieOptions` with default values.
    pub fn build() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: &'static str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn domain(mut self, domain: &'static str) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = seconds;
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Builds the `Set-Cookie` for `name` carrying `value`.
    pub(crate) fn to_cookie(self, name: String, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .secure(self.secure)
            .http_only(self.http_only);

        if let Some(path) = self.path {
            builder = builder.path(path);
        }

        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }

        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }

        builder = match self.max_age {
            0 => builder,
            // Expires is left out when it falls past the largest representable date.
            seconds if seconds > 0 => {
                let max_age = Duration::seconds(seconds);
                match OffsetDateTime::now_utc().checked_add(max_age) {
                    Some(expires) => builder.max_age(max_age).expires(expires),
                    None => builder.max_age(max_age),
                }
            }
            _ => builder
                .max_age(Duration::ZERO)
                .expires(OffsetDateTime::UNIX_EPOCH),
        };

        builder.build()
    }
}
