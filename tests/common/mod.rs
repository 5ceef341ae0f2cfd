#![allow(dead_code)]

use cookie::{Cookie, CookieJar};
use parking_lot::Mutex;
use rucs::{CookieOptions, KeyPair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub(crate) struct TestUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TestSession {
    pub user: TestUser,
    pub preferences: TestPreferences,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub(crate) struct TestPreferences {
    pub theme: String,
    pub language: String,
}

pub fn create_test_session() -> TestSession {
    TestSession {
        user: TestUser {
            id: 1,
            name: "Test User".to_string(),
        },
        preferences: TestPreferences {
            theme: "dark".to_string(),
            language: "en".to_string(),
        },
    }
}

pub fn build_cookie_options() -> CookieOptions {
    CookieOptions::build()
        .http_only(true)
        .same_site(cookie::SameSite::Lax)
        .secure(true)
        .max_age(15)
        .path("/")
}

pub fn signing_pair() -> KeyPair {
    KeyPair::new(b"integration-test-hash-key-000001".to_vec())
}

pub fn encrypting_pair() -> KeyPair {
    KeyPair::new(b"integration-test-hash-key-000002".to_vec())
        .with_block_key(b"integration-test-block-key-00002".to_vec())
}

/// An empty incoming request.
pub fn empty_jar() -> Mutex<CookieJar> {
    Mutex::new(CookieJar::new())
}

/// An incoming request carrying `name=value`.
pub fn jar_with(name: &str, value: &str) -> Mutex<CookieJar> {
    let mut jar = CookieJar::new();
    jar.add_original(Cookie::new(name.to_owned(), value.to_owned()));
    Mutex::new(jar)
}

/// The cookie `name` set on a response, if any.
pub fn issued(jar: &Mutex<CookieJar>, name: &str) -> Option<Cookie<'static>> {
    jar.lock().delta().find(|cookie| cookie.name() == name).cloned()
}

/// A new incoming request replaying the cookie `name` that `jar` issued.
pub fn replay(jar: &Mutex<CookieJar>, name: &str) -> Mutex<CookieJar> {
    let cookie = issued(jar, name).expect("a cookie should have been issued");
    jar_with(name, cookie.value())
}
