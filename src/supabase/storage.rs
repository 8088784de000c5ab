use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;

/// Key/value storage the auth client persists sessions into.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: String);

    fn remove_item(&mut self, key: &str);
}

/// How long the browser keeps a stored session cookie.
const COOKIE_MAX_AGE: time::Duration = time::Duration::days(30);

/// Stores items as cookies of the current request. The jar has to be handed
/// back to the response with [CookieStorage::into_jar] for changes to reach
/// the browser.
#[derive(Debug, Clone, Default)]
pub struct CookieStorage {
    jar: CookieJar,
}

impl CookieStorage {
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl SessionStorage for CookieStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_owned())
    }

    fn set_item(&mut self, key: &str, value: String) {
        let cookie = Cookie::build((key.to_owned(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(COOKIE_MAX_AGE);

        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }

    fn remove_item(&mut self, key: &str) {
        let cookie = Cookie::build((key.to_owned(), "")).path("/");
        self.jar = std::mem::take(&mut self.jar).remove(cookie);
    }
}

/// In-process storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|item| item.value().clone())
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_owned(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}
