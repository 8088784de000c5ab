//! Helpers shared by the test modules: sessions, backend rows and a throwaway
//! HTTP server standing in for the hosted backend.

use axum::http::HeaderValue;
use axum::Router;
use axum_extra::extract::cookie::Cookie;
use serde_json::{json, Value};
use url::Url;

use crate::model::now;
use crate::supabase::auth::Session;
use crate::supabase::{AuthOptions, SupabaseClient, STORAGE_KEY};

pub(crate) const USER_ID: &str = "2b7e1516-28ae-4d2a-a6ab-f7158809cf4f";

pub(crate) fn far_future() -> i64 {
    now().unix() + 3600
}

pub(crate) fn session_json(access_token: &str, expires_at: Option<i64>) -> Value {
    let mut session = json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{access_token}"),
        "user": { "id": USER_ID, "email": "ada@example.com", "role": "authenticated" }
    });

    if let Some(expires_at) = expires_at {
        session["expires_at"] = json!(expires_at);
    }

    session
}

pub(crate) fn session(access_token: &str, expires_at: i64) -> Session {
    serde_json::from_value(session_json(access_token, Some(expires_at))).unwrap()
}

/// A `Cookie` request header carrying the session the way the browser stores it.
pub(crate) fn session_cookie(session: &Session) -> HeaderValue {
    let value = serde_json::to_string(session).unwrap();
    let cookie = Cookie::new(STORAGE_KEY, value);
    HeaderValue::from_str(&cookie.encoded().to_string()).unwrap()
}

pub(crate) fn tracker_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "created_at": "2024-05-02T08:15:00+00:00",
        "user_id": USER_ID,
        "fields": [
            { "type": "date", "name": "day" },
            { "type": "text", "name": "notes" }
        ]
    })
}

pub(crate) fn event_json(id: &str, tracker_id: &str, data: Value) -> Value {
    json!({
        "id": id,
        "tracker_id": tracker_id,
        "created_at": "2024-05-03T10:00:00+00:00",
        "user_id": USER_ID,
        "data": data
    })
}

pub(crate) fn client_with(url: Url, options: AuthOptions) -> SupabaseClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    SupabaseClient::with_http(url, "anon", options, http)
}

pub(crate) fn client(url: Url) -> SupabaseClient {
    client_with(url, AuthOptions::default())
}

/// A client pointing at a local port nothing listens on.
pub(crate) fn unreachable_client() -> SupabaseClient {
    client(Url::parse("http://127.0.0.1:9/").unwrap())
}

/// Serves `router` on a random local port for the rest of the test.
pub(crate) async fn spawn_backend(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Url::parse(&format!("http://{address}/")).unwrap()
}
