use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use super::state::App;
use crate::supabase::storage::CookieStorage;

pub const SIGN_IN_PATH: &str = "/auth";

/// Lets the request through only when the backend reports an active session,
/// otherwise redirects to the sign in page.
///
/// The session is looked up on every request and handed to the protected
/// handler as an `Extension<Session>`. A session refreshed during the lookup is
/// written back through the response cookies.
pub async fn require_auth(
    State(app): State<App>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(client) = app.supabase() else {
        tracing::debug!(path = %request.uri().path(), "no backend configured, redirecting to sign in");
        return Redirect::to(SIGN_IN_PATH).into_response();
    };

    let mut storage = CookieStorage::new(jar);
    let session = match client.auth().get_session(&mut storage).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "session lookup failed, treating the request as signed out");
            None
        }
    };
    let jar = storage.into_jar();

    let Some(session) = session else {
        tracing::debug!(path = %request.uri().path(), "no active session, redirecting to sign in");
        return (jar, Redirect::to(SIGN_IN_PATH)).into_response();
    };

    request.extensions_mut().insert(session);
    (jar, next.run(request).await).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::{header, StatusCode};
    use axum::routing::{get, post};
    use axum::{middleware, Extension, Json, Router};
    use axum_test::TestServer;
    use serde_json::json;

    use super::*;
    use crate::api::create_app;
    use crate::model::now;
    use crate::supabase::auth::Session;
    use crate::supabase::SupabaseClient;
    use crate::test_support::{
        client, far_future, session, session_cookie, session_json, spawn_backend,
        unreachable_client,
    };

    /// A guarded route that counts how often the protected handler runs.
    fn guarded(supabase: Option<SupabaseClient>, hits: Arc<AtomicUsize>) -> TestServer {
        let app = create_app(supabase).unwrap();
        let router = Router::new()
            .route(
                "/secret",
                get(move |Extension(session): Extension<Session>| {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        session.access_token
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(app.clone(), require_auth))
            .with_state(app);

        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn redirect_without_session() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(unreachable_client()), hits.clone());

        let response = server.get("/secret").await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/auth");
        assert_eq!(hits.load(Ordering::SeqCst), 0, "protected handler must not run");
    }

    #[tokio::test]
    async fn proceed_with_session() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(unreachable_client()), hits.clone());

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&session("valid", far_future())))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "valid");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn redirect_without_backend() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(None, hits.clone());

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&session("valid", far_future())))
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/auth");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn redirect_with_out_of_range_expiry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(unreachable_client()), hits.clone());

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&session("forged", i64::MIN)))
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/auth");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn redirect_when_stored_session_has_no_expiry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(unreachable_client()), hits.clone());

        let mut forged = session("forged", far_future());
        forged.expires_at = None;

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&forged))
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/auth");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn check_runs_on_every_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(unreachable_client()), hits.clone());
        let cookie = session_cookie(&session("valid", far_future()));

        let first = server.get("/secret").add_header(header::COOKIE, cookie).await;
        let second = server.get("/secret").await;

        assert_eq!(first.status_code(), StatusCode::OK);
        assert_eq!(second.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_redirects_and_clears_cookie() {
        let backend = Router::new().route(
            "/auth/v1/token",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error_description": "Invalid Refresh Token" })),
                )
            }),
        );
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(client(spawn_backend(backend).await)), hits.clone());

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&session("old", now().unix() - 10)))
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(response.header(header::LOCATION), "/auth");
        let set_cookie = response.header(header::SET_COOKIE);
        assert!(set_cookie.to_str().unwrap().starts_with("tracker-auth=;"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refreshed_session_reaches_handler_and_cookie() {
        let backend = Router::new().route(
            "/auth/v1/token",
            post(|| async { Json(session_json("fresh", None)) }),
        );
        let hits = Arc::new(AtomicUsize::new(0));
        let server = guarded(Some(client(spawn_backend(backend).await)), hits.clone());

        let response = server
            .get("/secret")
            .add_header(header::COOKIE, session_cookie(&session("old", now().unix() - 10)))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "fresh");
        let set_cookie = response.header(header::SET_COOKIE);
        assert!(set_cookie.to_str().unwrap().starts_with("tracker-auth="));
        assert!(set_cookie.to_str().unwrap().contains("fresh"));
    }
}
