use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::{CookieJar, Form};
use axum_template::RenderHtml;
use tracing::instrument;

use super::state::App;
use crate::prelude::*;

#[derive(Debug, Serialize, new)]
struct AuthView {
    configured: bool,
    email: Option<String>,
    error: Option<String>,
}

pub async fn form(State(app): State<App>) -> impl IntoResponse {
    let view = AuthView::new(app.is_configured(), None, None);
    RenderHtml("auth.html", app.templates, view)
}

#[derive(Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignIn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignIn")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[instrument(skip(app, jar))]
pub async fn sign_in(
    State(app): State<App>,
    jar: CookieJar,
    Form(form): Form<SignIn>,
) -> Response {
    let Some(client) = app.supabase() else {
        let view = AuthView::new(false, Some(form.email), None);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            RenderHtml("auth.html", app.templates.clone(), view),
        )
            .into_response();
    };

    let mut storage = CookieStorage::new(jar);
    let result = client
        .auth()
        .sign_in_with_password(&mut storage, &form.email, &form.password)
        .await;

    match result {
        Ok(_session) => (storage.into_jar(), Redirect::to("/")).into_response(),
        Err(err) => {
            tracing::info!(error = %err, "sign in failed");
            let status = if err.is_rejected() {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::BAD_GATEWAY
            };
            let message = match &err {
                SupabaseError::Rejected { message, .. } => message.clone(),
                _ => "the sign in service is unreachable, try again later".to_owned(),
            };

            let view = AuthView::new(true, Some(form.email), Some(message));
            (
                status,
                RenderHtml("auth.html", app.templates.clone(), view),
            )
                .into_response()
        }
    }
}

#[instrument(skip_all)]
pub async fn sign_out(State(app): State<App>, jar: CookieJar) -> Response {
    let Some(client) = app.supabase() else {
        return Redirect::to("/auth").into_response();
    };

    let mut storage = CookieStorage::new(jar);
    if let Err(err) = client.auth().sign_out(&mut storage).await {
        tracing::warn!(error = %err, "could not revoke the session, it was removed locally");
    }

    (storage.into_jar(), Redirect::to("/auth")).into_response()
}
