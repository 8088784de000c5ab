//! Pages of the tracker app.
//!
//! - `GET /` lists the user's trackers
//! - `GET|POST /tracker/new` shows the creation form and creates a tracker
//! - `GET|POST /tracker/:id` shows a tracker with its events and records a new event
//! - `GET|POST /auth` and `POST /auth/logout` sign the user in and out
//!
//! Everything except the `/auth` pages sits behind [guard::require_auth].

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod guard;
pub mod login;
pub mod state;
pub mod views;

pub use error::*;
pub use state::{create_app, App};

pub fn create_router(app: App) -> Router {
    let protected = Router::new()
        .route("/", get(views::home))
        .route(
            "/tracker/new",
            get(views::new_tracker).post(views::create_tracker),
        )
        .route("/tracker/:id", get(views::tracker).post(views::record_event))
        .route_layer(middleware::from_fn_with_state(
            app.clone(),
            guard::require_auth,
        ));

    let public = Router::new()
        .route(guard::SIGN_IN_PATH, get(login::form).post(login::sign_in))
        .route("/auth/logout", post(login::sign_out));

    protected
        .merge(public)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app)
}
