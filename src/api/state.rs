use axum_template::engine::Engine;
use derive_new::new;
use snafu::OptionExt as _;
use tera::Tera;

use super::error::{ApiError, UnconfiguredSnafu};
use crate::supabase::SupabaseClient;

pub type Templates = Engine<Tera>;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../../templates/base.html")),
    ("home.html", include_str!("../../templates/home.html")),
    ("new_tracker.html", include_str!("../../templates/new_tracker.html")),
    ("tracker.html", include_str!("../../templates/tracker.html")),
    ("auth.html", include_str!("../../templates/auth.html")),
];

#[derive(Clone, new)]
pub struct App {
    pub supabase: Option<SupabaseClient>,
    pub templates: Templates,
}

impl App {
    pub fn supabase(&self) -> Option<&SupabaseClient> {
        self.supabase.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.supabase.is_some()
    }

    /// The backend client, or [ApiError::Unconfigured] for views that cannot work
    /// without one.
    pub fn client(&self) -> Result<&SupabaseClient, ApiError> {
        self.supabase().context(UnconfiguredSnafu)
    }
}

pub fn create_app(supabase: Option<SupabaseClient>) -> Result<App, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES)?;

    Ok(App::new(supabase, Engine::from(tera)))
}
