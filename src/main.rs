use dotenvy::dotenv;
use snafu::ResultExt;

use tally::config::Config;
use tally::error::{ApplicationError, BindAddressSnafu, LoadTemplatesSnafu, WebServerSnafu};
use tally::{api, logger, supabase};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    if !supabase::is_supabase_configured() {
        tracing::warn!("SUPABASE_URL or SUPABASE_ANON_KEY is not set, every protected page will redirect to /auth");
    }

    let app = api::create_app(supabase::supabase().cloned()).context(LoadTemplatesSnafu)?;
    let router = api::create_router(app);

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!("listening on http://{}", config.host);
    axum::serve(listener, router).await.context(WebServerSnafu)
}
