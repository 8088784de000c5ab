use reqwest::Method;
use tracing::instrument;

use super::auth::Session;
use super::{fetch, EmptyResponseSnafu, Result, SupabaseClient};
use crate::model::{Event, NewEvent, NewTracker, Tracker, TrackerId};
use crate::prelude::*;

/// Data API of a project, borrowed from [SupabaseClient::rest]. Every call runs
/// as the session's user so row level security applies.
#[derive(Debug, Clone, Copy, new)]
pub struct Rest<'a> {
    client: &'a SupabaseClient,
}

impl Rest<'_> {
    #[instrument(skip_all)]
    pub async fn trackers(&self, session: &Session) -> Result<Vec<Tracker>> {
        let url = self.client.endpoint("rest/v1/trackers")?;
        let request = self
            .client
            .authorized(Method::GET, url.clone(), session)
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        fetch(request, &url).await
    }

    #[instrument(skip(self, session))]
    pub async fn tracker(&self, session: &Session, id: &TrackerId) -> Result<Option<Tracker>> {
        let url = self.client.endpoint("rest/v1/trackers")?;
        let filter = format!("eq.{id}");
        let request = self
            .client
            .authorized(Method::GET, url.clone(), session)
            .query(&[("select", "*"), ("id", filter.as_str())]);

        let trackers: Vec<Tracker> = fetch(request, &url).await?;
        Ok(trackers.into_iter().next())
    }

    #[instrument(skip(self, session))]
    pub async fn create_tracker(&self, session: &Session, tracker: &NewTracker) -> Result<Tracker> {
        let url = self.client.endpoint("rest/v1/trackers")?;
        let request = self
            .client
            .authorized(Method::POST, url.clone(), session)
            .header("Prefer", "return=representation")
            .json(tracker);

        let created: Vec<Tracker> = fetch(request, &url).await?;
        created.into_iter().next().context(EmptyResponseSnafu { url })
    }

    /// Events of a tracker, newest first.
    #[instrument(skip(self, session))]
    pub async fn events(&self, session: &Session, tracker_id: &TrackerId) -> Result<Vec<Event>> {
        let url = self.client.endpoint("rest/v1/events")?;
        let filter = format!("eq.{tracker_id}");
        let request = self
            .client
            .authorized(Method::GET, url.clone(), session)
            .query(&[
                ("select", "*"),
                ("tracker_id", filter.as_str()),
                ("order", "created_at.desc"),
            ]);

        fetch(request, &url).await
    }

    #[instrument(skip(self, session))]
    pub async fn create_event(&self, session: &Session, event: &NewEvent) -> Result<Event> {
        let url = self.client.endpoint("rest/v1/events")?;
        let request = self
            .client
            .authorized(Method::POST, url.clone(), session)
            .header("Prefer", "return=representation")
            .json(event);

        let created: Vec<Event> = fetch(request, &url).await?;
        created.into_iter().next().context(EmptyResponseSnafu { url })
    }
}
