use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect};
use axum::Extension;
use axum_extra::extract::Form;
use axum_template::RenderHtml;
use serde_json::Value;
use snafu::ensure;
use tracing::instrument;

use super::error::{
    BackendSnafu, DuplicateFieldSnafu, InvalidFieldTypeSnafu, MissingNameSnafu, Result,
    TrackerNotFoundSnafu,
};
use super::state::App;
use crate::prelude::*;

#[derive(Debug, Serialize)]
struct HomeView {
    email: Option<String>,
    trackers: Vec<Tracker>,
}

#[instrument(skip_all)]
pub async fn home(
    State(app): State<App>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    let trackers = app
        .client()?
        .rest()
        .trackers(&session)
        .await
        .context(BackendSnafu)?;

    let view = HomeView {
        email: session.user.email,
        trackers,
    };

    Ok(RenderHtml("home.html", app.templates, view))
}

#[derive(Debug, Serialize)]
struct NewTrackerView {
    field_types: Vec<&'static str>,
}

pub async fn new_tracker(State(app): State<App>) -> impl IntoResponse {
    let view = NewTrackerView {
        field_types: FieldType::ALL.iter().map(|kind| kind.as_str()).collect(),
    };

    RenderHtml("new_tracker.html", app.templates, view)
}

/// Tracker creation form. Field names and types arrive as parallel repeated
/// inputs.
#[derive(Debug, Deserialize)]
pub struct CreateTracker {
    pub name: String,
    #[serde(default)]
    pub field_name: Vec<String>,
    #[serde(default)]
    pub field_type: Vec<String>,
}

impl CreateTracker {
    /// Pairs up the repeated inputs, skipping rows without a name. Field names
    /// key the event data, so each may appear only once.
    pub fn fields(&self) -> Result<Vec<TrackerField>> {
        let mut seen = HashSet::new();

        self.field_name
            .iter()
            .zip(&self.field_type)
            .map(|(name, kind)| (name.trim(), kind))
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, kind)| -> Result<TrackerField> {
                ensure!(seen.insert(name), DuplicateFieldSnafu { name });
                let kind = kind.parse::<FieldType>().context(InvalidFieldTypeSnafu)?;
                Ok(TrackerField::new(kind, name.to_owned()))
            })
            .collect()
    }
}

#[instrument(skip(app, session))]
pub async fn create_tracker(
    State(app): State<App>,
    Extension(session): Extension<Session>,
    Form(form): Form<CreateTracker>,
) -> Result<Redirect> {
    let name = form.name.trim();
    if name.is_empty() {
        return MissingNameSnafu.fail();
    }

    let payload = NewTracker::new(name.to_owned(), session.user.id.clone(), form.fields()?);
    let tracker = app
        .client()?
        .rest()
        .create_tracker(&session, &payload)
        .await
        .context(BackendSnafu)?;

    tracing::info!(tracker = %tracker.id, "created tracker '{}'", tracker.name);
    Ok(Redirect::to(&format!("/tracker/{}", tracker.id)))
}

#[derive(Debug, Serialize)]
struct TrackerView {
    tracker: Tracker,
    fields: Vec<FieldView>,
    events: Vec<EventView>,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: String,
    kind: FieldType,
    input_type: &'static str,
}

#[derive(Debug, Serialize)]
struct EventView {
    created_at: String,
    values: Vec<String>,
}

impl EventView {
    /// Lays the event's values out in the tracker's field order.
    fn new(tracker: &Tracker, event: &Event) -> Self {
        let values = tracker
            .fields
            .iter()
            .map(|field| event.data.get(&field.name).map(display_value).unwrap_or_default())
            .collect();

        Self {
            created_at: event.created_at.to_string(),
            values,
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[instrument(skip(app, session))]
pub async fn tracker(
    State(app): State<App>,
    Extension(session): Extension<Session>,
    Path(id): Path<TrackerId>,
) -> Result<impl IntoResponse> {
    let rest = app.client()?.rest();

    let tracker = rest
        .tracker(&session, &id)
        .await
        .context(BackendSnafu)?
        .context(TrackerNotFoundSnafu { id: id.clone() })?;

    let events = rest.events(&session, &id).await.context(BackendSnafu)?;

    let view = TrackerView {
        fields: tracker
            .fields
            .iter()
            .map(|field| FieldView {
                name: field.name.clone(),
                kind: field.kind,
                input_type: field.kind.input_type(),
            })
            .collect(),
        events: events.iter().map(|event| EventView::new(&tracker, event)).collect(),
        tracker,
    };

    Ok(RenderHtml("tracker.html", app.templates.clone(), view))
}

/// Keeps the submitted values of the tracker's own fields, dropping blank inputs.
/// When a name was submitted more than once the first non-blank value wins.
fn event_data(tracker: &Tracker, form: &[(String, String)]) -> EventData {
    tracker
        .fields
        .iter()
        .filter_map(|field| {
            let value = form
                .iter()
                .filter(|(name, _)| *name == field.name)
                .map(|(_, value)| value.trim())
                .find(|value| !value.is_empty())?;

            Some((field.name.clone(), Value::String(value.to_owned())))
        })
        .collect()
}

#[instrument(skip(app, session, form))]
pub async fn record_event(
    State(app): State<App>,
    Extension(session): Extension<Session>,
    Path(id): Path<TrackerId>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Redirect> {
    let rest = app.client()?.rest();

    let tracker = rest
        .tracker(&session, &id)
        .await
        .context(BackendSnafu)?
        .context(TrackerNotFoundSnafu { id: id.clone() })?;

    let payload = NewEvent::new(id.clone(), session.user.id.clone(), event_data(&tracker, &form));
    let event = rest
        .create_event(&session, &payload)
        .await
        .context(BackendSnafu)?;

    tracing::info!(tracker = %id, event = %event.id, "recorded event");
    Ok(Redirect::to(&format!("/tracker/{id}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::error::ApiError;
    use crate::test_support::tracker_json;

    fn tracker() -> Tracker {
        serde_json::from_value(tracker_json("t1", "Runs")).unwrap()
    }

    #[test]
    fn form_fields_pair_up_and_skip_blank_names() {
        let form = CreateTracker {
            name: "Runs".into(),
            field_name: vec!["day".into(), "  ".into(), "notes".into()],
            field_type: vec!["date".into(), "text".into(), "text".into()],
        };

        assert_eq!(
            form.fields().unwrap(),
            vec![
                TrackerField::new(FieldType::Date, "day".into()),
                TrackerField::new(FieldType::Text, "notes".into()),
            ]
        );
    }

    #[test]
    fn form_rejects_unknown_field_type() {
        let form = CreateTracker {
            name: "Runs".into(),
            field_name: vec!["distance".into()],
            field_type: vec!["number".into()],
        };

        let err = form.fields().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn form_rejects_repeated_field_names() {
        let form = CreateTracker {
            name: "Runs".into(),
            field_name: vec!["day".into(), " day ".into()],
            field_type: vec!["date".into(), "text".into()],
        };

        let err = form.fields().unwrap_err();
        assert!(matches!(err, ApiError::DuplicateField { ref name, .. } if name == "day"));
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    fn pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn event_data_keeps_declared_non_blank_fields() {
        let form = pairs(&[("day", "2024-05-03"), ("notes", "   "), ("injected", "value")]);

        let data = event_data(&tracker(), &form);

        assert_eq!(Value::Object(data), json!({ "day": "2024-05-03" }));
    }

    #[test]
    fn event_data_takes_first_non_blank_repeated_value() {
        let form = pairs(&[("notes", ""), ("day", "2024-05-03"), ("notes", "easy"), ("notes", "hard")]);

        let data = event_data(&tracker(), &form);

        assert_eq!(Value::Object(data), json!({ "day": "2024-05-03", "notes": "easy" }));
    }

    #[test]
    fn event_values_follow_field_order() {
        let event: Event = serde_json::from_value(crate::test_support::event_json(
            "e1",
            "t1",
            json!({ "notes": "easy", "day": "2024-05-03", "pace": 5.5 }),
        ))
        .unwrap();

        let view = EventView::new(&tracker(), &event);
        assert_eq!(view.values, ["2024-05-03", "easy"]);
    }

    #[test]
    fn non_text_values_are_displayed_as_json() {
        assert_eq!(display_value(&json!(5.5)), "5.5");
        assert_eq!(display_value(&json!(null)), "");
        assert_eq!(display_value(&json!("plain")), "plain");
    }
}
