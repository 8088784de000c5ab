use serde_json::{Map, Value};

use super::*;

/// Field values keyed by field name. Keys are expected to match the owning
/// tracker's fields but nothing here checks that.
pub type EventData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    pub id: EventId,
    pub tracker_id: TrackerId,
    pub created_at: Timestamp,
    pub user_id: UserId,
    #[serde(default)]
    pub data: EventData,
}

/// Payload for recording an event; the backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct NewEvent {
    pub tracker_id: TrackerId,
    pub user_id: UserId,
    pub data: EventData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_data_accepts_arbitrary_values() {
        let row = json!({
            "id": "e1",
            "tracker_id": "t1",
            "created_at": "2024-05-02T08:15:00Z",
            "user_id": "u1",
            "data": { "started": "2024-05-02T07:00", "severity": 7, "tags": ["a", "b"], "extra": null }
        });

        let event: Event = serde_json::from_value(row).unwrap();
        assert_eq!(event.tracker_id, TrackerId::from("t1"));
        assert_eq!(event.data.get("severity"), Some(&json!(7)));
        assert_eq!(event.data.get("extra"), Some(&Value::Null));
        assert_eq!(event.data.len(), 4);
    }

    #[test]
    fn new_event_omits_backend_assigned_columns() {
        let mut data = EventData::new();
        data.insert("notes".into(), json!("fine"));

        let payload = NewEvent::new("t1".into(), "u1".into(), data);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "tracker_id": "t1", "user_id": "u1", "data": { "notes": "fine" } })
        );
    }
}
