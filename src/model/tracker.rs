use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub name: String,
    pub created_at: Timestamp,
    pub user_id: UserId,
    /// Schema shared by every event recorded under this tracker.
    #[serde(default)]
    pub fields: Vec<TrackerField>,
}

impl Tracker {
    pub fn field(&self, name: &str) -> Option<&TrackerField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct TrackerField {
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub name: String,
}

/// How the value of a [TrackerField] should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Date,
    Datetime,
    Text,
}

impl FieldType {
    pub const ALL: [FieldType; 3] = [FieldType::Date, FieldType::Datetime, FieldType::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Text => "text",
        }
    }

    /// The HTML `<input type>` used to collect a value of this type.
    pub fn input_type(self) -> &'static str {
        match self {
            FieldType::Date => "date",
            FieldType::Datetime => "datetime-local",
            FieldType::Text => "text",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == input)
            .ok_or_else(|| UnknownFieldType {
                text: input.to_owned(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, snafu::Snafu)]
#[snafu(display("unknown field type '{text}', expected one of date, datetime, text"))]
pub struct UnknownFieldType {
    pub text: String,
}

/// Payload for inserting a tracker; the backend assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, new)]
pub struct NewTracker {
    pub name: String,
    pub user_id: UserId,
    pub fields: Vec<TrackerField>,
}
