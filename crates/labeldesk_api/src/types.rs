//! Wire types, shaped exactly as the backend serializes them.
//!
//! These are deliberately dumb: no validation, no geometry. The editor
//! converts them into its own model types at the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend row identifier.
pub type DbId = i64;

/// One dataset item (`GET /api/datasets/{id}/items`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDto {
    pub id: DbId,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub split: String,
}

/// A project label class (`GET /api/projects/{id}/classes`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelClassDto {
    pub id: DbId,
    pub name: String,
    /// `#rrggbb`
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub order_index: i32,
}

/// Free-form attributes stored next to an annotation.
///
/// `note` and `polygon` are the keys the editor writes; anything else the
/// backend or another client stored is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Flattened `x, y` pairs in image pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnnotationAttributes {
    /// True when nothing would be serialized.
    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.polygon.is_none() && self.extra.is_empty()
    }
}

/// One annotation as sent by `GET` and accepted by `PUT .../annotations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    pub class_id: DbId,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub attributes: Option<AnnotationAttributes>,
}

/// Body of `POST /api/items/{id}/lock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRequest {
    pub annotation_set_id: DbId,
    pub ttl_seconds: u32,
    pub owner: String,
}

/// Body of `POST /api/items/{id}/unlock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub annotation_set_id: DbId,
    pub owner: String,
}

/// Response of a successful lock acquire or renewal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockGrant {
    #[serde(default = "default_true")]
    pub ok: bool,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Job snapshot from `GET /api/jobs/{id}` and the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDto {
    pub id: DbId,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

/// Tail of a training run's results table (`.../train-yolo/live-csv`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveCsv {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub job_rel_path: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Timestamps from the backend are naive ISO-8601 in UTC
/// (`2024-05-01T12:00:00.123456`); RFC 3339 with an offset is accepted too.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Parse either an RFC 3339 timestamp or a naive one taken as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|n| n.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) => super::parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
            }
        }
    }
}
