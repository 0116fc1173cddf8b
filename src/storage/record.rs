use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const COLUMNS: [&str; 6] = [
    "timestamp",
    "rating",
    "review_text",
    "ai_response",
    "ai_summary",
    "recommended_actions",
];

/// One persisted review together with the generated reply, summary and actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub rating: u8,
    #[serde(alias = "review")]
    pub review_text: String,
    pub ai_response: String,
    pub ai_summary: String,
    pub recommended_actions: String,
}

impl SubmissionRecord {
    pub fn is_critical(&self) -> bool {
        self.rating <= 2
    }

    pub fn is_positive(&self) -> bool {
        self.rating >= 4
    }

    pub fn stars(&self) -> String {
        "⭐".repeat(self.rating as usize)
    }

    pub fn mood(&self) -> &'static str {
        match self.rating {
            1 => "😞",
            2 => "😕",
            3 => "😐",
            4 => "👍",
            5 => "😊",
            _ => "⭐",
        }
    }
}

/// Second-precision timestamps in the store's column format.
pub mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(serde::de::Error::custom)
    }
}
