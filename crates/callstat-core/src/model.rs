//! Wire shapes of the report API and the page types built from them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One call-detail row, kept exactly as the server sent it.
pub type CallRecord = Map<String, Value>;

/// Opaque key of a server-side report job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response of the create-job endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobCreated {
    #[serde(default)]
    pub key: Option<String>,
}

/// Response of the fetch-result endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub result: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<ResultBlock>,
}

/// A result block: the page rows plus the server's aggregates.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ResultBlock {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<CallRecord>,
    #[serde(default)]
    pub period: Option<Value>,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_talks_duration: u64,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_calls_duration: u64,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_calls_count: u64,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregates are informational: `null`, fractions and numeric strings are
/// accepted, anything unreadable counts as 0.
fn lenient_total<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let total = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value as u64)
        }),
        Some(Value::String(raw)) => raw.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(total.unwrap_or(0))
}

/// Aggregates reported alongside a page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSummary {
    pub period: Option<Value>,
    pub total_talks_duration: u64,
    pub total_calls_duration: u64,
    pub total_calls_count: u64,
}

/// Rows and aggregates of one completed job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPage {
    pub rows: Vec<CallRecord>,
    pub summary: PageSummary,
}

impl ResultPage {
    /// Only the first block carries data; any further blocks are ignored.
    pub fn from_blocks(blocks: Vec<ResultBlock>) -> Self {
        let Some(block) = blocks.into_iter().next() else {
            return Self::default();
        };
        Self {
            summary: PageSummary {
                period: block.period,
                total_talks_duration: block.total_talks_duration,
                total_calls_duration: block.total_calls_duration,
                total_calls_count: block.total_calls_count,
            },
            rows: block.list,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
