//! Parameter filtering for the report-definition request.
//!
//! Callers may hand over an arbitrary JSON object of candidate parameters.
//! [`filter_params`] keeps only the recognized keys that carry a value and
//! checks each against its expected [`ParamKind`]:
//!
//! | Key | Kind |
//! |-----|------|
//! | `start_date`, `end_date` | date string |
//! | `user_ids`, `group_ids`, `context_type`, `ext_fields` | list |
//! | `context_status`, `recall_status`, `ext_params` | integer |
//! | `search_string` | string |
//! | `limit`, `offset` | numeric string |
//!
//! Unknown keys are dropped silently. A recognized key with the wrong shape
//! fails with [`ValidationError::InvalidParameter`] naming that key.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{ParamKind, ValidationError};
use crate::query::QueryDate;

/// Filtered parameter set, ordered by key.
pub type ParamMap = BTreeMap<String, Value>;

/// Recognized parameters, in the order they are type-checked.
pub const RECOGNIZED_PARAMS: [(&str, ParamKind); 12] = [
    ("start_date", ParamKind::DateString),
    ("end_date", ParamKind::DateString),
    ("user_ids", ParamKind::List),
    ("group_ids", ParamKind::List),
    ("context_type", ParamKind::List),
    ("context_status", ParamKind::Integer),
    ("recall_status", ParamKind::Integer),
    ("search_string", ParamKind::Text),
    ("ext_params", ParamKind::Integer),
    ("ext_fields", ParamKind::List),
    ("limit", ParamKind::NumericString),
    ("offset", ParamKind::NumericString),
];

/// Restricts `candidate` to the recognized, present and well-typed subset.
///
/// Filtering an already filtered map returns it unchanged.
pub fn filter_params(candidate: &Map<String, Value>) -> Result<ParamMap, ValidationError> {
    let present = RECOGNIZED_PARAMS
        .iter()
        .filter_map(|(name, kind)| match candidate.get(*name) {
            None | Some(Value::Null) => None,
            Some(value) => Some((*name, *kind, value)),
        })
        .collect::<Vec<_>>();

    let mut filtered = ParamMap::new();
    for (name, kind, value) in present {
        if !matches_kind(kind, value) {
            return Err(ValidationError::InvalidParameter {
                name,
                expected: kind,
            });
        }
        filtered.insert(name.to_owned(), value.clone());
    }

    Ok(filtered)
}

/// Convenience wrapper for callers already holding a [`ParamMap`].
pub fn refilter(params: &ParamMap) -> Result<ParamMap, ValidationError> {
    let candidate = params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect::<Map<_, _>>();
    filter_params(&candidate)
}

fn matches_kind(kind: ParamKind, value: &Value) -> bool {
    match kind {
        ParamKind::DateString => value
            .as_str()
            .map(|raw| QueryDate::parse(raw).is_some())
            .unwrap_or(false),
        ParamKind::Integer => value.as_i64().is_some(),
        ParamKind::Text => value.is_string(),
        ParamKind::NumericString => value
            .as_str()
            .map(|raw| raw.parse::<u64>().is_ok())
            .unwrap_or(false),
        ParamKind::List => value.is_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn drops_unknown_and_null_keys() {
        let candidate = object(json!({
            "start_date": "01.01.2024 00:00:00",
            "end_date": "02.01.2024 00:00:00",
            "user_ids": null,
            "vpbx_api_key": "leak",
            "limit": "100"
        }));

        let filtered = filter_params(&candidate).expect("valid parameters");
        assert_eq!(
            filtered.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["end_date", "limit", "start_date"]
        );
    }

    #[test]
    fn type_mismatch_names_the_offending_key() {
        let candidate = object(json!({
            "start_date": "01.01.2024 00:00:00",
            "context_status": "0",
        }));

        let error = filter_params(&candidate).expect_err("string is not an integer");
        assert_eq!(
            error,
            ValidationError::InvalidParameter {
                name: "context_status",
                expected: ParamKind::Integer,
            }
        );
    }

    #[test]
    fn malformed_date_is_a_date_string_error() {
        let candidate = object(json!({ "end_date": "2024-01-01T00:00:00Z" }));

        let error = filter_params(&candidate).expect_err("wrong date layout");
        assert_eq!(
            error,
            ValidationError::InvalidParameter {
                name: "end_date",
                expected: ParamKind::DateString,
            }
        );
    }

    #[test]
    fn limit_must_be_a_numeric_string() {
        for bad in [json!(100), json!("hundred")] {
            let candidate = object(json!({ "limit": bad }));
            let error = filter_params(&candidate).expect_err("limit must be a numeric string");
            assert_eq!(
                error,
                ValidationError::InvalidParameter {
                    name: "limit",
                    expected: ParamKind::NumericString,
                }
            );
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let candidate = object(json!({
            "start_date": "01.01.2024 00:00:00",
            "end_date": "15.01.2024 12:30:00",
            "user_ids": [1, 2],
            "group_ids": [7],
            "context_type": [1],
            "context_status": 0,
            "recall_status": 1,
            "search_string": "+7900",
            "ext_params": 1,
            "ext_fields": ["records"],
            "limit": "500",
            "offset": "0",
            "unexpected": true
        }));

        let once = filter_params(&candidate).expect("first pass");
        let twice = refilter(&once).expect("second pass");
        assert_eq!(once, twice);
        assert_eq!(once.len(), 12);
    }
}
