//! The logical "all call records in this date range" request.

use std::fmt::{Display, Formatter};

use serde_json::{json, Map, Value};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, PrimitiveDateTime};

use crate::error::{ParamKind, QueryRule, ValidationError};
use crate::params::{filter_params, ParamMap};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]:[second]");

/// Longest date range a single query may cover.
pub const MAX_SPAN_DAYS: i64 = 30;

/// Timestamp in the API's `DD.MM.YYYY HH:MM:SS` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryDate(PrimitiveDateTime);

impl QueryDate {
    pub fn parse(input: &str) -> Option<Self> {
        PrimitiveDateTime::parse(input, DATE_FORMAT).ok().map(Self)
    }

    fn parse_field(name: &'static str, input: &str) -> Result<Self, ValidationError> {
        Self::parse(input).ok_or(ValidationError::InvalidParameter {
            name,
            expected: ParamKind::DateString,
        })
    }

    pub fn into_inner(self) -> PrimitiveDateTime {
        self.0
    }
}

impl Display for QueryDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let formatted = self.0.format(DATE_FORMAT).map_err(|_| std::fmt::Error)?;
        f.write_str(&formatted)
    }
}

/// Page sizes the remote API accepts for `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageSize {
    One,
    Five,
    Ten,
    Twenty,
    Fifty,
    #[default]
    Hundred,
    FiveHundred,
    Thousand,
    TwoThousand,
    FiveThousand,
}

impl PageSize {
    pub const ALL: [PageSize; 10] = [
        Self::One,
        Self::Five,
        Self::Ten,
        Self::Twenty,
        Self::Fifty,
        Self::Hundred,
        Self::FiveHundred,
        Self::Thousand,
        Self::TwoThousand,
        Self::FiveThousand,
    ];

    pub const fn get(self) -> usize {
        match self {
            Self::One => 1,
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Hundred => 100,
            Self::FiveHundred => 500,
            Self::Thousand => 1000,
            Self::TwoThousand => 2000,
            Self::FiveThousand => 5000,
        }
    }

    pub fn from_rows(rows: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|size| size.get() == rows)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(Self::from_rows)
            .ok_or_else(|| {
                ValidationError::InvalidQueryRule(QueryRule::PageSizeNotAllowed {
                    value: input.to_owned(),
                })
            })
    }
}

impl Display for PageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Validated call statistics query.
///
/// Construction checks every rule once; afterwards the query is immutable and
/// the pagination cursor lives in the collection loop, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsQuery {
    start: QueryDate,
    end: QueryDate,
    user_ids: Option<Vec<i64>>,
    group_ids: Option<Vec<i64>>,
    context_type: Option<Vec<i64>>,
    context_status: Option<i64>,
    recall_status: Option<i64>,
    search_string: Option<String>,
    ext_params: Option<i64>,
    ext_fields: Option<Vec<String>>,
    limit: PageSize,
    offset: u64,
}

impl StatisticsQuery {
    pub fn builder(start: impl Into<String>, end: impl Into<String>) -> StatisticsQueryBuilder {
        StatisticsQueryBuilder::new(start, end)
    }

    /// Builds a query from an arbitrary JSON object of candidate parameters.
    ///
    /// Unknown keys are ignored; `start_date` and `end_date` are required.
    pub fn from_params(candidate: &Map<String, Value>) -> Result<Self, ValidationError> {
        let params = filter_params(candidate)?;

        let date = |name: &'static str| -> Result<String, ValidationError> {
            params
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or(ValidationError::InvalidParameter {
                    name,
                    expected: ParamKind::DateString,
                })
        };

        let mut builder = StatisticsQueryBuilder::new(date("start_date")?, date("end_date")?);
        builder.user_ids = integer_list(&params, "user_ids")?;
        builder.group_ids = integer_list(&params, "group_ids")?;
        builder.context_type = integer_list(&params, "context_type")?;
        builder.context_status = params.get("context_status").and_then(Value::as_i64);
        builder.recall_status = params.get("recall_status").and_then(Value::as_i64);
        builder.search_string = params
            .get("search_string")
            .and_then(Value::as_str)
            .map(str::to_owned);
        builder.ext_params = params.get("ext_params").and_then(Value::as_i64);
        builder.ext_fields = string_list(&params, "ext_fields")?;
        builder.raw_limit = params
            .get("limit")
            .and_then(Value::as_str)
            .map(str::to_owned);
        builder.offset = params
            .get("offset")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);

        builder.build()
    }

    pub fn start(&self) -> QueryDate {
        self.start
    }

    pub fn end(&self) -> QueryDate {
        self.end
    }

    pub fn limit(&self) -> PageSize {
        self.limit
    }

    /// Offset of the first requested row.
    pub fn initial_offset(&self) -> u64 {
        self.offset
    }

    pub fn recall_status(&self) -> Option<i64> {
        self.recall_status
    }

    /// Report-definition parameters for the page starting at `offset`.
    ///
    /// Absent options are omitted; `limit` and `offset` travel as strings.
    pub fn params_at(&self, offset: u64) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert(String::from("start_date"), json!(self.start.to_string()));
        params.insert(String::from("end_date"), json!(self.end.to_string()));
        insert_some(&mut params, "user_ids", self.user_ids.as_ref());
        insert_some(&mut params, "group_ids", self.group_ids.as_ref());
        insert_some(&mut params, "context_type", self.context_type.as_ref());
        insert_some(&mut params, "context_status", self.context_status.as_ref());
        insert_some(&mut params, "recall_status", self.recall_status.as_ref());
        insert_some(&mut params, "search_string", self.search_string.as_ref());
        insert_some(&mut params, "ext_params", self.ext_params.as_ref());
        insert_some(&mut params, "ext_fields", self.ext_fields.as_ref());
        params.insert(String::from("limit"), json!(self.limit.to_string()));
        params.insert(String::from("offset"), json!(offset.to_string()));
        params
    }

    fn check_rules(&self) -> Result<(), ValidationError> {
        if self.recall_status.is_some() {
            let single_incoming = self.context_type.as_deref() == Some(&[1][..]);
            if !(single_incoming && self.context_status == Some(0)) {
                return Err(ValidationError::InvalidQueryRule(
                    QueryRule::RecallStatusNotAllowed {
                        context_type: self.context_type.clone(),
                        context_status: self.context_status,
                    },
                ));
            }
        }

        if self.end.into_inner() - self.start.into_inner() > Duration::days(MAX_SPAN_DAYS) {
            return Err(ValidationError::InvalidQueryRule(
                QueryRule::DateSpanExceeded {
                    start: self.start.to_string(),
                    end: self.end.to_string(),
                    max_days: MAX_SPAN_DAYS,
                },
            ));
        }

        Ok(())
    }
}

/// Builder for [`StatisticsQuery`]; every rule is checked in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct StatisticsQueryBuilder {
    start: String,
    end: String,
    user_ids: Option<Vec<i64>>,
    group_ids: Option<Vec<i64>>,
    context_type: Option<Vec<i64>>,
    context_status: Option<i64>,
    recall_status: Option<i64>,
    search_string: Option<String>,
    ext_params: Option<i64>,
    ext_fields: Option<Vec<String>>,
    limit: PageSize,
    raw_limit: Option<String>,
    offset: u64,
}

impl StatisticsQueryBuilder {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            ..Self::default()
        }
    }

    pub fn user_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.user_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn group_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.group_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn context_type(mut self, types: impl IntoIterator<Item = i64>) -> Self {
        self.context_type = Some(types.into_iter().collect());
        self
    }

    pub fn context_status(mut self, status: i64) -> Self {
        self.context_status = Some(status);
        self
    }

    pub fn recall_status(mut self, status: i64) -> Self {
        self.recall_status = Some(status);
        self
    }

    pub fn search_string(mut self, search: impl Into<String>) -> Self {
        self.search_string = Some(search.into());
        self
    }

    pub fn ext_params(mut self, ext_params: i64) -> Self {
        self.ext_params = Some(ext_params);
        self
    }

    pub fn ext_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ext_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: PageSize) -> Self {
        self.limit = limit;
        self.raw_limit = None;
        self
    }

    /// Page size given as the API's string form, e.g. `"500"`.
    pub fn limit_str(mut self, limit: impl Into<String>) -> Self {
        self.raw_limit = Some(limit.into());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn build(self) -> Result<StatisticsQuery, ValidationError> {
        let start = QueryDate::parse_field("start_date", &self.start)?;
        let end = QueryDate::parse_field("end_date", &self.end)?;
        let limit = match self.raw_limit.as_deref() {
            Some(raw) => PageSize::parse(raw)?,
            None => self.limit,
        };

        let query = StatisticsQuery {
            start,
            end,
            user_ids: self.user_ids,
            group_ids: self.group_ids,
            context_type: self.context_type,
            context_status: self.context_status,
            recall_status: self.recall_status,
            search_string: self.search_string,
            ext_params: self.ext_params,
            ext_fields: self.ext_fields,
            limit,
            offset: self.offset,
        };
        query.check_rules()?;
        Ok(query)
    }
}

fn insert_some<T: serde::Serialize>(params: &mut ParamMap, name: &str, value: Option<&T>) {
    if let Some(value) = value {
        params.insert(name.to_owned(), json!(value));
    }
}

fn integer_list(
    params: &ParamMap,
    name: &'static str,
) -> Result<Option<Vec<i64>>, ValidationError> {
    let Some(values) = params.get(name).and_then(Value::as_array) else {
        return Ok(None);
    };
    values
        .iter()
        .map(|value| {
            value.as_i64().ok_or(ValidationError::InvalidParameter {
                name,
                expected: ParamKind::List,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn string_list(
    params: &ParamMap,
    name: &'static str,
) -> Result<Option<Vec<String>>, ValidationError> {
    let Some(values) = params.get(name).and_then(Value::as_array) else {
        return Ok(None);
    };
    values
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(str::to_owned)
                .ok_or(ValidationError::InvalidParameter {
                    name,
                    expected: ParamKind::List,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::refilter;

    #[test]
    fn date_round_trips_api_layout() {
        let date = QueryDate::parse("05.02.2024 09:07:03").expect("valid date");
        assert_eq!(date.to_string(), "05.02.2024 09:07:03");
        assert!(QueryDate::parse("2024-02-05 09:07:03").is_none());
    }

    #[test]
    fn recall_status_rejected_outside_incoming_unanswered() {
        let error = StatisticsQuery::builder("01.01.2024 00:00:00", "02.01.2024 00:00:00")
            .context_type([2])
            .context_status(0)
            .recall_status(1)
            .build()
            .expect_err("recall_status needs context_type=1");

        assert!(matches!(
            error,
            ValidationError::InvalidQueryRule(QueryRule::RecallStatusNotAllowed { .. })
        ));
    }

    #[test]
    fn recall_status_accepted_for_incoming_unanswered() {
        let query = StatisticsQuery::builder("01.01.2024 00:00:00", "02.01.2024 00:00:00")
            .context_type([1])
            .context_status(0)
            .recall_status(1)
            .build()
            .expect("allowed combination");
        assert_eq!(query.recall_status(), Some(1));
    }

    #[test]
    fn span_over_thirty_days_is_rejected() {
        let error = StatisticsQuery::builder("01.01.2024 00:00:00", "05.02.2024 00:00:00")
            .build()
            .expect_err("span is 35 days");
        assert!(matches!(
            error,
            ValidationError::InvalidQueryRule(QueryRule::DateSpanExceeded { max_days: 30, .. })
        ));

        StatisticsQuery::builder("01.01.2024 00:00:00", "31.01.2024 00:00:00")
            .build()
            .expect("exactly 30 days is allowed");
    }

    #[test]
    fn page_size_outside_allowed_set_is_rejected() {
        let error = StatisticsQuery::builder("01.01.2024 00:00:00", "02.01.2024 00:00:00")
            .limit_str("30")
            .build()
            .expect_err("30 is not an allowed page size");
        assert_eq!(
            error,
            ValidationError::InvalidQueryRule(QueryRule::PageSizeNotAllowed {
                value: String::from("30")
            })
        );
        assert_eq!(PageSize::parse("2000"), Ok(PageSize::TwoThousand));
    }

    #[test]
    fn params_omit_absent_options_and_stringify_paging() {
        let query = StatisticsQuery::builder("01.01.2024 00:00:00", "02.01.2024 00:00:00")
            .user_ids([10, 11])
            .limit(PageSize::Fifty)
            .build()
            .expect("valid query");

        let params = query.params_at(150);
        assert_eq!(params.get("limit"), Some(&json!("50")));
        assert_eq!(params.get("offset"), Some(&json!("150")));
        assert_eq!(params.get("user_ids"), Some(&json!([10, 11])));
        assert!(!params.contains_key("group_ids"));
        assert_eq!(refilter(&params).expect("params are valid"), params);
    }

    #[test]
    fn from_params_ignores_unknown_keys_and_reads_strings() {
        let candidate = match json!({
            "start_date": "01.03.2024 00:00:00",
            "end_date": "10.03.2024 23:59:59",
            "ext_fields": ["records"],
            "limit": "1000",
            "offset": "2000",
            "format": "csv"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let query = StatisticsQuery::from_params(&candidate).expect("valid candidate");
        assert_eq!(query.limit(), PageSize::Thousand);
        assert_eq!(query.initial_offset(), 2000);
        assert_eq!(
            query.params_at(2000).get("ext_fields"),
            Some(&json!(["records"]))
        );
    }

    #[test]
    fn from_params_requires_dates() {
        let candidate = match json!({ "end_date": "10.03.2024 23:59:59" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let error = StatisticsQuery::from_params(&candidate).expect_err("start_date missing");
        assert_eq!(
            error,
            ValidationError::InvalidParameter {
                name: "start_date",
                expected: ParamKind::DateString,
            }
        );
    }

    #[test]
    fn from_params_rejects_non_integer_user_ids() {
        let candidate = match json!({
            "start_date": "01.03.2024 00:00:00",
            "end_date": "02.03.2024 00:00:00",
            "user_ids": ["alice"]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let error = StatisticsQuery::from_params(&candidate).expect_err("ids must be integers");
        assert!(matches!(
            error,
            ValidationError::InvalidParameter { name: "user_ids", .. }
        ));
    }
}
