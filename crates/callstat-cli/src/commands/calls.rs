use serde::Serialize;
use tracing::info;

use callstat_core::{
    CallRecord, CallStatsClient, ClientConfig, CollectedStatistics, Completion, Credentials,
    PageSummary, StatisticsQuery, StatisticsQueryBuilder,
};

use crate::cli::CallsArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CallsResponseData<'a> {
    rows: &'a [CallRecord],
    summaries: &'a [PageSummary],
    columns: Vec<String>,
    pages_fetched: usize,
    completion: &'a Completion,
}

pub async fn run(
    args: &CallsArgs,
    credentials: Credentials,
    config: ClientConfig,
) -> Result<CommandResult, CliError> {
    let query = build_query(args)?;
    let client = CallStatsClient::with_reqwest(credentials, config);

    let stats = client.collect(&query).await?;
    info!(
        rows = stats.rows.len(),
        pages = stats.pages_fetched,
        complete = stats.is_complete(),
        "calls collected"
    );

    Ok(CommandResult {
        data: response_data(&stats)?,
        completion: stats.completion,
    })
}

fn build_query(args: &CallsArgs) -> Result<StatisticsQuery, CliError> {
    let mut builder = StatisticsQueryBuilder::new(&args.start, &args.end)
        .limit_str(&args.limit)
        .offset(args.offset);

    if !args.user_ids.is_empty() {
        builder = builder.user_ids(args.user_ids.iter().copied());
    }
    if !args.group_ids.is_empty() {
        builder = builder.group_ids(args.group_ids.iter().copied());
    }
    if !args.context_types.is_empty() {
        builder = builder.context_type(args.context_types.iter().copied());
    }
    if let Some(status) = args.context_status {
        builder = builder.context_status(status);
    }
    if let Some(status) = args.recall_status {
        builder = builder.recall_status(status);
    }
    if let Some(search) = &args.search {
        builder = builder.search_string(search);
    }
    if let Some(ext_params) = args.ext_params {
        builder = builder.ext_params(ext_params);
    }
    if !args.ext_fields.is_empty() {
        builder = builder.ext_fields(args.ext_fields.iter().cloned());
    }

    Ok(builder.build()?)
}

fn response_data(stats: &CollectedStatistics) -> Result<serde_json::Value, CliError> {
    let data = CallsResponseData {
        rows: &stats.rows,
        summaries: &stats.summaries,
        columns: stats.columns(),
        pages_fetched: stats.pages_fetched,
        completion: &stats.completion,
    };
    Ok(serde_json::to_value(data)?)
}
