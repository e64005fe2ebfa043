//! CLI argument definitions for callstat.
//!
//! # Global Options
//!
//! | Option | Env | Description |
//! |--------|-----|-------------|
//! | `--base-url` | `CALLSTAT_BASE_URL` | API root, e.g. `https://api.example.com/` |
//! | `--api-key` | `CALLSTAT_API_KEY` | Account API key |
//! | `--api-salt` | `CALLSTAT_API_SALT` | Account signing salt |
//! | `--timeout-ms` | | Per-request timeout |
//! | `--pretty` | | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! callstat calls --start "01.01.2024 00:00:00" --end "31.01.2024 23:59:59" --pretty
//! callstat calls --start "01.01.2024 00:00:00" --end "02.01.2024 00:00:00" \
//!     --user-id 12 --user-id 14 --limit 500
//! ```

use clap::{Args, Parser, Subcommand};

/// Call statistics downloader for asynchronous report APIs.
#[derive(Debug, Parser)]
#[command(
    name = "callstat",
    author,
    version,
    about = "Download call-detail statistics as JSON"
)]
pub struct Cli {
    /// API root URL.
    #[arg(long, global = true, env = "CALLSTAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Account API key.
    #[arg(long, global = true, env = "CALLSTAT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Salt used to sign every request.
    #[arg(long, global = true, env = "CALLSTAT_API_SALT", hide_env_values = true)]
    pub api_salt: Option<String>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect every call record for a period.
    ///
    /// Pages are requested one report job at a time until the server runs
    /// out of rows.
    ///
    /// # Examples
    ///
    ///   callstat calls --start "01.01.2024 00:00:00" --end "02.01.2024 00:00:00"
    ///   callstat calls --start "01.01.2024 00:00:00" --end "02.01.2024 00:00:00" --limit 1000
    Calls(CallsArgs),
}

/// Arguments for the `calls` command.
#[derive(Debug, Args)]
pub struct CallsArgs {
    /// Period start, `DD.MM.YYYY HH:MM:SS`.
    #[arg(long)]
    pub start: String,

    /// Period end, `DD.MM.YYYY HH:MM:SS`. At most 30 days after the start.
    #[arg(long)]
    pub end: String,

    /// Only calls of this user; repeatable.
    #[arg(long = "user-id")]
    pub user_ids: Vec<i64>,

    /// Only calls of this group; repeatable.
    #[arg(long = "group-id")]
    pub group_ids: Vec<i64>,

    /// Call context type; repeatable.
    #[arg(long = "context-type")]
    pub context_types: Vec<i64>,

    #[arg(long)]
    pub context_status: Option<i64>,

    /// Only valid together with `--context-type 1 --context-status 0`.
    #[arg(long)]
    pub recall_status: Option<i64>,

    /// Free-text search over numbers and names.
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub ext_params: Option<i64>,

    /// Extra field to include in each record; repeatable.
    #[arg(long = "ext-field")]
    pub ext_fields: Vec<String>,

    /// Rows per page: 1, 5, 10, 20, 50, 100, 500, 1000, 2000 or 5000.
    #[arg(long, default_value = "100")]
    pub limit: String,

    /// Row offset to start from.
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Result polls per page before giving up.
    #[arg(long, default_value_t = 5)]
    pub max_attempts: u32,

    /// Seconds between result polls.
    #[arg(long, default_value_t = 30)]
    pub poll_delay_secs: u64,

    /// Seconds to wait before returning partial rows after a server failure.
    #[arg(long, default_value_t = 10)]
    pub cooldown_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeatable_filters_collect_in_order() {
        let cli = Cli::try_parse_from([
            "callstat",
            "--base-url",
            "https://api.test/",
            "calls",
            "--start",
            "01.01.2024 00:00:00",
            "--end",
            "02.01.2024 00:00:00",
            "--user-id",
            "3",
            "--user-id",
            "1",
            "--ext-field",
            "records",
        ])
        .expect("arguments parse");

        let Command::Calls(args) = cli.command;
        assert_eq!(args.user_ids, vec![3, 1]);
        assert_eq!(args.ext_fields, vec![String::from("records")]);
        assert_eq!(args.limit, "100");
        assert_eq!(args.max_attempts, 5);
        assert_eq!(cli.base_url.as_deref(), Some("https://api.test/"));
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "callstat",
            "calls",
            "--start",
            "01.01.2024 00:00:00",
            "--end",
            "02.01.2024 00:00:00",
            "--pretty",
        ])
        .expect("arguments parse");
        assert!(cli.pretty);
    }
}
