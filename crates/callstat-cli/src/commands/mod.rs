mod calls;

use std::time::Duration;

use callstat_core::{ClientConfig, Completion, Credentials, PollConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub completion: Completion,
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let credentials = credentials(cli)?;
    let base_url = required(cli.base_url.as_deref(), "--base-url", "CALLSTAT_BASE_URL")?;

    match &cli.command {
        Command::Calls(args) => {
            let poll = PollConfig::fixed(Duration::from_secs(args.poll_delay_secs), args.max_attempts)
                .with_cooldown(Duration::from_secs(args.cooldown_secs));
            let config = ClientConfig::new(base_url)
                .with_poll(poll)
                .with_request_timeout_ms(cli.timeout_ms);
            calls::run(args, credentials, config).await
        }
    }
}

fn credentials(cli: &Cli) -> Result<Credentials, CliError> {
    let api_key = required(cli.api_key.as_deref(), "--api-key", "CALLSTAT_API_KEY")?;
    let api_salt = required(cli.api_salt.as_deref(), "--api-salt", "CALLSTAT_API_SALT")?;
    Ok(Credentials::new(api_key, api_salt))
}

fn required<'a>(
    value: Option<&'a str>,
    flag: &'static str,
    env: &'static str,
) -> Result<&'a str, CliError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(CliError::MissingSetting { flag, env })
}
