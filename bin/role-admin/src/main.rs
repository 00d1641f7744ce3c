//! Role administration CLI entry point.

use clap::Parser;
use open_console_role_admin::cli::{self, Cli, Command, RoleReport};
use open_console_role_admin::config::AdminConfig;
use open_console_role_admin::error::AdminError;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the JSON report.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => match print_report(&report) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "command failed");
                ExitCode::from(err.exit_code())
            }
        },
        Err(err) => {
            error!(error = %err, "command failed");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<RoleReport, AdminError> {
    let config = AdminConfig::from_env()?;

    match cli.command {
        Command::Me(args) => cli::inspect_caller(&config.oidc, &args),
        Command::Admin(command) => {
            let zitadel = config.require_zitadel()?;
            info!(base_url = %zitadel.base_url(), "using identity provider");
            let service = cli::build_service(zitadel, &config.oidc)?;
            cli::run_admin(&service, command)
                .await
                .map_err(|report| AdminError::from(report.current_context().clone()))
        }
    }
}

fn print_report(report: &RoleReport) -> Result<(), AdminError> {
    let json = serde_json::to_string_pretty(report).map_err(|e| AdminError::Output {
        details: e.to_string(),
    })?;
    writeln!(std::io::stdout().lock(), "{json}").map_err(|e| AdminError::Output {
        details: e.to_string(),
    })
}
