use std::io::Read;
use std::process::ExitCode;

use anyhow::{bail, Context};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sism_core::config::CoreConfig;
use sism_core::fallback::{self, RequestFailure, ResourceContext};
use sism_core::idempotency::{self, HttpMethod, WriteRequest};
use sism_core::types::EntityKind;
use sism_core::validation::Validator;

const USAGE: &str = "\
usage:
  sism validate <entity-kind> [file]   validate a JSON record (stdin if no file)
  sism key <METHOD> <path> [file]      derive the idempotency key for a request body
  sism fallback <status|network>       explain the fallback decision for a failure
  sism mock <path>                     print the mock payload for a resource path";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sism_cli=info,sism_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(std::env::args().skip(1).collect()).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Command failed");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Vec<String>) -> anyhow::Result<ExitCode> {
    let config = CoreConfig::from_env().context("Failed to load configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["validate", kind, rest @ ..] => {
            let kind: EntityKind = kind.parse()?;
            let record = read_json(rest.first().copied())?;
            let validator = Validator::builtin()?;
            let result = validator.validate(kind, &record)?;
            print_json(&result)?;
            Ok(if result.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        ["key", method, path, rest @ ..] => {
            let method: HttpMethod = method.parse()?;
            let body = if method.is_write() {
                read_json(rest.first().copied())?
            } else {
                Value::Null
            };
            let request = WriteRequest::new(method, *path, body);
            if idempotency::should_add_idempotency_key(&config.idempotency, &request) {
                println!("{}", idempotency::generate_idempotency_key(&request.payload()).await);
            } else {
                println!("(not required)");
            }
            Ok(ExitCode::SUCCESS)
        }
        ["fallback", failure] => {
            let failure = if *failure == "network" {
                RequestFailure::network("connection failed")
            } else {
                let status: u16 = failure
                    .parse()
                    .with_context(|| format!("'{failure}' is not an HTTP status"))?;
                RequestFailure::http(status)
            };
            print_json(&fallback::decide(&config.fallback, &failure))?;
            Ok(ExitCode::SUCCESS)
        }
        ["mock", path] => {
            let Some(context) = ResourceContext::from_path(path) else {
                bail!("no mock data for path '{path}'");
            };
            let data = fallback::get_mock_data(&context)?;
            print_json(&data.to_value()?)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{USAGE}");
            Ok(ExitCode::from(2))
        }
    }
}

fn read_json(path: Option<&str>) -> anyhow::Result<Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Input is not valid JSON")
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
