//! Micetro CLI entrypoint.
//!
//! Runs one reconciliation per invocation and prints the result document
//! to stdout. Logs go to stderr.

use std::path::Path;
use std::process::ExitCode;

use micetro_reconcile::cli::{Cli, Commands, OutputFormatter, ResourceArg};
use micetro_reconcile::config::{
    GroupParams, ParamValidator, ParamsDocument, ParamsParser, PropertyParams, ProviderConfig,
    UserParams, ValidationResult, ZoneParams,
};
use micetro_reconcile::error::{ConfigError, Result};
use micetro_reconcile::runner::ModuleRunner;

use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // Environment fallbacks for the connection flags may live in .env
    if let Err(e) = ParamsParser::new().load_dotenv() {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let formatter = OutputFormatter::new(cli.output);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, &formatter)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", formatter.format_failure(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: &Cli, formatter: &OutputFormatter) -> Result<String> {
    match &cli.command {
        Commands::Group { params, check } => {
            let doc: ParamsDocument<GroupParams> = load(params)?;
            let runner = runner_for(cli, doc.mm_provider, *check)?;
            let result = runner.run_group(&doc.params).await?;
            Ok(formatter.format_result(&result))
        }
        Commands::Zone { params, check } => {
            let doc: ParamsDocument<ZoneParams> = load(params)?;
            let runner = runner_for(cli, doc.mm_provider, *check)?;
            let result = runner.run_zone(&doc.params).await?;
            Ok(formatter.format_result(&result))
        }
        Commands::User { params, check } => {
            let doc: ParamsDocument<UserParams> = load(params)?;
            let runner = runner_for(cli, doc.mm_provider, *check)?;
            let result = runner.run_user(&doc.params).await?;
            Ok(formatter.format_result(&result))
        }
        Commands::Property { params, check } => {
            let doc: ParamsDocument<PropertyParams> = load(params)?;
            let runner = runner_for(cli, doc.mm_provider, *check)?;
            let result = runner.run_property(&doc.params).await?;
            Ok(formatter.format_result(&result))
        }
        Commands::Validate { kind, params } => cmd_validate(*kind, params, formatter),
    }
}

/// Validate a parameter file without connecting.
fn cmd_validate(kind: ResourceArg, path: &Path, formatter: &OutputFormatter) -> Result<String> {
    let validator = ParamValidator::new();

    let (name, provider, mut result) = match kind {
        ResourceArg::Group => {
            let doc: ParamsDocument<GroupParams> = load(path)?;
            let result = validator.validate_group(&doc.params)?;
            (doc.params.name, doc.mm_provider, result)
        }
        ResourceArg::Zone => {
            let doc: ParamsDocument<ZoneParams> = load(path)?;
            let result = validator.validate_zone(&doc.params)?;
            (doc.params.name, doc.mm_provider, result)
        }
        ResourceArg::User => {
            let doc: ParamsDocument<UserParams> = load(path)?;
            let result = validator.validate_user(&doc.params)?;
            (doc.params.name, doc.mm_provider, result)
        }
        ResourceArg::Property => {
            let doc: ParamsDocument<PropertyParams> = load(path)?;
            let result = validator.validate_property(&doc.params)?;
            (doc.params.name, doc.mm_provider, result)
        }
    };

    if let Some(provider) = provider {
        let checked: ValidationResult = validator.validate_provider(&provider)?;
        result.warnings.extend(checked.warnings);
    }

    Ok(formatter.format_validation(&name, &result))
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<ParamsDocument<T>> {
    let parser = ParamsParser::new();
    parser.load_file(path)
}

/// Picks connection settings: the parameter file wins over flags and environment.
fn runner_for(cli: &Cli, provider: Option<ProviderConfig>, check: bool) -> Result<ModuleRunner> {
    let provider = match provider {
        Some(provider) => provider,
        None => {
            debug!("No mm_provider in parameter file, using flags and environment");
            cli.provider().ok_or_else(|| ConfigError::MissingEnvVar {
                name: String::from("MM_URL, MM_USER and MM_PASSWORD"),
            })?
        }
    };
    Ok(ModuleRunner::new(provider).with_check_mode(check))
}
