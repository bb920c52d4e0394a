//! Main entry point for the supaops CLI

// Internal modules
mod cli;
mod commands;
mod registry;

// Internal imports (std, crate)
use crate::cli::{Args, CheckTarget, Command, FunctionAction, MigrateAction, UserAction};
use std::process::ExitCode;

// External imports (alphabetized)
use clap::Parser;
use supaops_config::{ConfigurationLoader, EnvironmentSource, Profile, TomlFileSource};
use supaops_db::Probe;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load .env before reading any configuration
    supaops_common::initialize_environment();

    let mut loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
    if let Some(path) = &args.config_file {
        loader = loader.add_source(Box::new(TomlFileSource::new(path)));
    }

    // Fail fast: no command runs against a config that did not validate
    let mut config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(raw) = &args.profile {
        let profile: Profile = match raw.parse() {
            Ok(profile) => profile,
            Err(e) => {
                eprintln!("configuration error: {e}");
                return ExitCode::FAILURE;
            }
        };
        // Profiles tighten defaults only; explicit settings win
        if profile.requires_ssl()
            && config.database.url.is_none()
            && std::env::var("SUPAOPS_DATABASE_SSL_MODE").is_err()
        {
            config.database.ssl_mode = "require".to_string();
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Every log line from the dispatch carries the configured service name
    let span = tracing::info_span!("cli", service = %config.logging.service_name);
    let dispatch = async {
        match args.command {
            Command::Migrate { action } => match action {
                MigrateAction::Status => commands::migrate::status(&config).await,
                MigrateAction::Run { dry_run, target } => {
                    commands::migrate::run(&config, dry_run, target).await
                }
                MigrateAction::Verify => commands::migrate::verify(&config).await,
            },
            Command::Check { target } => {
                let probe = match target {
                    CheckTarget::Table { name } => Probe::table(name),
                    CheckTarget::Column { table, column } => Probe::column(table, column),
                };
                commands::check::exists(&config, probe).await
            }
            Command::Doctor => commands::doctor::run(&config).await,
            Command::User { action } => match action {
                UserAction::Show { email } => commands::user::show(&config, &email).await,
                UserAction::SetRole { email, role } => {
                    commands::user::set_role(&config, &email, &role).await
                }
                UserAction::ResetPassword { email, password } => {
                    commands::user::reset_password(&config, &email, &password).await
                }
            },
            Command::Function { action } => match action {
                FunctionAction::Invoke { name, payload } => {
                    commands::function::invoke(&config, &name, payload.as_deref()).await
                }
            },
        }
    };
    let result = dispatch.instrument(span).await;

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
