use auth_dispatch::{
    AuditEntry, AuditEventType, AuditLogger, Backend, Config, Decision, Dispatcher,
    RadiusTransport, TokenRegistry,
};
use clap::{Parser, Subcommand};
use otp_engine::unix_now;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// OTP token validator and parallel RADIUS authentication dispatcher
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "auth-dispatch")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.json")]
    config: String,

    /// Validate configuration and exit
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current code for every enrolled token
    Tokens,
    /// Validate a presented code against an enrolled token
    Validate { username: String, code: String },
    /// Fan a credential pair out to all configured backends
    Dispatch { username: String, password: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.check {
                eprintln!("Configuration validation failed: {}", e);
                process::exit(1);
            }

            warn!("Could not load config file from: {}", cli.config);
            info!("Creating example configuration at: {}", cli.config);

            if let Err(e) = Config::example().to_file(&cli.config) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and rerun", cli.config);
            process::exit(0);
        }
    };

    if cli.check {
        println!("Configuration validated successfully");
        println!("  Backends: {}", config.backends.len());
        println!("  Tokens:   {}", config.tokens.len());
        println!("  Timeout:  {}s", config.timeout_secs);
        if let Some(ref path) = config.audit_log_path {
            println!("  Audit log: {}", path);
        }
        process::exit(0);
    }

    let log_level = config.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let audit = match AuditLogger::new(config.audit_log_path.clone()) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            error!("Failed to open audit log: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Some(Command::Tokens) => run_tokens(&config),
        Some(Command::Validate { username, code }) => {
            run_validate(&config, &audit, &username, &code).await
        }
        Some(Command::Dispatch { username, password }) => {
            run_dispatch(&config, &audit, &username, &password).await
        }
        None => {
            eprintln!("No command given; try `auth-dispatch tokens`");
            2
        }
    };

    process::exit(exit_code);
}

fn build_registry(config: &Config) -> TokenRegistry {
    match TokenRegistry::new(config) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to build token registry: {}", e);
            process::exit(1);
        }
    }
}

fn run_tokens(config: &Config) -> i32 {
    let registry = build_registry(config);
    let now = unix_now();

    let mut usernames: Vec<&str> = registry.usernames().collect();
    usernames.sort_unstable();

    println!("Current token codes:");
    for username in usernames {
        match registry.current_code(username, now) {
            Ok(code) => println!("  {}: {}", username, code),
            Err(e) => println!("  {}: <error: {}>", username, e),
        }
    }
    0
}

async fn run_validate(config: &Config, audit: &Arc<AuditLogger>, username: &str, code: &str) -> i32 {
    let registry = build_registry(config);
    let now = unix_now();

    match registry.validate(username, code, now) {
        Ok(true) => {
            info!(username = username, "Token code accepted");
            audit
                .log(AuditEntry::new(AuditEventType::OtpAccepted).with_username(username))
                .await;
            println!("SUCCESS: code valid for {}", username);
            0
        }
        Ok(false) => {
            info!(username = username, "Token code rejected");
            audit
                .log(AuditEntry::new(AuditEventType::OtpRejected).with_username(username))
                .await;
            println!("FAILED: code invalid for {}", username);
            1
        }
        Err(e) => {
            error!(username = username, error = %e, "Token validation error");
            audit
                .log(
                    AuditEntry::new(AuditEventType::OtpRejected)
                        .with_username(username)
                        .with_details(e.to_string()),
                )
                .await;
            eprintln!("ERROR: {}", e);
            1
        }
    }
}

async fn run_dispatch(
    config: &Config,
    audit: &Arc<AuditLogger>,
    username: &str,
    password: &str,
) -> i32 {
    let backends: Vec<Arc<Backend>> = config
        .backends
        .iter()
        .filter(|b| b.enabled)
        .cloned()
        .map(|b| match Backend::new(b) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                error!("Invalid backend configuration: {}", e);
                process::exit(1);
            }
        })
        .collect();

    let transport = Arc::new(RadiusTransport::new(config.nas_ip));
    let dispatcher = Dispatcher::new(transport).with_audit(Arc::clone(audit));

    let report = dispatcher
        .dispatch(
            username,
            password,
            &backends,
            Duration::from_secs(config.timeout_secs),
        )
        .await;

    for backend in &report.reports {
        println!("  {}: {:?}", backend.backend, backend.outcome);
    }

    match report.decision {
        Decision::Accept => {
            println!("ACCEPT: {} authenticated", username);
            0
        }
        Decision::Reject => {
            println!("REJECT: all backends rejected {}", username);
            1
        }
        Decision::Fail => {
            println!("FAIL: no backend could answer for {}", username);
            1
        }
    }
}
