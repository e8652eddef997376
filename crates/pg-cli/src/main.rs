//! PhishGuard CLI
//!
//! Command-line client for the PhishGuard phishing-URL detection service.

use clap::{Parser, Subcommand};
use pg_client::models::MAX_FEATURES_SHOWN;
use pg_client::{
    ClientConfig, HttpApi, ScanReport, ScanWorkflow, SessionStore, SubmitOutcome,
};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "phishguard")]
#[command(about = "Phishing URL Detection Client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (defaults to PHISHGUARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a URL for phishing indicators
    Scan {
        /// URL to scan (scheme optional, http:// assumed)
        url: String,

        /// Print the raw report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log in and persist the session token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Drop the persisted session
    Logout,

    /// Show the current session
    Whoami,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let mut config = ClientConfig::default();
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }

    let api = match HttpApi::new(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    let session = SessionStore::new(api.clone(), &config);

    match cli.command {
        Commands::Scan { url, json } => {
            cmd_scan(&session, ScanWorkflow::new(api), &url, json).await;
        }
        Commands::Login { username, password } => {
            cmd_login(&session, &username, &password).await;
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            cmd_register(&session, &username, &email, &password).await;
        }
        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }
        Commands::Whoami => {
            cmd_whoami(&session).await;
        }
    }
}

async fn cmd_scan(session: &SessionStore, workflow: ScanWorkflow, url: &str, json: bool) {
    // Attach the persisted session when there is one; anonymous scans are
    // fully supported.
    let current = session.initialize().await;
    if let Some(user) = &current.user {
        info!("Scanning as {}", user.username);
    }

    match workflow.submit(url, current.token.as_deref()).await {
        SubmitOutcome::Completed(report) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).expect("report serializes")
                );
            } else {
                print_report(&report);
            }
        }
        SubmitOutcome::Rejected(msg) | SubmitOutcome::Failed(msg) => {
            error!("{}", msg);
            std::process::exit(1);
        }
        SubmitOutcome::Superseded => unreachable!("single submission cannot be superseded"),
    }
}

async fn cmd_login(session: &SessionStore, username: &str, password: &str) {
    match session.login(username, password).await {
        Ok(user) => {
            println!("Logged in as {} <{}>", user.username, user.email);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn cmd_register(session: &SessionStore, username: &str, email: &str, password: &str) {
    match session.register(username, email, password).await {
        Ok(msg) => println!("{}", msg),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn cmd_whoami(session: &SessionStore) {
    let current = session.initialize().await;
    match current.user {
        Some(user) => {
            println!("Logged in as {} <{}>", user.username, user.email);
            if user.is_admin {
                println!("Role: admin");
            }
        }
        None => println!("Not logged in"),
    }
}

fn print_report(report: &ScanReport) {
    println!("\nScan Report\n{}", "=".repeat(50));
    println!("URL: {}", report.url);
    println!(
        "Verdict: {}",
        if report.is_phishing {
            "PHISHING"
        } else {
            "LEGITIMATE"
        }
    );
    println!("Risk level: {}", report.risk_level);
    println!(
        "Confidence: {:.1}% [{}]",
        report.confidence_percent(),
        report.risk_bucket()
    );

    if let Some(features) = &report.features {
        if !features.is_empty() {
            println!("\nFeatures:");
            for (name, value) in features.iter().take(MAX_FEATURES_SHOWN) {
                println!("  {}: {}", name, value);
            }
            if features.len() > MAX_FEATURES_SHOWN {
                println!("  ... {} more", features.len() - MAX_FEATURES_SHOWN);
            }
        }
    }
}
