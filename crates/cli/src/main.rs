use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::prelude::*;
use wacast_browser::session::WhatsAppSession;
use wacast_browser::transport::WhatsAppTransport;
use wacast_core::config::AppConfig;
use wacast_dispatch::{Contact, Dispatcher, RunSummary};

#[derive(Parser, Debug)]
#[command(author, version, about = "wacast - bulk personalized WhatsApp messaging", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send the templated message to every contact (default)
    Run,
    /// Validate sources and template without opening a browser
    Check,
    /// Forget the attached browser session (login profile is kept)
    Reset,
}

/// How long the browser stays open after the last send.
const TRAILING_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let app_root = wacast_core::path_utils::get_app_root();
    let _ = std::fs::create_dir_all(&app_root);

    // Run mode keeps a persistent log file next to the console feedback;
    // utility commands log to stderr only.
    let _guard = if matches!(args.command, Some(Commands::Run) | None) {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(app_root.join("wacast.log"));
        match log_file {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                tracing_subscriber::registry()
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false),
                    )
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                    .init();
                Some(guard)
            }
            Err(_) => {
                tracing_subscriber::fmt().with_writer(std::io::stderr).init();
                None
            }
        }
    } else {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
        None
    };

    wacast_core::init();

    // Reset needs no config.
    if matches!(args.command, Some(Commands::Reset)) {
        let session_file = app_root.join("browser_session.json");
        if session_file.exists() {
            match std::fs::remove_file(&session_file) {
                Ok(()) => println!(
                    "🧹 Browser session forgotten. Login profile kept at {:?}.",
                    app_root.join("browser_profile")
                ),
                Err(e) => eprintln!("❌ Could not remove {:?}: {}", session_file, e),
            }
        } else {
            println!("No attached browser session to forget.");
        }
        return;
    }

    let config = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Error: configuration invalid: {}", e);
            eprintln!("   Put overrides in .env or wacast.toml (see .env.example).");
            std::process::exit(1);
        }
    };

    match args.command {
        Some(Commands::Check) => check(&config).await,
        Some(Commands::Run) | None => run(config).await,
        Some(Commands::Reset) => unreachable!(),
    }
}

async fn run(config: AppConfig) {
    println!("📨 wacast starting...");

    let session = match WhatsAppSession::connect(&config).await {
        Ok(session) => session,
        Err(e) => {
            error!("Could not start a browser session: {:#}", e);
            eprintln!("❌ Could not start a browser session: {:#}", e);
            std::process::exit(1);
        }
    };

    // Everything after this point must not skip teardown.
    let outcome = run_campaign(&session, &config).await;

    tokio::time::sleep(TRAILING_DELAY).await;
    session.shutdown().await;

    match outcome {
        Ok(Some(summary)) => {
            println!(
                "\n📊 Summary: {}/{} messages sent successfully ({} rows skipped)",
                summary.sent, summary.attempted, summary.skipped
            );
        }
        Ok(None) => {}
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("❌ An error occurred: {:#}", e);
        }
    }
}

async fn run_campaign(
    session: &WhatsAppSession,
    config: &AppConfig,
) -> anyhow::Result<Option<RunSummary>> {
    println!("Please scan the QR code if prompted...");
    session.open_whatsapp().await?;

    let template = wacast_message::file::load_message_template(config);

    let sources = wacast_sources::default_sources(config);
    let Some((label, rows)) = wacast_sources::resolve_contacts(&sources).await else {
        println!("❌ No contacts found.");
        print_source_help();
        return Ok(None);
    };

    println!("📇 {} contacts from {}", rows.len(), label);
    if label.contains("contacts_example") {
        println!("⚠️ Using example contacts. Create your own contacts.csv with real data.");
    }

    let transport = WhatsAppTransport::new(session);
    let dispatcher = Dispatcher::new(
        &transport,
        &template,
        Duration::from_secs(config.message_delay_secs),
    );
    let summary = dispatcher.run(&rows).await;
    Ok(Some(summary))
}

async fn check(config: &AppConfig) {
    println!("🔎 Checking contact sources and template...");

    let template = wacast_message::file::load_message_template(config);
    println!("   Template: {} characters", template.chars().count());

    let sources = wacast_sources::default_sources(config);
    if sources.is_empty() {
        println!("❌ No contact sources available.");
        print_source_help();
        return;
    }

    match wacast_sources::resolve_contacts(&sources).await {
        Some((label, rows)) => {
            println!("✅ {} rows from {}", rows.len(), label);
            let usable = rows
                .iter()
                .filter(|r| Contact::from_record(r).is_some())
                .count();
            println!("   {} rows have a usable name and phone", usable);
        }
        None => {
            println!("❌ Every contact source failed.");
            print_source_help();
        }
    }
}

fn print_source_help() {
    println!("💡 Options:");
    println!("   1. Set WACAST_SHEET_ID and provide credentials.json (service account)");
    println!("   2. Create a contacts.csv file with Name,Phone columns");
}
