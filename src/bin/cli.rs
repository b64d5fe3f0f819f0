//! ltbot CLI
//!
//! Local entry point for the reservation bot. Designed to be launched by
//! cron (or a CI schedule) once per booking day.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use ltbot::{
    bot::ReservationBot,
    config::BotConfig,
    driver::{web::WebSession, PageDriver},
    error::Result,
    notify::{NotificationSink, Notifier},
    runner::Runner,
    schedule,
    utils::timing,
};

/// Life Time class reservation bot
#[derive(Parser, Debug)]
#[command(name = "ltbot", version, about = "Automated Life Time class reservations")]
struct Cli {
    /// Path to a .env file with credentials and target class settings
    #[arg(short, long, default_value = ".env")]
    env_file: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full booking policy: window wait, retries, cutoff
    Run,

    /// Perform a single reservation attempt immediately, no gating
    Once,

    /// Validate configuration and report problems
    Validate,

    /// Show derived state: target date, schedule URL, marker presence
    Info,

    /// Send a test notification through the configured method
    Notify {
        #[arg(long, default_value = "Lifetime Bot - Test")]
        subject: String,

        #[arg(long, default_value = "Test notification")]
        message: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// The class date this invocation is booking for.
fn resolve_target_date(config: &BotConfig) -> String {
    let (today, _) = timing::local_today(Utc::now(), config.schedule.timezone);
    timing::target_date(config.schedule.run_on_schedule, &config.target.date, today)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Existing environment variables always win over .env entries.
    if dotenv::from_path(&cli.env_file).is_ok() {
        log::debug!("Loaded environment from {}", cli.env_file.display());
    }

    let config = BotConfig::from_env()?;

    match cli.command {
        Command::Run => {
            config.validate()?;
            let notifier = Notifier::new(&config);
            let runner = Runner::new(&config, &notifier);

            let outcome = runner.run(|| WebSession::connect(&config.browser)).await?;
            log::info!("Run finished: {:?}", outcome);

            if !outcome.booked() {
                std::process::exit(1);
            }
        }

        Command::Once => {
            config.validate()?;
            let notifier = Notifier::new(&config);
            let target_date = resolve_target_date(&config);

            let driver = WebSession::connect(&config.browser).await?;
            let bot = ReservationBot::new(&driver, &config, &notifier);
            let result = bot.reserve(&target_date).await;

            if let Err(e) = driver.quit().await {
                log::warn!("Browser teardown failed: {}", e);
            }

            let outcome = result?;
            log::info!("Attempt outcome: {:?}", outcome);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            config.validate()?;
            log::info!("✓ Config OK (credentials, club, target class, schedule)");
        }

        Command::Info => {
            let target_date = resolve_target_date(&config);
            let (_, weekday) = timing::local_today(Utc::now(), config.schedule.timezone);

            log::info!("Target date: {}", target_date);
            log::info!(
                "Schedule URL: {}",
                schedule::schedule_url(&config.club, &target_date)
            );
            log::info!(
                "Today ({:?}) is {}an eligible booking day",
                weekday,
                if timing::is_booking_day(&config.schedule.booking_days, weekday) {
                    ""
                } else {
                    "not "
                }
            );
            log::info!(
                "Success marker: {}",
                if config.marker_path().exists() {
                    "present"
                } else {
                    "not found"
                }
            );
        }

        Command::Notify { subject, message } => {
            let notifier = Notifier::new(&config);
            if notifier.send(&subject, &message).await {
                log::info!("Test notification delivered");
            } else {
                log::error!("Test notification failed");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
