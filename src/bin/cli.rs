//! Wellspring CLI
//!
//! Command-line interface for the wellness gateway:
//! - Log water intake and check today's progress
//! - Show daily totals
//! - Watch for hydration reminders
//! - Log and summarize mood diary and sleep entries

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use wellspring::config::{generate_default_config, Config, ReminderConfig};
use wellspring::{
    diary, sleep, Gateway, HttpGateway, HydrationSnapshot, HydrationView, NewDiaryEntry,
    NewSleepEntry, Series, SleepAnalysis,
};

#[derive(Parser)]
#[command(name = "wellspring")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hydration tracking with hourly reminders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: user config dir, then ./wellspring.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Gateway URL, overrides the config file
    #[arg(long, global = true)]
    pub gateway_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log water intake in liters
    Log {
        /// Amount in liters
        amount: String,
    },

    /// Show today's intake and progress
    Today,

    /// Show intake per day
    Totals {
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Refresh, then print reminders as they are raised until Ctrl-C
    Watch,

    /// Show the most logged mood
    Mood {
        #[command(subcommand)]
        action: Option<MoodAction>,
    },

    /// Show hours slept per night
    Sleep {
        #[command(subcommand)]
        action: Option<SleepAction>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MoodAction {
    /// Log today's mood
    Log {
        /// Emotional rating, 1 to 10
        #[arg(short, long)]
        rating: u8,

        /// Mood descriptors, separated by spaces or commas
        #[arg(required = true)]
        moods: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum SleepAction {
    /// Log a night by clock time
    Log {
        /// Bedtime as HH:MM
        start: String,

        /// Wake-up time as HH:MM
        end: String,

        /// Sleep quality, 1 to 5
        #[arg(short, long, default_value_t = 3)]
        quality: u8,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_ref());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.gateway_url {
        config.gateway.base_url = url;
    }
    config.validate()?;

    wellspring::logging::init(&config.logging);

    let session = config.session()?;
    let gateway: Arc<dyn Gateway> = Arc::new(
        HttpGateway::new(&config.gateway).context("Failed to build the gateway client")?,
    );
    let today = Utc::now().date_naive();

    tracing::debug!(gateway = %config.gateway.base_url, user = session.user_id(), "Starting");

    // One-shot commands never need the periodic check
    let one_shot = ReminderConfig {
        enabled: false,
        ..config.reminder.clone()
    };

    match cli.command {
        Commands::Log { amount } => {
            let view = HydrationView::open(gateway, session, &one_shot);
            let entry = view.submit_text(&amount).await?;
            // The log itself is only needed for today's total
            if let Err(e) = view.fetch_log().await {
                eprintln!("Logged, but could not reload today's entries: {}", e);
            }
            println!("Logged {} L at {}", entry.amount, entry.timestamp);
            print_progress(&view.snapshot(today).await);
            view.close().await;
        }

        Commands::Today => {
            let view = HydrationView::open(gateway, session, &one_shot);
            if let Err(e) = view.refresh().await {
                eprintln!("{}", e);
            }
            let snapshot = view.snapshot(today).await;

            if snapshot.today_entries.is_empty() {
                println!("No hydration logs for today.");
            } else {
                println!("Recent:");
                for entry in snapshot.recent(3) {
                    println!("  {:<28} {:>6.2} L", entry.timestamp, entry.amount);
                }
            }
            println!();
            print_progress(&snapshot);
            if let Some(message) = &snapshot.reminder {
                println!();
                println!("{}", message);
            }
            view.close().await;
        }

        Commands::Totals { format } => {
            let view = HydrationView::open(gateway, session, &one_shot);
            view.fetch_daily_totals()
                .await
                .context("No data available")?;
            let snapshot = view.snapshot(today).await;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&snapshot.daily_totals)?);
                }
                OutputFormat::Csv => print_csv(&snapshot.series, "total_intake")?,
                OutputFormat::Table => print_table(&snapshot.series, "Liters"),
            }
            view.close().await;
        }

        Commands::Watch => {
            let view = HydrationView::open(gateway, session, &config.reminder);
            let mut reminders = view.subscribe();

            if let Err(e) = view.refresh().await {
                eprintln!("{}", e);
            }
            if !config.reminder.enabled {
                eprintln!("Reminders are disabled in the configuration.");
            }
            if let Some(message) = view.check_reminder(Utc::now()).await {
                println!("{}", message);
            }

            println!("Watching for reminders every {}s (Ctrl-C to stop)", config.reminder.check_interval_secs);

            loop {
                tokio::select! {
                    received = reminders.recv() => match received {
                        Ok(message) => println!("[{}] {}", Utc::now().format("%H:%M"), message),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received Ctrl-C, stopping");
                        break;
                    }
                }
            }

            view.close().await;
        }

        Commands::Mood { action } => {
            let mut summary = diary::load(gateway.as_ref(), &session, today).await?;

            if let Some(MoodAction::Log { rating, moods }) = action {
                let moods: Vec<&str> = moods
                    .iter()
                    .flat_map(|m| m.split(','))
                    .filter(|m| !m.trim().is_empty())
                    .collect();
                let entry = NewDiaryEntry::new(session.user_id(), &moods, rating)?;
                let created = diary::submit(gateway.as_ref(), &mut summary, &entry, today).await?;
                println!("Logged mood {} ({}/10)", created.mood_descriptors, created.emotional_rating);
            }

            match &summary.most_logged_mood {
                Some(mood) => println!("Most logged mood: {}", mood),
                None => println!("No diary entries yet."),
            }
            match &summary.today {
                Some(entry) => println!(
                    "Today: {} {}/10 ({})",
                    summary.today_emoji(),
                    entry.emotional_rating,
                    entry.mood_descriptors
                ),
                None => println!("Nothing logged today."),
            }
        }

        Commands::Sleep { action } => {
            let mut summary = sleep::load(gateway.as_ref(), &session).await?;

            if let Some(SleepAction::Log { start, end, quality }) = action {
                let entry = NewSleepEntry::from_clock(session.user_id(), &start, &end, quality, today)?;
                let created = sleep::submit(gateway.as_ref(), &session, &mut summary, &entry).await?;
                println!("Logged sleep {} to {}", created.sleep_start, created.sleep_end);
            }

            if summary.entries.is_empty() {
                println!("No sleep logs yet.");
            } else {
                println!("{:<10} {:>6} {}", "Night", "Hours", "Quality");
                println!("{}", "-".repeat(28));
                for (entry, (label, hours)) in summary.entries.iter().zip(summary.durations.points()) {
                    println!("{:<10} {:>6} {}", label, hours, sleep::quality_emoji(entry.quality));
                }
            }
            println!();
            print_analysis(summary.analysis.as_ref());
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let config = generate_default_config();

    match output {
        Some(path) => {
            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &config)?;
            println!("Config written to {:?}", path);
        }
        None => {
            print!("{}", config);
        }
    }
    Ok(())
}

fn print_progress(snapshot: &HydrationSnapshot) {
    let mark = if snapshot.progress.goal_reached() { " ✓" } else { "" };
    println!(
        "Today: {:.2} / {:.1} L ({:.0}%){}",
        snapshot.today_total, snapshot.progress.goal, snapshot.progress.percent, mark
    );
}

fn print_analysis(analysis: Option<&SleepAnalysis>) {
    let Some(analysis) = analysis else {
        println!("No sleep analysis data available.");
        return;
    };

    match (analysis.average_quality, analysis.quality_emoji()) {
        (Some(quality), Some(emoji)) => println!("Average quality: {} {:.1}", emoji, quality),
        _ => println!("Average quality: n/a"),
    }
    match analysis.total_hours() {
        Some(hours) => println!("Total sleep: {:.1} h", hours),
        None => println!("Total sleep: n/a"),
    }
}

fn print_table(series: &Series, unit: &str) {
    if series.is_empty() {
        println!("No data");
        return;
    }

    println!("{:<12} | {:>8}", "Date", unit);
    println!("{}", "-".repeat(23));
    for (label, value) in series.points() {
        println!("{:<12} | {:>8.2}", label, value);
    }
}

fn print_csv(series: &Series, column: &str) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["date", column])?;
    for (label, value) in series.points() {
        writer.write_record([label.to_string(), format!("{:.2}", value)])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mood_log() {
        let cli = Cli::try_parse_from(["wellspring", "mood", "log", "--rating", "7", "happy", "calm,rested"]).unwrap();
        match cli.command {
            Commands::Mood {
                action: Some(MoodAction::Log { rating, moods }),
            } => {
                assert_eq!(rating, 7);
                assert_eq!(moods, vec!["happy", "calm,rested"]);
            }
            _ => panic!("expected mood log"),
        }

        assert!(matches!(
            Cli::try_parse_from(["wellspring", "mood"]).unwrap().command,
            Commands::Mood { action: None }
        ));
        assert!(Cli::try_parse_from(["wellspring", "mood", "log", "--rating", "7"]).is_err());
    }

    #[test]
    fn test_parse_sleep_log() {
        let cli = Cli::try_parse_from(["wellspring", "sleep", "log", "23:00", "06:30"]).unwrap();
        match cli.command {
            Commands::Sleep {
                action: Some(SleepAction::Log { start, end, quality }),
            } => {
                assert_eq!(start, "23:00");
                assert_eq!(end, "06:30");
                assert_eq!(quality, 3);
            }
            _ => panic!("expected sleep log"),
        }

        let cli = Cli::try_parse_from(["wellspring", "sleep", "log", "22:15", "07:00", "-q", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sleep {
                action: Some(SleepAction::Log { quality: 5, .. })
            }
        ));
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["wellspring", "today", "--gateway-url", "http://localhost:9000/"]).unwrap();
        assert_eq!(cli.gateway_url.as_deref(), Some("http://localhost:9000/"));
        assert!(matches!(cli.command, Commands::Today));
    }
}
