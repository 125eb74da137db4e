use std::path::PathBuf;

use chrono::Weekday;
use clap::Parser;
use tracing::Level;

use backdate::{Config, DEFAULT_FILE_NAME, HELLO_WORLD_CPP, HolidaySelector, schedule};

#[derive(Parser)]
#[command(name = "backdate")]
#[command(version)]
#[command(about = "Fill a git repository with a backdated commit history")]
struct Cli {
    /// Number of days to generate commits for
    #[arg(long, default_value_t = 100)]
    days: u32,

    /// Day of the week to skip, e.g. Saturday (can be specified multiple times)
    #[arg(long = "days-off", value_name = "WEEKDAY", value_parser = schedule::parse_weekday)]
    days_off: Vec<Weekday>,

    /// File to commit to
    #[arg(long, default_value = DEFAULT_FILE_NAME)]
    file_name: String,

    /// Code to write in the file for the final commit
    #[arg(long, default_value = HELLO_WORLD_CPP, hide_default_value = true)]
    code: String,

    /// Fraction of days to randomly skip
    #[arg(long, default_value_t = 0.0, value_parser = parse_fraction)]
    off_fraction: f64,

    /// Path to the git repository (default: current directory)
    #[arg(long)]
    repo_path: Option<PathBuf>,

    /// Path to the commit messages file (default: commit-messages.json in the repository)
    #[arg(long)]
    messages_file_path: Option<PathBuf>,

    /// Use the existing git repository if one is present
    #[arg(long)]
    use_existing_repo: bool,

    /// Country code for public holidays (US, GB, IN, ...), or "world" for all known countries
    #[arg(long, default_value = "US")]
    holiday_country: HolidaySelector,

    /// Seed the random generator for a reproducible history
    #[arg(long)]
    seed: Option<u64>,

    /// Log every commit
    #[arg(short, long)]
    verbose: bool,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("expected a non-negative number, got {s}"))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let repo_path = match cli.repo_path {
        Some(path) => std::path::absolute(path)?,
        None => std::env::current_dir()?,
    };

    let config = Config {
        days: cli.days,
        days_off: cli.days_off.into_iter().collect(),
        file_name: cli.file_name,
        code: cli.code,
        off_fraction: cli.off_fraction,
        repo_path,
        messages_file_path: cli.messages_file_path,
        use_existing_repo: cli.use_existing_repo,
        holiday_country: cli.holiday_country,
        seed: cli.seed,
    };

    // Failures are reported through the log; the exit status stays zero.
    if let Err(e) = backdate::execute(&config) {
        tracing::error!("{:#}", anyhow::Error::from(e));
    }

    Ok(())
}
