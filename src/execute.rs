//! Run the whole history synthesis.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::git::{self, Git, Origin};
use crate::history::{HistoryWriter, Summary};
use crate::holidays::{self, Calendar, HolidayOracle, HolidaySelector};
use crate::messages::MessageBank;
use crate::schedule::{self, ScheduleConfig};

/// Default name of the tracked file.
pub const DEFAULT_FILE_NAME: &str = "main.cpp";

/// Default message bank file, looked up inside the repository.
pub const DEFAULT_MESSAGES_FILE: &str = "commit-messages.json";

/// Content of the tracked file after the final commit.
pub const HELLO_WORLD_CPP: &str = "#include <iostream>\nint main()\n{\n  std::cout << \"Hello World!\" << std::endl;\n  return 0;\n}\n";

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub days: u32,
    pub days_off: HashSet<Weekday>,
    pub file_name: String,
    pub code: String,
    pub off_fraction: f64,
    pub repo_path: PathBuf,
    /// Defaults to [`DEFAULT_MESSAGES_FILE`] inside `repo_path`.
    pub messages_file_path: Option<PathBuf>,
    pub use_existing_repo: bool,
    pub holiday_country: HolidaySelector,
    /// Seed for a reproducible run; fresh OS entropy otherwise.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            days: 100,
            days_off: HashSet::new(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            code: HELLO_WORLD_CPP.to_string(),
            off_fraction: 0.0,
            repo_path: PathBuf::from("."),
            messages_file_path: None,
            use_existing_repo: false,
            holiday_country: HolidaySelector::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn messages_file_path(&self) -> PathBuf {
        self.messages_file_path
            .clone()
            .unwrap_or_else(|| self.repo_path.join(DEFAULT_MESSAGES_FILE))
    }
}

/// Synthesize the history described by `config` using today's date and the
/// built-in holiday calendar.
pub fn execute(config: &Config) -> Result<Summary, Error> {
    execute_with(config, &Calendar::new(), Local::now().date_naive(), None)
}

/// Like [`execute`], with the holiday oracle, "today", and optionally the
/// git identity supplied by the caller.
pub fn execute_with(
    config: &Config,
    oracle: &dyn HolidayOracle,
    today: NaiveDate,
    identity: Option<(&str, &str)>,
) -> Result<Summary, Error> {
    let schedule_config =
        ScheduleConfig::new(config.days, config.days_off.clone(), config.off_fraction)?
            .with_holiday_country(config.holiday_country.clone());

    let (repo, origin) = Git::open_or_init(&config.repo_path, config.use_existing_repo)
        .map_err(Error::OpenRepository)?;
    let repo = match identity {
        Some((name, email)) => repo.with_identity(name, email),
        None => repo,
    };
    match origin {
        Origin::Opened => {
            tracing::info!("using existing git repository at {}", repo.root().display())
        }
        Origin::Initialized => {
            tracing::info!("initialized new git repository at {}", repo.root().display())
        }
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let messages = MessageBank::load_or_default(&config.messages_file_path(), &mut rng);

    let holidays = match schedule_config.window(today) {
        Some((first, last)) => {
            let years = first.year()..=last.year();
            holidays::resolve(oracle, schedule_config.holiday_country(), years)
        }
        None => HashSet::new(),
    };

    let timestamps = schedule::generate(&schedule_config, &holidays, today, &mut rng);
    tracing::info!(
        "scheduled {} commits over the last {} days",
        timestamps.len(),
        schedule_config.days()
    );

    let writer = HistoryWriter::new(&repo, repo.root().join(&config.file_name), &config.code);
    let summary = writer.run(&timestamps, &messages, &mut rng);

    if summary.failed > 0 {
        tracing::info!(
            "made {} of {} backdated commits",
            summary.committed,
            summary.scheduled
        );
    }
    if summary.final_commit {
        tracing::info!(
            "history written: {} backdated commits plus today's",
            summary.committed
        );
    }
    Ok(summary)
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that abort a run before any commit is attempted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid schedule")]
    InvalidConfig(#[from] schedule::ConfigError),

    #[error("failed to initialize or open git repository")]
    OpenRepository(#[source] git::Error),
}
