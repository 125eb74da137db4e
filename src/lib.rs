//! Backdate: fill a git repository with a plausible commit history.
//!
//! Backdate picks a random schedule of commit times over the last N days,
//! skipping chosen weekdays, public holidays, and a random share of days,
//! then writes one backdated commit per scheduled time followed by a final
//! commit dated now.
//!
//! # Architecture
//!
//! - **Schedule**: Decide which days get commits and at what times
//! - **Holidays**: Resolve public holidays to exclude
//! - **Messages**: Load the commit message bank
//! - **History**: Turn the schedule into real commits
//! - **Execute**: Wire the pieces together for one run

mod execute;
pub mod git;
pub mod history;
pub mod holidays;
pub mod messages;
pub mod schedule;

pub use execute::{
    Config, DEFAULT_FILE_NAME, DEFAULT_MESSAGES_FILE, Error, HELLO_WORLD_CPP, execute,
    execute_with,
};
pub use history::{HistoryWriter, Summary};
pub use holidays::HolidaySelector;
pub use schedule::{CommitTimestamp, ScheduleConfig};
