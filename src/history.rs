//! Turn a schedule into commits.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::git::{self, ForgedDates, Git};
use crate::messages::MessageBank;
use crate::schedule::CommitTimestamp;

/// Message of the one commit made at the real current time.
pub const FINAL_COMMIT_MESSAGE: &str = "Final commit :sunglasses:";

/// The repository operations the writer needs.
pub trait Repository {
    fn stage(&self, path: &Path) -> Result<(), git::Error>;

    /// Commit the index. `None` dates mean "record the current time".
    fn commit(&self, message: &str, dates: Option<ForgedDates>) -> Result<(), git::Error>;

    /// Short hash of the latest commit.
    fn head(&self) -> Result<String, git::Error>;
}

impl Repository for Git {
    fn stage(&self, path: &Path) -> Result<(), git::Error> {
        Git::stage(self, path)
    }

    fn commit(&self, message: &str, dates: Option<ForgedDates>) -> Result<(), git::Error> {
        Git::commit(self, message, dates)
    }

    fn head(&self) -> Result<String, git::Error> {
        self.head_short()
    }
}

/// What a [`HistoryWriter::run`] accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub scheduled: usize,
    pub committed: usize,
    pub failed: usize,
    pub final_commit: bool,
}

/// Writes one backdated commit per timestamp into a single tracked file.
pub struct HistoryWriter<'a, R> {
    repo: &'a R,
    file_path: PathBuf,
    content: String,
}

impl<'a, R: Repository> HistoryWriter<'a, R> {
    /// `content` is what the tracked file holds after the final commit.
    pub fn new(repo: &'a R, file_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            repo,
            file_path: file_path.into(),
            content: content.into(),
        }
    }

    /// Commit every timestamp in order, then make the final commit.
    ///
    /// A failed commit is logged and skipped; it never stops the run.
    pub fn run<G: Rng + ?Sized>(
        &self,
        timestamps: &[CommitTimestamp],
        messages: &MessageBank,
        rng: &mut G,
    ) -> Summary {
        let mut summary = Summary {
            scheduled: timestamps.len(),
            ..Summary::default()
        };

        for (n, when) in timestamps.iter().enumerate() {
            let token = format!("{:032x}", rng.random::<u128>());
            let message = messages.pick(rng);
            match self.backdated_commit(&token, message, *when) {
                Ok(()) => {
                    summary.committed += 1;
                    let hash = self.head_for_log();
                    tracing::debug!("[{}/{}] {hash} {when} {message}", n + 1, timestamps.len());
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("failed to commit on {when}: {e}");
                }
            }
        }

        match self.final_commit() {
            Ok(()) => {
                summary.final_commit = true;
                let hash = self.head_for_log();
                tracing::debug!("{hash} {FINAL_COMMIT_MESSAGE}");
            }
            Err(e) => tracing::error!("failed to make last commit: {e}"),
        }

        summary
    }

    fn backdated_commit(
        &self,
        token: &str,
        message: &str,
        when: CommitTimestamp,
    ) -> Result<(), Error> {
        self.write_file(token)?;
        self.repo.stage(&self.file_path)?;
        self.repo.commit(message, Some(ForgedDates::at(when.as_datetime())))?;
        Ok(())
    }

    fn final_commit(&self) -> Result<(), Error> {
        self.write_file(&self.content)?;
        self.repo.stage(&self.file_path)?;
        self.repo.commit(FINAL_COMMIT_MESSAGE, None)?;
        Ok(())
    }

    /// The commit already exists at this point; a failed lookup only costs
    /// the hash in the log line.
    fn head_for_log(&self) -> String {
        self.repo.head().unwrap_or_else(|e| {
            tracing::debug!("cannot read HEAD after commit: {e}");
            "????????".to_string()
        })
    }

    fn write_file(&self, content: &str) -> Result<(), Error> {
        std::fs::write(&self.file_path, content).map_err(|e| Error::WriteFile {
            path: self.file_path.display().to_string(),
            source: e,
        })
    }
}

/// Errors for a single commit attempt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}'")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Git(#[from] git::Error),
}
