//! Shared helpers for backdate CLI tests.

use assert_cmd::Command;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated `$HOME` plus a repository directory inside it.
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        Self { root }
    }

    pub fn home(&self) -> &Path {
        self.root.path()
    }

    /// Where the CLI is pointed with `--repo-path`.
    pub fn repo(&self) -> PathBuf {
        self.root.path().join("repo")
    }

    /// A `backdate` invocation run from `$HOME`, with a fixed git identity
    /// and no user git config, pointed at [`Self::repo`].
    pub fn cli(&self) -> Command {
        let mut cmd = self.bare_cli();
        cmd.arg("--repo-path").arg(self.repo());
        cmd
    }

    /// Like [`Self::cli`] but without `--repo-path`.
    pub fn bare_cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("backdate").expect("Failed to locate backdate binary");
        cmd.current_dir(self.home())
            .env("HOME", self.home())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_NAME", "Test User")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test User")
            .env("GIT_COMMITTER_EMAIL", "test@example.com");
        cmd
    }

    /// `git log` lines for the repository, newest first.
    pub fn git_log(&self, args: &[&str]) -> Vec<String> {
        let output = std::process::Command::new("git")
            .arg("log")
            .args(args)
            .current_dir(self.repo())
            .env("HOME", self.home())
            .output()
            .expect("Failed to run git log");
        assert!(output.status.success(), "git log failed");
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.git_log(&["--format=%s"])
    }

    /// Author dates of every backdated commit (all but the newest).
    pub fn backdated_days(&self) -> Vec<NaiveDate> {
        self.git_log(&["--format=%ad", "--date=format-local:%Y-%m-%d"])
            .iter()
            .skip(1)
            .map(|line| NaiveDate::parse_from_str(line, "%Y-%m-%d").expect("date"))
            .collect()
    }
}
