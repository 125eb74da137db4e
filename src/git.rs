//! Git repository operations.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDateTime;

/// Format git accepts for `GIT_AUTHOR_DATE` / `GIT_COMMITTER_DATE`.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Author and committer timestamps recorded on a commit instead of "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForgedDates {
    pub author: NaiveDateTime,
    pub committer: NaiveDateTime,
}

impl ForgedDates {
    /// Use the same timestamp for author and committer.
    pub fn at(when: NaiveDateTime) -> Self {
        Self {
            author: when,
            committer: when,
        }
    }
}

/// How [`Git::open_or_init`] obtained its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Opened,
    Initialized,
}

/// A git repository handle that provides the few operations we need.
pub struct Git {
    root: PathBuf,
    identity: Option<(String, String)>,
}

impl Git {
    /// Open the repository at `root` if `use_existing` is set and one is
    /// already there, otherwise run `git init` (which is harmless on an
    /// existing repository).
    pub fn open_or_init(root: &Path, use_existing: bool) -> Result<(Self, Origin), Error> {
        let io_error = |e| Error::Io {
            path: root.display().to_string(),
            source: e,
        };
        std::fs::create_dir_all(root).map_err(io_error)?;

        // Every git child runs inside `root`, so it must not stay relative.
        let root = std::path::absolute(root).map_err(io_error)?;
        let git = Self {
            root,
            identity: None,
        };

        if use_existing && git.root.join(".git").exists() {
            return Ok((git, Origin::Opened));
        }

        git.run(&["init", "--quiet"])?;
        Ok((git, Origin::Initialized))
    }

    /// Pin the author/committer identity instead of relying on git config.
    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stage a single file, given relative to the root or as an absolute path.
    pub fn stage(&self, path: &Path) -> Result<(), Error> {
        let path = if path.is_absolute() {
            path.strip_prefix(&self.root).unwrap_or(path)
        } else {
            path
        };
        let path = path.to_string_lossy();
        self.run(&["add", "--", &path])
    }

    /// Create a commit with the given message.
    ///
    /// Forged dates are handed to the child process only; without them the
    /// date variables are stripped so git records the current time.
    pub fn commit(&self, message: &str, dates: Option<ForgedDates>) -> Result<(), Error> {
        let args = ["commit", "--quiet", "--no-verify", "--no-gpg-sign", "-m", message];
        let mut cmd = self.command(&args);
        match dates {
            Some(dates) => {
                cmd.env("GIT_AUTHOR_DATE", dates.author.format(GIT_DATE_FORMAT).to_string());
                cmd.env(
                    "GIT_COMMITTER_DATE",
                    dates.committer.format(GIT_DATE_FORMAT).to_string(),
                );
            }
            None => {
                cmd.env_remove("GIT_AUTHOR_DATE");
                cmd.env_remove("GIT_COMMITTER_DATE");
            }
        }

        let output = cmd
            .output()
            .map_err(|e| Error::Exec(format!("git commit: {e}")))?;
        if !output.status.success() {
            return Err(Error::Failed(format!(
                "git commit: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }

    /// Get the short hash of HEAD.
    pub fn head_short(&self) -> Result<String, Error> {
        let hash = self.run_output(&["rev-parse", "HEAD"])?;
        let hash = hash.trim();
        Ok(hash[..8.min(hash.len())].to_string())
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        if let Some((name, email)) = &self.identity {
            cmd.arg("-c")
                .arg(format!("user.name={name}"))
                .arg("-c")
                .arg(format!("user.email={email}"));
        }
        cmd.args(args).current_dir(&self.root);
        cmd
    }

    /// Run a git command that produces no output we care about.
    fn run(&self, args: &[&str]) -> Result<(), Error> {
        let output = self
            .command(args)
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(Error::Failed(format!(
                "git {}: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    /// Run a git command and capture its stdout.
    fn run_output(&self, args: &[&str]) -> Result<String, Error> {
        let output = self
            .command(args)
            .output()
            .map_err(|e| Error::Exec(format!("git {}: {e}", args.first().unwrap_or(&""))))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::Failed(format!("git {}", args.join(" "))))
        }
    }
}

/// Errors from git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to execute: {0}")]
    Exec(String),

    #[error("cannot prepare repository directory '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}
