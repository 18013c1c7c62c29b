//! Fetching and building student submissions.
//!
//! The grading pipeline only consumes report files; this module is the
//! capability that produces them. It sits behind a trait so the batch driver
//! can be exercised without network access or a Maven toolchain.

use log::{debug, warn};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};
use std::{io, thread};

/// How often a running external command is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How much of a command's stderr is kept in failure detail.
const STDERR_DETAIL_LIMIT: usize = 400;

/// Why a submission could not be fetched or built. Always per student,
/// never fatal to the batch.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ProviderFailure {
    /// The submission could not be made available locally.
    Fetch(String),
    /// The project did not compile, so no fresh reports exist.
    Build(String),
    /// An external command exceeded its wall-clock allowance.
    Timeout { command: String, limit: Duration },
}

/// What a completed build left behind.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BuildOutcome {
    /// Compiled and every test passed.
    Clean,
    /// Compiled, but some tests failed or errored. Reports exist, so the
    /// submission is still gradable.
    TestFailures,
}

/// The capability the batch driver depends on: turn a student identifier
/// into a local checkout, and a checkout into test reports.
pub trait SubmissionProvider {
    /// Makes the student's submission available locally and returns the
    /// checkout root.
    fn fetch(&self, student: &str) -> Result<PathBuf, ProviderFailure>;

    /// Compiles the checkout and runs its tests, populating the report
    /// directory as a side effect.
    fn build(&self, submission_root: &Path) -> Result<BuildOutcome, ProviderFailure>;
}

/// Fetches per-student GitHub repositories named `<prefix>-<student>` under
/// one organization, and builds them with Maven. Checkouts land in
/// `<workdir>/<prefix>/<student>`.
pub struct GitMaven {
    org: String,
    repo_prefix: String,
    workdir: PathBuf,
    timeout: Duration,
    offline: bool,
}

impl GitMaven {
    pub fn new(org: &str, repo_prefix: &str, workdir: &Path, timeout: Duration) -> Self {
        Self {
            org: org.to_string(),
            repo_prefix: repo_prefix.to_string(),
            workdir: workdir.to_path_buf(),
            timeout,
            offline: false,
        }
    }

    /// Offline mode: grade existing checkouts and the reports already in
    /// them, invoking neither git nor Maven. Meant for re-grading a batch
    /// that was already fetched and built.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn checkout_dir(&self, student: &str) -> PathBuf {
        self.workdir.join(&self.repo_prefix).join(student)
    }

    fn repo_url(&self, student: &str) -> String {
        format!(
            "https://github.com/{}/{}-{}",
            self.org, self.repo_prefix, student
        )
    }
}

impl SubmissionProvider for GitMaven {
    fn fetch(&self, student: &str) -> Result<PathBuf, ProviderFailure> {
        let destination = self.checkout_dir(student);
        if self.offline {
            if destination.is_dir() {
                return Ok(destination);
            }
            return Err(ProviderFailure::Fetch(format!(
                "no existing checkout at {}",
                destination.display()
            )));
        }

        let url = self.repo_url(student);
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--recursive", url.as_str()])
            .arg(&destination);
        let output = run_with_timeout(cmd, self.timeout).map_err(|err| match err {
            CommandError::Timeout(limit) => ProviderFailure::Timeout {
                command: format!("git clone {url}"),
                limit,
            },
            CommandError::Io(err) => ProviderFailure::Fetch(format!("cannot run git: {err}")),
        })?;
        if output.status.success() {
            return Ok(destination);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.contains("already exists and is not an empty directory") {
            // A stale checkout would silently grade old code.
            format!(
                "checkout already exists at {}; delete it, or pass offline mode to grade it as-is",
                destination.display()
            )
        } else if stderr.contains("Repository not found") {
            format!("no repository at {url}")
        } else {
            format!("git clone {url} failed: {}", truncate(&stderr))
        };
        Err(ProviderFailure::Fetch(detail))
    }

    fn build(&self, submission_root: &Path) -> Result<BuildOutcome, ProviderFailure> {
        if self.offline {
            debug!(
                "offline mode: grading reports already under {}",
                submission_root.display()
            );
            return Ok(BuildOutcome::Clean);
        }

        let mut cmd = Command::new("mvn");
        cmd.args(["-q", "-f"]).arg(submission_root).arg("test");
        let output = run_with_timeout(cmd, self.timeout).map_err(|err| match err {
            CommandError::Timeout(limit) => ProviderFailure::Timeout {
                command: format!("mvn test in {}", submission_root.display()),
                limit,
            },
            CommandError::Io(err) => ProviderFailure::Build(format!("cannot run mvn: {err}")),
        })?;
        if output.status.success() {
            return Ok(BuildOutcome::Clean);
        }

        // Maven exits non-zero both for compile errors and for test
        // failures; only the latter leaves reports behind.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("There are test failures") {
            warn!(
                "{} built with test failures and/or errors",
                submission_root.display()
            );
            return Ok(BuildOutcome::TestFailures);
        }
        Err(ProviderFailure::Build(format!(
            "mvn test failed: {}",
            truncate(&String::from_utf8_lossy(&output.stderr))
        )))
    }
}

#[derive(Debug)]
enum CommandError {
    Io(io::Error),
    Timeout(Duration),
}

/// Runs `cmd` to completion with captured output, killing the child if it
/// outlives `limit`. External fetch/build tools give no completion
/// guarantee, and one hung clone must not stall the whole batch.
fn run_with_timeout(mut cmd: Command, limit: Duration) -> Result<Output, CommandError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(CommandError::Io)?;

    // Drain the pipes on their own threads; a chatty child would otherwise
    // fill a pipe and never exit.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + limit;
    let status = loop {
        match child.try_wait().map_err(CommandError::Io)? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout(limit));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn truncate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(STDERR_DETAIL_LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn should_derive_checkout_dir_and_repo_url_from_the_naming_convention() {
        let provider = GitMaven::new(
            "mctc-itec",
            "assignment_3_functions",
            Path::new("/tmp/grading"),
            Duration::from_secs(600),
        );
        assert_eq!(
            provider.checkout_dir("alice"),
            PathBuf::from("/tmp/grading/assignment_3_functions/alice")
        );
        assert_eq!(
            provider.repo_url("alice"),
            "https://github.com/mctc-itec/assignment_3_functions-alice"
        );
    }

    #[test]
    fn should_fetch_an_existing_checkout_in_offline_mode() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("week_3/alice")).unwrap();
        let provider =
            GitMaven::new("org", "week_3", dir.path(), Duration::from_secs(600)).offline();
        assert_eq!(
            provider.fetch("alice").unwrap(),
            dir.path().join("week_3/alice")
        );
    }

    #[test]
    fn should_fail_an_offline_fetch_without_a_checkout() {
        let dir = TempDir::new().unwrap();
        let provider =
            GitMaven::new("org", "week_3", dir.path(), Duration::from_secs(600)).offline();
        let failure = provider.fetch("alice").unwrap_err();
        assert!(
            matches!(failure, ProviderFailure::Fetch(ref detail)
                if detail.contains("no existing checkout")),
            "got {failure:?}"
        );
    }

    #[test]
    fn should_skip_the_build_in_offline_mode() {
        let dir = TempDir::new().unwrap();
        let provider =
            GitMaven::new("org", "week_3", dir.path(), Duration::from_secs(600)).offline();
        assert_eq!(provider.build(dir.path()).unwrap(), BuildOutcome::Clean);
    }

    #[test]
    fn should_truncate_long_failure_detail() {
        let long = "x".repeat(STDERR_DETAIL_LIMIT * 2);
        let truncated = truncate(&long);
        assert_eq!(truncated.len(), STDERR_DETAIL_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }

    #[cfg(unix)]
    mod external_commands {
        use super::*;

        #[test]
        fn should_capture_output_of_a_finished_command() {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", "echo out; echo err >&2"]);
            let output = run_with_timeout(cmd, Duration::from_secs(5))
                .unwrap_or_else(|_| panic!("command did not finish"));
            assert!(output.status.success());
            assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
            assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
        }

        #[test]
        fn should_kill_a_command_that_outlives_its_allowance() {
            let mut cmd = Command::new("sleep");
            cmd.arg("30");
            let started = Instant::now();
            let result = run_with_timeout(cmd, Duration::from_millis(200));
            assert!(matches!(result, Err(CommandError::Timeout(_))));
            assert!(started.elapsed() < Duration::from_secs(10));
        }
    }
}
