use clap::Parser;
use log::{error, info};
use repo_grader::{reporter, roster, scheme, GitMaven, GradeError, ScoringScheme};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Clone, build, and grade a batch of student assignment repositories.
///
/// Repositories are expected at `https://github.com/<ORG>/<REPO_PREFIX>-<student>`
/// for each student listed in the roster, and graded against the scoring
/// scheme's rubric using the test reports their build leaves behind.
#[derive(Parser, Debug)]
#[command(name = "rgrader", version, about)]
struct Cli {
    /// GitHub organization owning the student repositories.
    org: String,

    /// Repository name prefix; a student's repository is `<prefix>-<student>`.
    repo_prefix: String,

    /// Scoring scheme JSON file. Its file stem names the test set unless
    /// --test-set overrides it.
    scheme: PathBuf,

    /// Student roster, one identifier per line; `#` starts a comment.
    #[arg(long, default_value = "classlist.txt")]
    roster: PathBuf,

    /// Where the numeric grade summary is written.
    #[arg(long, default_value = "grades.txt")]
    grades: PathBuf,

    /// Where the per-student detail log is written.
    #[arg(long, default_value = "raw_output.txt")]
    detail: PathBuf,

    /// Directory checkouts are cloned into.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Wall-clock limit, in seconds, for each git or mvn invocation.
    #[arg(long, default_value_t = 600)]
    timeout: u64,

    /// Grade existing checkouts and their reports without invoking git or
    /// Maven. Useful for re-grading an already fetched batch.
    #[arg(long)]
    offline: bool,

    /// Test-set name prefixing every report file, when it differs from the
    /// scheme file stem.
    #[arg(long)]
    test_set: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), GradeError> {
    // A scheme that does not load is an operator error hitting every
    // student identically, so it aborts before anyone is fetched.
    let scheme = ScoringScheme::load(&cli.scheme)?;
    let test_set = match &cli.test_set {
        Some(name) => name.clone(),
        None => scheme::default_test_set(&cli.scheme)
            .ok_or_else(|| GradeError::Scheme {
                path: cli.scheme.clone(),
                reason: "cannot derive a test-set name from the file name; pass --test-set"
                    .to_string(),
            })?
            .to_string(),
    };

    let students = roster::read_roster(&cli.roster)?;
    info!("grading {} students against {}", students.len(), test_set);

    let mut provider = GitMaven::new(
        &cli.org,
        &cli.repo_prefix,
        &cli.workdir,
        Duration::from_secs(cli.timeout),
    );
    if cli.offline {
        provider = provider.offline();
    }

    let results = repo_grader::run_batch(&provider, &students, &scheme, &test_set);

    reporter::write_outputs(&cli.grades, &cli.detail, &results)?;
    info!("grade summary written to {}", cli.grades.display());
    info!("detail log written to {}", cli.detail.display());

    print!("{}", reporter::render_summary(&results));
    Ok(())
}
