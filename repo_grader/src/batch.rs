//! The batch driver: fetch, build, and grade one student at a time.
//!
//! Per-student failures never abort the batch; they are classified here and
//! carried on the student's result. The one batch-fatal condition, a scheme
//! that does not load, is the caller's to handle before the batch starts.

use crate::grader::{self, ItemScore};
use crate::scheme::ScoringScheme;
use crate::workspace::{BuildOutcome, ProviderFailure, SubmissionProvider};
use log::{info, warn};
use std::path::Path;

/// A non-grading failure recorded for one student. Classification lives
/// here; how a failure reads in the detail log is the reporter's business.
#[derive(Debug, PartialEq, Clone)]
pub enum StudentFailure {
    /// The submission could not be fetched.
    Fetch(String),
    /// The submission did not compile.
    Build(String),
    /// Fetch or build exceeded its wall-clock allowance.
    Timeout(String),
    /// A report artifact existed but could not be parsed, so the score is
    /// not trustworthy.
    Score(String),
}

impl From<ProviderFailure> for StudentFailure {
    fn from(failure: ProviderFailure) -> Self {
        match failure {
            ProviderFailure::Fetch(detail) => Self::Fetch(detail),
            ProviderFailure::Build(detail) => Self::Build(detail),
            ProviderFailure::Timeout { command, limit } => {
                Self::Timeout(format!("{command} exceeded {}s", limit.as_secs()))
            }
        }
    }
}

/// Everything recorded about one student in one grading run. Created when
/// the student's turn starts, finalized once all items are scored, then
/// handed to the reporter.
#[derive(Debug, PartialEq, Clone)]
pub struct SubmissionResult {
    pub student: String,
    /// Per-item breakdown, in scheme order. Empty when scoring never ran.
    pub item_scores: Vec<ItemScore>,
    pub total: f64,
    /// Free-text notes, e.g. "built with test failures".
    pub notes: Vec<String>,
    pub failures: Vec<StudentFailure>,
}

impl SubmissionResult {
    /// A result with no grading done yet: zero total, empty breakdown.
    fn ungraded(student: &str) -> Self {
        Self {
            student: student.to_string(),
            item_scores: Vec::new(),
            total: 0.0,
            notes: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Grades one already-fetched submission against the shared scheme.
///
/// A malformed report makes the whole score untrustworthy, so the student
/// keeps a zero total and a recorded failure instead of a silent
/// part-score.
pub fn grade_submission(
    student: &str,
    scheme: &ScoringScheme,
    submission_root: &Path,
    test_set: &str,
) -> SubmissionResult {
    let mut result = SubmissionResult::ungraded(student);
    match grader::score(scheme, submission_root, test_set) {
        Ok(score) => {
            result.item_scores = score.items;
            result.total = score.total;
        }
        Err(err) => {
            warn!("scoring {student} failed: {err}");
            result.failures.push(StudentFailure::Score(err.to_string()));
        }
    }
    result
}

/// Runs the full batch sequentially, in roster order. Every enrolled
/// student gets exactly one result, fetched or not.
pub fn run_batch(
    provider: &impl SubmissionProvider,
    students: &[String],
    scheme: &ScoringScheme,
    test_set: &str,
) -> Vec<SubmissionResult> {
    let mut results = Vec::with_capacity(students.len());
    for student in students {
        info!("grading {student}");
        results.push(grade_student(provider, student, scheme, test_set));
    }
    results
}

fn grade_student(
    provider: &impl SubmissionProvider,
    student: &str,
    scheme: &ScoringScheme,
    test_set: &str,
) -> SubmissionResult {
    let submission_root = match provider.fetch(student) {
        Ok(root) => root,
        Err(failure) => {
            warn!("fetch failed for {student}");
            let mut result = SubmissionResult::ungraded(student);
            result.failures.push(failure.into());
            return result;
        }
    };

    let mut build_failures: Vec<StudentFailure> = Vec::new();
    let mut notes: Vec<String> = Vec::new();
    match provider.build(&submission_root) {
        Ok(BuildOutcome::Clean) => {}
        Ok(BuildOutcome::TestFailures) => {
            notes.push("built with test failures and/or errors".to_string());
        }
        Err(failure) => {
            warn!("build failed for {student}");
            build_failures.push(failure.into());
        }
    }

    // Grading proceeds even when the build failed: reports from modules
    // that did compile still earn their credit.
    let mut result = grade_submission(student, scheme, &submission_root, test_set);
    result.notes.extend(notes);
    build_failures.extend(result.failures);
    result.failures = build_failures;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::write_dummy_report;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// What the stub provider does for one student.
    enum Behavior {
        FetchFails,
        BuildTimesOut,
        CompileError,
        TestFailures,
        Clean,
    }

    struct StubProvider {
        workdir: PathBuf,
        behaviors: HashMap<String, Behavior>,
    }

    impl StubProvider {
        fn new(workdir: &Path) -> Self {
            Self {
                workdir: workdir.to_path_buf(),
                behaviors: HashMap::new(),
            }
        }

        fn with(mut self, student: &str, behavior: Behavior) -> Self {
            self.behaviors.insert(student.to_string(), behavior);
            self
        }

        fn behavior(&self, student: &str) -> &Behavior {
            self.behaviors
                .get(student)
                .unwrap_or_else(|| panic!("no behavior programmed for {student}"))
        }
    }

    impl SubmissionProvider for StubProvider {
        fn fetch(&self, student: &str) -> Result<PathBuf, ProviderFailure> {
            if matches!(self.behavior(student), Behavior::FetchFails) {
                return Err(ProviderFailure::Fetch(format!(
                    "no repository for {student}"
                )));
            }
            Ok(self.workdir.join(student))
        }

        fn build(&self, submission_root: &Path) -> Result<BuildOutcome, ProviderFailure> {
            let student = submission_root.file_name().unwrap().to_str().unwrap();
            match self.behavior(student) {
                Behavior::FetchFails => unreachable!("fetch already failed"),
                Behavior::BuildTimesOut => Err(ProviderFailure::Timeout {
                    command: "mvn test".to_string(),
                    limit: Duration::from_secs(600),
                }),
                Behavior::CompileError => {
                    Err(ProviderFailure::Build("compilation failure".to_string()))
                }
                Behavior::TestFailures => Ok(BuildOutcome::TestFailures),
                Behavior::Clean => Ok(BuildOutcome::Clean),
            }
        }
    }

    fn scheme() -> ScoringScheme {
        serde_json::from_str(
            r#"{ "questions": [
                { "java_file": "Dog.java", "test_file": "DogTest", "points": 10 },
                { "java_file": "Cat.java", "test_file": "CatTest", "points": 5 }
            ] }"#,
        )
        .unwrap()
    }

    fn passing_summary(run: u32) -> String {
        format!("Tests run: {run}, Failures: 0, Errors: 0, Skipped: 0")
    }

    #[test]
    fn should_emit_one_result_per_enrolled_student_in_roster_order() {
        // Three students: one fetch-fails, one builds with test failures and
        // is partially graded, one fully passes.
        let dir = TempDir::new().unwrap();

        let partial = dir.path().join("bob");
        write_dummy_report(&partial, "week_3", "DogTest", &passing_summary(5));

        let passing = dir.path().join("carol");
        write_dummy_report(&passing, "week_3", "DogTest", &passing_summary(5));
        write_dummy_report(&passing, "week_3", "CatTest", &passing_summary(2));

        let provider = StubProvider::new(dir.path())
            .with("alice", Behavior::FetchFails)
            .with("bob", Behavior::TestFailures)
            .with("carol", Behavior::Clean);
        let students: Vec<String> = ["alice", "bob", "carol"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let results = run_batch(&provider, &students, &scheme(), "week_3");

        assert_eq!(results.len(), 3);

        assert_eq!(results[0].student, "alice");
        assert_eq!(results[0].total, 0.0);
        assert!(matches!(results[0].failures[..], [StudentFailure::Fetch(_)]));

        assert_eq!(results[1].student, "bob");
        assert_eq!(results[1].total, 10.0);
        assert_eq!(results[1].notes, ["built with test failures and/or errors"]);

        assert_eq!(results[2].student, "carol");
        assert_eq!(results[2].total, 15.0);
        assert!(results[2].failures.is_empty());
        assert!(results[2].notes.is_empty());
    }

    #[test]
    fn should_grade_best_effort_after_a_compile_error() {
        // A compile error leaves stale reports from an earlier module; they
        // still earn credit, and the build failure stays on record.
        let dir = TempDir::new().unwrap();
        let checkout = dir.path().join("dave");
        write_dummy_report(&checkout, "week_3", "DogTest", &passing_summary(5));

        let provider = StubProvider::new(dir.path()).with("dave", Behavior::CompileError);
        let results = run_batch(&provider, &["dave".to_string()], &scheme(), "week_3");

        assert_eq!(results[0].total, 10.0);
        assert!(matches!(results[0].failures[..], [StudentFailure::Build(_)]));
    }

    #[test]
    fn should_record_a_timeout_as_its_own_failure_kind() {
        let dir = TempDir::new().unwrap();
        let provider = StubProvider::new(dir.path()).with("erin", Behavior::BuildTimesOut);
        let results = run_batch(&provider, &["erin".to_string()], &scheme(), "week_3");

        assert_eq!(results[0].total, 0.0);
        assert!(matches!(
            results[0].failures[..],
            [StudentFailure::Timeout(_)]
        ));
    }

    #[test_log::test]
    fn should_zero_the_total_when_a_report_is_malformed() {
        let dir = TempDir::new().unwrap();
        let checkout = dir.path().join("frank");
        write_dummy_report(&checkout, "week_3", "DogTest", "BUILD SUCCESS");

        let provider = StubProvider::new(dir.path()).with("frank", Behavior::Clean);
        let results = run_batch(&provider, &["frank".to_string()], &scheme(), "week_3");

        assert_eq!(results[0].total, 0.0);
        assert!(results[0].item_scores.is_empty());
        assert!(matches!(results[0].failures[..], [StudentFailure::Score(_)]));
    }

    #[test]
    fn should_keep_build_failures_ahead_of_scoring_failures() {
        let dir = TempDir::new().unwrap();
        let checkout = dir.path().join("grace");
        write_dummy_report(&checkout, "week_3", "DogTest", "garbled");

        let provider = StubProvider::new(dir.path()).with("grace", Behavior::CompileError);
        let results = run_batch(&provider, &["grace".to_string()], &scheme(), "week_3");

        assert!(matches!(
            results[0].failures[..],
            [StudentFailure::Build(_), StudentFailure::Score(_)]
        ));
    }
}
