//! Batch collection and grading of student programming assignments.
//!
//! Each student in a roster has a submission repository that is fetched,
//! built, and graded against a declarative scoring scheme: every graded
//! item maps one source file to the test reports that assess it and to a
//! point value, and earns partial credit proportional to its passing
//! tests. Results come out as a numeric grade summary and a per-student
//! detail log.

pub mod batch;
pub mod error;
pub mod grader;
pub mod report;
pub mod reporter;
pub mod roster;
pub mod scheme;
pub mod workspace;

pub use batch::{grade_submission, run_batch, StudentFailure, SubmissionResult};
pub use error::GradeError;
pub use grader::{score, ItemScore, SubmissionScore};
pub use report::TestOutcome;
pub use scheme::{GradedItem, ScoringScheme};
pub use workspace::{BuildOutcome, GitMaven, ProviderFailure, SubmissionProvider};
