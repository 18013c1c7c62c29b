use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the grading pipeline.
///
/// Per-student conditions that are expected during a normal run (a report
/// file a student never produced) are not errors; they score as zero. These
/// variants cover genuinely broken inputs and I/O.
#[derive(Debug, Error)]
pub enum GradeError {
    /// The scoring scheme could not be read or does not validate. Fatal to
    /// the whole run: the scheme is operator input shared by every student.
    #[error("cannot load scoring scheme {path:?}: {reason}")]
    Scheme { path: PathBuf, reason: String },

    /// A report file exists but its summary line is absent or unparseable.
    /// Distinct from a missing report, which legitimately scores zero.
    #[error("malformed test report {path:?}: {reason}")]
    MalformedReport { path: PathBuf, reason: String },

    /// The student roster lists no students.
    #[error("student roster {path:?} lists no students")]
    EmptyRoster { path: PathBuf },

    /// Filesystem failure not covered by the conditions above.
    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
