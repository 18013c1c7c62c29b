//! Rendering of the grade summary and the detail log.
//!
//! Two artifacts per run, both truncated on write: a one-line-per-student
//! numeric summary for the gradebook, and a per-student detail log with
//! messages and the item breakdown. Every enrolled student appears exactly
//! once in both, fetched or not.

use crate::batch::{StudentFailure, SubmissionResult};
use crate::error::GradeError;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const BLOCK_SEPARATOR_WIDTH: usize = 80;

/// One `<student>, <grade>` line per student, in batch order.
pub fn render_summary(results: &[SubmissionResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "{}, {:.6}", result.student, result.total);
    }
    out
}

/// One block per student: identifier, total grade, messages, breakdown.
pub fn render_detail(results: &[SubmissionResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "Student: {}", result.student);
        let _ = writeln!(out, "Number grade: {:.6}", result.total);

        if !result.failures.is_empty() || !result.notes.is_empty() {
            let _ = writeln!(out, "Messages:");
            for failure in &result.failures {
                let _ = writeln!(out, "  - {}", describe(failure));
            }
            for note in &result.notes {
                let _ = writeln!(out, "  - {note}");
            }
        }

        if !result.item_scores.is_empty() {
            let _ = writeln!(out, "Breakdown:");
            for item in &result.item_scores {
                let _ = writeln!(out, "  {}: {:.6}", item.identifier, item.points_awarded);
            }
        }

        let _ = writeln!(out, "\n{}\n", "*".repeat(BLOCK_SEPARATOR_WIDTH));
    }
    out
}

/// Writes both artifacts, overwriting whatever a previous run left.
pub fn write_outputs(
    summary_path: &Path,
    detail_path: &Path,
    results: &[SubmissionResult],
) -> Result<(), GradeError> {
    fs::write(summary_path, render_summary(results)).map_err(|source| GradeError::Io {
        path: summary_path.to_path_buf(),
        source,
    })?;
    fs::write(detail_path, render_detail(results)).map_err(|source| GradeError::Io {
        path: detail_path.to_path_buf(),
        source,
    })
}

fn describe(failure: &StudentFailure) -> String {
    match failure {
        StudentFailure::Fetch(detail) => format!("fetch failed: {detail}"),
        StudentFailure::Build(detail) => format!("build failed: {detail}"),
        StudentFailure::Timeout(detail) => format!("timed out: {detail}"),
        StudentFailure::Score(detail) => format!("scoring failed: {detail}"),
    }
}
