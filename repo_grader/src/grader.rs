//! The scoring engine: turns test outcomes into weighted points.
//!
//! Credit is linear partial credit: an item's points are split evenly over
//! its executed test cases, and the student keeps the share that neither
//! failed nor errored. Failing and erroring tests are penalized alike.

use crate::error::GradeError;
use crate::report;
use crate::scheme::{GradedItem, ScoringScheme};
use log::warn;
use std::path::Path;

/// Points awarded to one graded item.
#[derive(Debug, PartialEq, Clone)]
pub struct ItemScore {
    /// The source file the item grades.
    pub identifier: String,
    /// Awarded points, in `[0, points_available]`.
    pub points_awarded: f64,
}

/// The full outcome of scoring one submission: per-item breakdown in scheme
/// order, plus the sum.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct SubmissionScore {
    pub items: Vec<ItemScore>,
    pub total: f64,
}

/// Scores every item of `scheme` against the reports under
/// `submission_root`, in scheme order.
///
/// Pure with respect to its inputs: re-scoring the same reports against the
/// same scheme yields the same breakdown. A malformed report aborts the
/// whole scoring of this submission; the caller decides what that means for
/// the student.
pub fn score(
    scheme: &ScoringScheme,
    submission_root: &Path,
    test_set: &str,
) -> Result<SubmissionScore, GradeError> {
    let mut items = Vec::with_capacity(scheme.items().len());
    let mut total = 0.0;
    for item in scheme.items() {
        let points_awarded = score_item(item, submission_root, test_set)?;
        total += points_awarded;
        items.push(ItemScore {
            identifier: item.identifier().to_string(),
            points_awarded,
        });
    }
    Ok(SubmissionScore { items, total })
}

/// Accumulates the item's report sources into one outcome and applies the
/// partial-credit rule.
fn score_item(
    item: &GradedItem,
    submission_root: &Path,
    test_set: &str,
) -> Result<f64, GradeError> {
    // Accumulated in u64: a parseable report may still carry counts near
    // u32::MAX, and the anomaly arithmetic below must clamp, not overflow.
    let mut run: u64 = 0;
    let mut failures: u64 = 0;
    let mut errors: u64 = 0;
    for source in item.sources() {
        let outcome = report::read_outcome(submission_root, test_set, source)?;
        run += u64::from(outcome.run);
        failures += u64::from(outcome.failures);
        errors += u64::from(outcome.errors);
    }

    // No tests executed means no credit. This also covers the item whose
    // reports are all missing.
    if run == 0 {
        return Ok(0.0);
    }

    let not_passing = failures + errors;
    if not_passing > run {
        warn!(
            "item {}: {failures} failures + {errors} errors exceed {run} tests run, \
             clamping to zero passing",
            item.identifier(),
        );
    }
    let passing = run.saturating_sub(not_passing);
    Ok(item.points_available() / run as f64 * passing as f64)
}
