//! Locating and parsing per-test-class execution reports.
//!
//! A report is the plain-text file the build/test tool writes for one test
//! class. The reader depends only on the textual contract (a labelled
//! summary line at a fixed position), not on the tool that produced it.

use crate::error::GradeError;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Subdirectory of a submission checkout where the build tool drops its
/// plain-text test reports. Matches the Maven surefire layout.
pub const REPORTS_SUBDIR: &str = "target/surefire-reports";

/// Zero-based index of the summary line inside a report file.
const SUMMARY_LINE_INDEX: usize = 3;

/// Counts extracted from one test report.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct TestOutcome {
    /// Test cases executed.
    pub run: u32,
    /// Test cases whose assertions did not hold.
    pub failures: u32,
    /// Test cases that aborted before their assertions could run.
    pub errors: u32,
}

impl TestOutcome {
    /// Outcome of a report that was never produced: zero tests executed.
    pub const ZERO: Self = Self {
        run: 0,
        failures: 0,
        errors: 0,
    };
}

/// Reads the report for one `(test_set, source)` pair under
/// `submission_root`.
///
/// A missing report file is not an error: the student never produced that
/// test class, so zero tests executed and the item scores zero. A report
/// that exists but whose summary line cannot be parsed is a malformed
/// artifact and must not masquerade as a zero score.
pub fn read_outcome(
    submission_root: &Path,
    test_set: &str,
    source: &str,
) -> Result<TestOutcome, GradeError> {
    let path = submission_root
        .join(REPORTS_SUBDIR)
        .join(format!("{test_set}.{source}.txt"));

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no report at {}, counting zero tests run", path.display());
            return Ok(TestOutcome::ZERO);
        }
        Err(source) => return Err(GradeError::Io { path, source }),
    };

    let Some(line) = contents.lines().nth(SUMMARY_LINE_INDEX) else {
        return Err(GradeError::MalformedReport {
            path,
            reason: format!("no summary line at line {}", SUMMARY_LINE_INDEX + 1),
        });
    };
    parse_summary_line(line).map_err(|reason| GradeError::MalformedReport { path, reason })
}

/// Extracts the three labelled counters from a summary line of the form
///
/// ```text
/// Tests run: 5, Failures: 1, Errors: 0, Skipped: 0, Time elapsed: 0.04 s ...
/// ```
///
/// Free text may surround the labelled fields, but the three labels must
/// appear in this order. The labels are taken at face value: `Failures:`
/// counts assertion failures and `Errors:` counts aborted tests.
fn parse_summary_line(line: &str) -> Result<TestOutcome, String> {
    let (run, rest) = labelled_count(line, "Tests run:")?;
    let (failures, rest) = labelled_count(rest, "Failures:")?;
    let (errors, _) = labelled_count(rest, "Errors:")?;
    Ok(TestOutcome {
        run,
        failures,
        errors,
    })
}

/// Finds `label` in `text` and parses the unsigned integer directly after
/// it. Returns the count and the remainder of the line.
fn labelled_count<'a>(text: &'a str, label: &str) -> Result<(u32, &'a str), String> {
    let start = text
        .find(label)
        .ok_or_else(|| format!("label `{label}` missing"))?
        + label.len();
    let rest = text[start..].trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return Err(format!("label `{label}` not followed by a count"));
    }
    let count = rest[..digits]
        .parse()
        .map_err(|_| format!("count after `{label}` out of range"))?;
    Ok((count, &rest[digits..]))
}

#[cfg(test)]
pub(crate) fn write_dummy_report(root: &Path, test_set: &str, source: &str, summary: &str) {
    let dir = root.join(REPORTS_SUBDIR);
    fs::create_dir_all(&dir).unwrap();
    let contents = format!(
        "-------------------------------------------------------\n\
          T E S T S\n\
         -------------------------------------------------------\n\
         {summary}\n"
    );
    fs::write(dir.join(format!("{test_set}.{source}.txt")), contents).unwrap();
}
