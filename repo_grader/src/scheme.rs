//! Loading and validation of scoring schemes.
//!
//! A scheme is the declarative rubric for one assignment: an ordered list of
//! graded items, each tying a source file to the test classes that grade it
//! and to a point value. It is loaded once per run from a file the operator
//! provides and shared read-only across every student, so a tampered copy
//! inside a student checkout is never consulted.

use crate::error::GradeError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The test-report sources backing one graded item. The scheme file may
/// give a single name or a list; both forms are accepted.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum ReportSources {
    One(String),
    Many(Vec<String>),
}

impl ReportSources {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        };
        names.iter().map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(names) => names.is_empty(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct GradedItemUnchecked {
    java_file: String,
    test_file: ReportSources,
    points: f64,
}

/// One gradable unit: a source file worth a fixed number of points,
/// assessed via one or more test-report sources.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(try_from = "GradedItemUnchecked")]
pub struct GradedItem {
    java_file: String,
    test_file: ReportSources,
    points: f64,
}

impl GradedItem {
    fn build(
        java_file: String,
        test_file: ReportSources,
        points: f64,
    ) -> Result<Self, &'static str> {
        if java_file.trim().is_empty() {
            return Err("graded item must name the file it grades");
        }
        if test_file.is_empty() {
            return Err("graded item must have at least one test report source");
        }
        if test_file.iter().any(|name| name.trim().is_empty()) {
            return Err("test report source names must not be empty");
        }
        if !(points.is_finite() && points >= 0.0) {
            return Err("points must be a non-negative finite number");
        }
        Ok(Self {
            java_file,
            test_file,
            points,
        })
    }

    /// The source file this item grades.
    pub fn identifier(&self) -> &str {
        &self.java_file
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.test_file.iter()
    }

    pub fn points_available(&self) -> f64 {
        self.points
    }
}

impl TryFrom<GradedItemUnchecked> for GradedItem {
    type Error = &'static str;

    fn try_from(value: GradedItemUnchecked) -> Result<Self, Self::Error> {
        let GradedItemUnchecked {
            java_file,
            test_file,
            points,
        } = value;
        GradedItem::build(java_file, test_file, points)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct ScoringSchemeUnchecked {
    questions: Vec<GradedItem>,
}

/// The full rubric for one assignment, in grading order.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(try_from = "ScoringSchemeUnchecked")]
pub struct ScoringScheme {
    questions: Vec<GradedItem>,
}

impl ScoringScheme {
    /// Loads and validates the scheme at `path`. Any failure here is an
    /// operator error affecting every student identically, so callers abort
    /// the batch rather than grading against a broken rubric.
    pub fn load(path: &Path) -> Result<Self, GradeError> {
        let contents = fs::read_to_string(path).map_err(|err| GradeError::Scheme {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|err| GradeError::Scheme {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// The graded items, in the order the rubric declares them.
    pub fn items(&self) -> &[GradedItem] {
        &self.questions
    }
}

impl TryFrom<ScoringSchemeUnchecked> for ScoringScheme {
    type Error = &'static str;

    fn try_from(value: ScoringSchemeUnchecked) -> Result<Self, Self::Error> {
        if value.questions.is_empty() {
            return Err("at least one graded item is expected");
        }
        Ok(Self {
            questions: value.questions,
        })
    }
}

/// Derives the test-set name from the scheme file name: `week_3.json`
/// names the test set `week_3`, which prefixes every report file name.
pub fn default_test_set(scheme_path: &Path) -> Option<&str> {
    scheme_path.file_stem()?.to_str()
}
