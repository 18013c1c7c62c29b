//! Student roster parsing.
//!
//! A roster is a plain-text file with one student identifier per line.
//! Blank lines and lines starting with `#` are ignored.

use crate::error::GradeError;
use log::warn;
use std::fs;
use std::path::Path;

const COMMENT_MARKER: char = '#';

/// Reads the roster at `path`. An unreadable or empty roster is an operator
/// error: there is nobody to grade.
pub fn read_roster(path: &Path) -> Result<Vec<String>, GradeError> {
    let contents = fs::read_to_string(path).map_err(|source| GradeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let students = parse_roster(&contents);
    if students.is_empty() {
        return Err(GradeError::EmptyRoster {
            path: path.to_path_buf(),
        });
    }
    Ok(students)
}

/// Extracts student identifiers from roster text, preserving order. A
/// duplicated identifier keeps its first occurrence only, so each student
/// gets exactly one result row.
pub fn parse_roster(contents: &str) -> Vec<String> {
    let mut students: Vec<String> = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        if students.iter().any(|known| known == line) {
            warn!("roster lists {line} more than once, keeping the first occurrence");
            continue;
        }
        students.push(line.to_string());
    }
    students
}
