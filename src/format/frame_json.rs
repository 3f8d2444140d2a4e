//! Per-frame annotation JSON files.
//!
//! A file is a JSON array of objects with keys `box`, `class` and optionally
//! `class_detailed`, `detailed_caption` and `score`. Files are written with
//! two-space indentation. Unknown keys are not preserved.

use std::path::Path;

use serde_json::Value;

use crate::format::error::FormatError;
use crate::model::Annotation;

/// Parse annotation file contents.
///
/// A file that is not a JSON array is an error. Individual entries that do
/// not parse are skipped with a warning so one bad entry does not hide the rest.
pub fn parse_annotations(json: &str) -> Result<Vec<Annotation>, FormatError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(json)? else {
        return Err(FormatError::invalid_format(
            "expected a JSON array of annotations",
        ));
    };

    let mut annotations = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Annotation>(entry) {
            Ok(ann) => annotations.push(ann),
            Err(e) => log::warn!("Skipping malformed annotation {}: {}", i, e),
        }
    }
    Ok(annotations)
}

/// Number of entries in annotation file contents, without validating them.
pub fn count_entries(json: &str) -> Result<usize, FormatError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Array(entries) => Ok(entries.len()),
        _ => Err(FormatError::invalid_format(
            "expected a JSON array of annotations",
        )),
    }
}

/// Serialize annotations in the on-disk layout.
pub fn to_json(annotations: &[Annotation]) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(annotations)?)
}

pub fn read_file(path: &Path) -> Result<Vec<Annotation>, FormatError> {
    let json = std::fs::read_to_string(path)?;
    parse_annotations(&json)
}

pub fn count_file(path: &Path) -> Result<usize, FormatError> {
    let json = std::fs::read_to_string(path)?;
    count_entries(&json)
}

pub fn write_file(path: &Path, annotations: &[Annotation]) -> Result<(), FormatError> {
    let json = to_json(annotations)?;
    std::fs::write(path, json)?;
    Ok(())
}
