//! Incremental append to a JSON array file
//!
//! The file is always empty or a well-formed array laid out as
//!
//! ```text
//! [
//!   {...},
//!   {...}
//! ]
//! ```
//!
//! Appending seeks to the closing `\n]`, writes the delimiter, the new
//! element and a fresh closing marker in one write. Earlier elements are
//! never read or rewritten. A file holding only the opening `[\n` counts as
//! empty. An interrupted append can leave the file without its closing
//! marker; later appends then refuse the file instead of corrupting it
//! further.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::WriteError;

const START_ARRAY: &[u8] = b"[\n";
const END_ARRAY: &[u8] = b"\n]";
const INDENT: &[u8] = b"  ";
const OBJECT_DELIMITER: &[u8] = b",\n  ";

/// Pretty-print an element at array depth (two-space indent, nested lines
/// shifted by one level)
fn serialize_element<T: Serialize + ?Sized>(value: &T) -> Result<String, WriteError> {
    let pretty = serde_json::to_string_pretty(value)?;
    Ok(pretty.replace('\n', "\n  "))
}

/// Append one element to the JSON array stored at `path`
///
/// Creates the file when missing. Callers serialize concurrent appends to
/// the same file themselves.
pub fn append_element<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), WriteError> {
    // Serialize first so a bad value leaves the file untouched
    let element = serialize_element(value)?;

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| WriteError::io("open", path, e))?;

    let len = file
        .metadata()
        .map_err(|e| WriteError::io("inspect", path, e))?
        .len();

    let start_len = START_ARRAY.len() as u64;
    let end_len = END_ARRAY.len() as u64;

    let mut tail = Vec::with_capacity(
        START_ARRAY.len() + OBJECT_DELIMITER.len() + element.len() + END_ARRAY.len(),
    );

    let insert_at = if len >= end_len {
        let mut closing = [0u8; 2];
        file.seek(SeekFrom::Start(len - end_len))
            .and_then(|_| file.read_exact(&mut closing))
            .map_err(|e| WriteError::io("read", path, e))?;

        if len == start_len && closing == START_ARRAY {
            // Opening marker only: a first append that never finished
            tail.extend_from_slice(INDENT);
            start_len
        } else if closing != END_ARRAY || len - end_len < start_len {
            return Err(WriteError::MalformedArray {
                path: path.to_path_buf(),
            });
        } else if len - end_len == start_len {
            tail.extend_from_slice(INDENT);
            start_len
        } else {
            tail.extend_from_slice(OBJECT_DELIMITER);
            len - end_len
        }
    } else {
        tail.extend_from_slice(START_ARRAY);
        tail.extend_from_slice(INDENT);
        0
    };

    tail.extend_from_slice(element.as_bytes());
    tail.extend_from_slice(END_ARRAY);

    file.seek(SeekFrom::Start(insert_at))
        .and_then(|_| file.write_all(&tail))
        .and_then(|_| file.flush())
        .map_err(|e| WriteError::io("write", path, e))?;

    Ok(())
}

/// Read back every element of a JSON array file
///
/// A missing or empty file reads as an empty array.
pub fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, WriteError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| WriteError::io("read", path, e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|source| WriteError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
