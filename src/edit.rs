use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// The fundamental edit primitive: replace `len` bytes at `byte_start` with `new_text`.
///
/// Offsets always refer to the original, unmodified buffer. A zero `len` is a
/// pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until passed to apply_edits()"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Number of original bytes replaced
    pub len: usize,
    /// Text to put in place of the replaced bytes
    pub new_text: String,
}

impl Edit {
    pub fn new(byte_start: usize, len: usize, new_text: impl Into<String>) -> Self {
        Self {
            byte_start,
            len,
            new_text: new_text.into(),
        }
    }

    /// Insert `text` at `at` without removing anything.
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::new(at, 0, text)
    }

    /// Remove the bytes in `[start, end)`.
    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start), "")
    }

    /// Replace the bytes in `[start, end)` with `text`.
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self::new(start, end.saturating_sub(start), text)
    }

    /// Ending byte offset (exclusive).
    pub fn byte_end(&self) -> usize {
        self.byte_start + self.len
    }

    pub fn is_insertion(&self) -> bool {
        self.len == 0
    }

    /// Whether the two edits touch a common byte.
    ///
    /// Insertions overlap a replacement only when they fall strictly inside
    /// it; two insertions never overlap.
    pub fn overlaps(&self, other: &Edit) -> bool {
        self.byte_start < other.byte_end() && other.byte_start < self.byte_end()
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid byte range: [{byte_start}, {byte_end}) in buffer of length {buffer_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        buffer_len: usize,
    },

    #[error("Overlapping edits: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    OverlappingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid edit would create malformed UTF-8")]
    InvalidUtf8Edit,
}

/// Order edits for application: descending start, replacements before
/// insertions at the same offset, and synthesis order among equal insertions.
fn application_order(edits: &[Edit]) -> Vec<&Edit> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    // sort_by is stable
    ordered.sort_by(|a, b| {
        b.byte_start
            .cmp(&a.byte_start)
            .then(a.is_insertion().cmp(&b.is_insertion()))
    });
    ordered
}

/// Find the first pair of overlapping edits, if any.
pub fn find_overlap(edits: &[Edit]) -> Option<(&Edit, &Edit)> {
    let ordered = application_order(edits);
    ordered.windows(2).find_map(|window| {
        let (later, earlier) = (window[0], window[1]);
        (earlier.byte_end() > later.byte_start).then_some((earlier, later))
    })
}

/// Apply a set of edits to `source` and return the rewritten text.
///
/// Edits are applied bottom-to-top so that every offset, computed once
/// against the original text, is still valid when its edit is spliced in.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    for edit in edits {
        if edit.byte_end() > source.len()
            || !source.is_char_boundary(edit.byte_start)
            || !source.is_char_boundary(edit.byte_end())
        {
            return Err(EditError::InvalidByteRange {
                byte_start: edit.byte_start,
                byte_end: edit.byte_end(),
                buffer_len: source.len(),
            });
        }
    }

    if let Some((earlier, later)) = find_overlap(edits) {
        return Err(EditError::OverlappingEdits {
            first_start: earlier.byte_start,
            first_end: earlier.byte_end(),
            second_start: later.byte_start,
            second_end: later.byte_end(),
        });
    }

    let mut new_content = source.as_bytes().to_vec();
    for edit in application_order(edits) {
        new_content.splice(
            edit.byte_start..edit.byte_end(),
            edit.new_text.as_bytes().iter().copied(),
        );
    }

    String::from_utf8(new_content).map_err(|_| EditError::InvalidUtf8Edit)
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the file is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(EditError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            )))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
