//! Chunk planning.
//!
//! Pure offset arithmetic: decides how a file of a given size is split and
//! what each piece is called on the backend. Chunk names are for display
//! only; reassembly order comes from the order of the stored links.

use std::ops::Range;
use std::path::Path;

/// Suffix of the single chunk of a file below the ceiling.
pub const ATOMIC_SUFFIX: &str = "atomic";

/// Suffix of each piece of a split file.
pub const CHUNK_SUFFIX: &str = "chunk";

/// Size limits used to split files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLimits {
    /// Files strictly smaller than this go up as one chunk.
    pub ceiling: usize,
    /// Size of each piece when a file is split; the last one may be shorter.
    pub chunk_size: usize,
}

/// One planned chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk {
    /// Sequence index: 0 for an atomic chunk, 1..=N for split pieces.
    pub index: usize,
    /// Byte range of the file covered by this chunk.
    pub range: Range<usize>,
    /// Backend display name.
    pub name: String,
}

impl PlannedChunk {
    /// Number of bytes in this chunk.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns true for a zero-byte chunk.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Plan the chunks of a file of `size` bytes.
///
/// `label` is the timestamp label shared by every chunk of the file and
/// `extension` is the original extension including its dot (may be empty).
/// A zero-byte file still yields one (empty) atomic chunk.
pub fn plan_chunks(size: usize, limits: ChunkLimits, label: &str, extension: &str) -> Vec<PlannedChunk> {
    if size < limits.ceiling {
        return vec![PlannedChunk {
            index: 0,
            range: 0..size,
            name: chunk_name(label, extension, 0, ATOMIC_SUFFIX),
        }];
    }

    let chunk_size = limits.chunk_size.max(1);
    let count = size.div_ceil(chunk_size);

    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = (start + chunk_size).min(size);
            PlannedChunk {
                index: i + 1,
                range: start..end,
                name: chunk_name(label, extension, i + 1, CHUNK_SUFFIX),
            }
        })
        .collect()
}

/// Build a chunk name: `{label}{extension}.{index}.{suffix}`.
pub fn chunk_name(label: &str, extension: &str, index: usize, suffix: &str) -> String {
    format!("{label}{extension}.{index}.{suffix}")
}

/// Strip the `.{index}.{atomic|chunk}` suffix from a chunk name.
///
/// Returns `None` for names that were not produced by [`chunk_name`].
pub fn chunk_stem(name: &str) -> Option<&str> {
    let (rest, suffix) = name.rsplit_once('.')?;
    if suffix != ATOMIC_SUFFIX && suffix != CHUNK_SUFFIX {
        return None;
    }
    let (stem, index) = rest.rsplit_once('.')?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(stem)
}

/// Extension of a file name including the leading dot, or an empty string.
///
/// Dot-files such as `.hidden` have no extension.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
