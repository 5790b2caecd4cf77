//! Zip packaging of retrieved directories.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::service::RetrievedFile;
use crate::Result;

/// Extension of packaged directories.
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Archive file name for a directory record.
pub fn archive_name(directory_name: &str) -> String {
    format!("{directory_name}{ARCHIVE_EXTENSION}")
}

/// Pack `files` into an in-memory zip archive, deflated at level 9.
///
/// Entry names are the files' relative paths. Only files get entries, so
/// directories with nothing retrievable in them do not appear.
pub fn zip_files(files: &[RetrievedFile]) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for file in files {
        writer.start_file(file.path.as_str(), options)?;
        writer.write_all(&file.bytes)?;
    }

    let cursor = writer.finish()?;
    let data = cursor.into_inner();
    tracing::debug!(entries = files.len(), size = data.len(), "Packed archive");
    Ok(data)
}
