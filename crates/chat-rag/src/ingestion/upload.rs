//! Staging of uploaded bytes on disk before parsing

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// An uploaded file written to a uniquely named temporary file.
///
/// The file is deleted when the value is dropped, so every exit path of an
/// ingestion cleans up after itself.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    filename: String,
}

impl StagedUpload {
    /// Write `data` to a fresh temp file in `staging_dir` (or the OS temp dir)
    pub fn stage(filename: &str, data: &[u8], staging_dir: Option<&Path>) -> Result<Self> {
        let suffix = match filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!(".{}", ext),
            _ => String::new(),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("chat-rag-upload-").suffix(&suffix);
        let mut file = match staging_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        file.write_all(data)?;
        file.flush()?;

        tracing::debug!(
            "Staged upload {} ({} bytes) at {}",
            filename,
            data.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            filename: filename.to_string(),
        })
    }

    /// Path of the staged copy
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Filename as uploaded
    pub fn filename(&self) -> &str {
        &self.filename
    }
}
