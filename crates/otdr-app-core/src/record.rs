// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A trace file loaded into a tool: decoded once, shared afterwards.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use otdr_sor::{decode, ChecksumStatus, DecodeError, OtdrFile};
use thiserror::Error;
use tracing::{debug, warn};

use crate::notice::{Notice, NoticeKind, NoticeQueue};

/// Extensions that carry a `GenParams` nominal wavelength.
const TRACE_EXTENSIONS: [&str; 2] = ["SOR", "SOD"];

const MAX_NOTICES: usize = 8;

/// Failure to load a trace file.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not a decodable trace file.
    #[error("failed to decode {name}: {source}")]
    Decode {
        /// File name the bytes came from.
        name: String,
        /// Decoder error with stage, block and offset.
        #[source]
        source: DecodeError,
    },
}

impl RecordError {
    /// Error notice naming the failure, for listings that keep going.
    pub fn notice(&self) -> Notice {
        Notice {
            kind: NoticeKind::Error,
            title: "load failed".to_string(),
            body: Some(self.to_string()),
        }
    }
}

/// Read and decode the file at `path`.
pub fn decode_file(path: &Path) -> Result<OtdrFile, RecordError> {
    let bytes = read(path)?;
    decode(&bytes).map_err(|source| RecordError::Decode {
        name: display_name(path),
        source,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, RecordError> {
    fs::read(path).map_err(|source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// A decoded trace file with its listing metadata.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    filename: String,
    added_at: SystemTime,
    file: Arc<OtdrFile>,
    notices: Vec<Notice>,
}

impl TraceRecord {
    /// Read and decode `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let path = path.as_ref();
        let bytes = read(path)?;
        Self::from_bytes(display_name(path), &bytes)
    }

    /// Decode `bytes` that were loaded under `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, RecordError> {
        let filename = name.into();
        let file = decode(bytes).map_err(|source| RecordError::Decode {
            name: filename.clone(),
            source,
        })?;
        let notices = notices_for(&filename, &file);
        debug!(
            file = %filename,
            bytes = bytes.len(),
            traces = file.traces().len(),
            notices = notices.len(),
            "loaded trace record"
        );
        Ok(Self {
            filename,
            added_at: SystemTime::now(),
            file: Arc::new(file),
            notices,
        })
    }

    /// Name the record was loaded under.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Extension in upper case, or the whole name when it has none.
    pub fn file_type(&self) -> String {
        self.filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }

    /// When the record was loaded.
    pub fn added_at(&self) -> SystemTime {
        self.added_at
    }

    /// Nominal wavelength for `.sor`/`.sod` files, `N/A` otherwise.
    pub fn wavelength_label(&self) -> String {
        let file_type = self.file_type();
        if TRACE_EXTENSIONS.contains(&file_type.as_str()) {
            format!("{}nm", self.file.general().nominal_wavelength_nm)
        } else {
            "N/A".to_string()
        }
    }

    /// The decoded file.
    pub fn file(&self) -> Arc<OtdrFile> {
        Arc::clone(&self.file)
    }

    /// Conditions worth surfacing to the user.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

fn notices_for(filename: &str, file: &OtdrFile) -> Vec<Notice> {
    let mut queue = NoticeQueue::new(MAX_NOTICES);
    match file.checksum() {
        ChecksumStatus::Mismatch { declared, computed } => {
            warn!(file = %filename, declared, computed, "checksum mismatch");
            queue.push(
                NoticeKind::Warn,
                "checksum mismatch",
                Some(format!(
                    "declared {declared:#06x}, computed {computed:#06x}"
                )),
            );
        }
        ChecksumStatus::Absent => {
            queue.push(NoticeKind::Info, "no checksum block", None);
        }
        ChecksumStatus::Valid { .. } => {}
    }
    let opaque = file.opaque_blocks();
    if !opaque.is_empty() {
        let ids: Vec<&str> = opaque.iter().map(|b| b.id.as_str()).collect();
        queue.push(
            NoticeKind::Info,
            "vendor blocks preserved",
            Some(ids.join(", ")),
        );
    }
    if file.traces().is_empty() {
        queue.push(NoticeKind::Info, "no trace data", None);
    }
    queue.into_vec()
}
