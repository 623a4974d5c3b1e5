//! Persisted index format
//!
//! ```text
//! magic "TSIX" (4) + format_version u32 LE (4) + MessagePack payload + crc32 u32 LE (4)
//! ```
//!
//! The CRC covers everything before it. The payload records the config the
//! index was built with and every distinct code with its documents, in code
//! id order, so a reloaded index answers every query identically.
//!
//! Loading checks, in order: magic, format version, checksum, payload
//! decode, config compatibility, then code validity.

use crate::index::TermSetIndex;
use serde::{Deserialize, Serialize};
use setcode_core::{CanonicalCode, DocId, Error, IndexConfig, Result, TermId};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Magic bytes at the start of a persisted index
pub const INDEX_MAGIC: &[u8; 4] = b"TSIX";

/// Current persisted format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// magic + version
const HEADER_SIZE: usize = 8;
const CRC_SIZE: usize = 4;

// ============================================================================
// Payload
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    vocab_size: u32,
    code_length: u64,
    pad_token_id: TermId,
    start_token_id: Option<TermId>,
    codes: Vec<PersistedCode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCode {
    terms: Vec<TermId>,
    docs: Vec<DocId>,
}

// ============================================================================
// Encode / decode
// ============================================================================

impl TermSetIndex {
    /// Serialize the index into the persisted byte format
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let config = self.config();
        let payload = PersistedIndex {
            vocab_size: config.vocab_size,
            code_length: config.code_length as u64,
            pad_token_id: config.pad_token_id,
            start_token_id: config.start_token_id,
            codes: self
                .iter_codes()
                .map(|(_, terms, docs)| PersistedCode {
                    terms: terms.to_vec(),
                    docs: docs.to_vec(),
                })
                .collect(),
        };

        let body = rmp_serde::to_vec(&payload)
            .map_err(|e| Error::Serialization(format!("index encode error: {}", e)))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len() + CRC_SIZE);
        buf.extend_from_slice(INDEX_MAGIC);
        buf.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&body);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Restore an index from bytes, checking it against `expected`
    ///
    /// # Errors
    ///
    /// - `IndexVersionMismatch` if the format version or a config field
    ///   (`vocab_size`, `code_length`, `pad_token_id`, `start_token_id`)
    ///   differs from what the caller expects
    /// - `IndexCorrupt` if the bytes are truncated, fail the checksum, do not
    ///   decode, or describe an invalid code set
    pub fn from_bytes(data: &[u8], expected: &IndexConfig) -> Result<Self> {
        if data.len() < HEADER_SIZE + CRC_SIZE {
            return Err(Error::IndexCorrupt(format!(
                "index too small: {} bytes",
                data.len()
            )));
        }
        if &data[0..4] != INDEX_MAGIC {
            return Err(Error::IndexCorrupt("bad index magic".to_string()));
        }

        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != INDEX_FORMAT_VERSION {
            return Err(Error::IndexVersionMismatch {
                field: "format_version",
                expected: INDEX_FORMAT_VERSION as u64,
                actual: version as u64,
            });
        }

        let crc_offset = data.len() - CRC_SIZE;
        let stored_crc = u32::from_le_bytes([
            data[crc_offset],
            data[crc_offset + 1],
            data[crc_offset + 2],
            data[crc_offset + 3],
        ]);
        let computed_crc = crc32fast::hash(&data[..crc_offset]);
        if stored_crc != computed_crc {
            return Err(Error::IndexCorrupt(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, computed_crc
            )));
        }

        let payload: PersistedIndex = rmp_serde::from_slice(&data[HEADER_SIZE..crc_offset])
            .map_err(|e| Error::IndexCorrupt(format!("index decode error: {}", e)))?;

        check_field("vocab_size", expected.vocab_size as u64, payload.vocab_size as u64)?;
        check_field("code_length", expected.code_length as u64, payload.code_length)?;
        check_field(
            "pad_token_id",
            expected.pad_token_id as u64,
            payload.pad_token_id as u64,
        )?;
        check_field(
            "start_token_id",
            optional_token(expected.start_token_id),
            optional_token(payload.start_token_id),
        )?;

        rebuild(expected.clone(), payload)
    }

    /// Write the index to `path` atomically (temp file + fsync + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let temp_path = path.with_extension("tsix.tmp");

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, path)?;

        // Sync parent directory
        if let Some(parent) = path.parent() {
            if parent.exists() && !parent.as_os_str().is_empty() {
                File::open(parent)?.sync_all()?;
            }
        }

        tracing::info!(
            target: "setcode::index",
            path = %path.display(),
            bytes = bytes.len(),
            codes = self.code_count(),
            "Term-set index saved"
        );
        Ok(())
    }

    /// Read an index from `path`, checking it against `expected`
    pub fn load(path: &Path, expected: &IndexConfig) -> Result<Self> {
        let data = std::fs::read(path)?;
        let index = Self::from_bytes(&data, expected).map_err(|e| {
            tracing::warn!(
                target: "setcode::index",
                path = %path.display(),
                error = %e,
                "Rejected persisted term-set index"
            );
            e
        })?;
        tracing::info!(
            target: "setcode::index",
            path = %path.display(),
            documents = index.document_count(),
            codes = index.code_count(),
            "Term-set index loaded"
        );
        Ok(index)
    }
}

fn check_field(field: &'static str, expected: u64, actual: u64) -> Result<()> {
    if expected != actual {
        return Err(Error::IndexVersionMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Absent start token encodes as `u64::MAX`, outside the term id range
fn optional_token(token: Option<TermId>) -> u64 {
    token.map_or(u64::MAX, u64::from)
}

/// Reinsert persisted codes, rejecting anything `fit` could not have produced
fn rebuild(config: IndexConfig, payload: PersistedIndex) -> Result<TermSetIndex> {
    let total: usize = payload.codes.iter().map(|c| c.docs.len()).sum();
    let mut seen = vec![false; total];
    let mut index = TermSetIndex::new(config)?;

    for (id, persisted) in payload.codes.into_iter().enumerate() {
        let code = CanonicalCode::from_sorted(persisted.terms)
            .ok_or_else(|| corrupt(id, "terms are not sorted"))?;
        if code.is_empty() {
            return Err(corrupt(id, "empty code"));
        }
        if code.len() > index.config().code_length {
            return Err(corrupt(id, "code longer than code_length"));
        }
        if code.last().is_some_and(|&t| t >= index.config().vocab_size) {
            return Err(corrupt(id, "term outside vocabulary"));
        }
        if persisted.docs.is_empty() {
            return Err(corrupt(id, "code without documents"));
        }
        if index.code_id(&code).is_some() {
            return Err(corrupt(id, "duplicate code"));
        }

        for doc in persisted.docs {
            match seen.get_mut(doc as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(corrupt(id, "document id out of range or repeated")),
            }
            index.insert_canonical(code.clone(), doc);
        }
    }

    Ok(index)
}

fn corrupt(code: usize, reason: &str) -> Error {
    Error::IndexCorrupt(format!("code {}: {}", code, reason))
}

// ============================================================================
// Tests
// ============================================================================
