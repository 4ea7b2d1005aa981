//! On-disk cache entry format
//!
//! Each entry file is laid out as a 4-byte little-endian header length, a
//! bincode-encoded [`EntryHeader`], then the bincode-encoded artifact. The
//! header carries a SHA256 checksum of the payload so that truncated or
//! tampered files are detected before the artifact is decoded.

use crate::error::{StanCacheError, StanCacheResult};
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Magic bytes identifying a stancache entry
const ENTRY_MAGIC: [u8; 4] = *b"STNC";

/// Current entry format version. Increment on breaking changes to the
/// header or payload encoding.
const ENTRY_FORMAT_VERSION: u32 = 1;

/// Upper bound on the encoded header size
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Upper bound on the encoded artifact size
const MAX_PAYLOAD_BYTES: usize = 512 * 1024 * 1024;

// Length prefixes inside a damaged entry are checked against these limits
// before bincode allocates for them.
fn header_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_HEADER_BYTES>()
}

fn payload_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_PAYLOAD_BYTES>()
}

/// Metadata stored in front of every cached artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Must be `b"STNC"`
    pub magic: [u8; 4],
    /// Entry format version
    pub format_version: u32,
    /// Fingerprint the entry was stored under
    pub fingerprint: String,
    /// Logical model name the artifact was compiled as
    pub model_name: String,
    /// stancache version that wrote the entry
    pub crate_version: String,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
    /// SHA256 of the payload bytes (hex)
    pub checksum: String,
}

impl EntryHeader {
    /// Create a header for a new entry
    pub fn new(fingerprint: &Fingerprint, model_name: &str) -> Self {
        Self {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            fingerprint: fingerprint.to_string(),
            model_name: model_name.to_string(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            checksum: String::new(),
        }
    }
}

/// Outcome of reading an entry
#[derive(Debug)]
pub enum Lookup<A> {
    /// A valid entry was decoded
    Found(A),
    /// No entry exists at the path
    NotFound,
    /// An entry exists but could not be read or decoded
    Corrupt(String),
}

impl<A> Lookup<A> {
    /// Whether the entry was found and decoded
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

fn checksum(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Encode an artifact into entry bytes
pub fn encode_entry<A: Serialize>(
    mut header: EntryHeader,
    artifact: &A,
) -> StanCacheResult<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(artifact, payload_config()).map_err(|e| {
        StanCacheError::Serialize {
            reason: e.to_string(),
        }
    })?;
    header.checksum = checksum(&payload);

    let header_bytes = bincode::serde::encode_to_vec(&header, header_config()).map_err(|e| {
        StanCacheError::Serialize {
            reason: e.to_string(),
        }
    })?;
    let header_len = u32::try_from(header_bytes.len()).map_err(|_| StanCacheError::Serialize {
        reason: "entry header too large".to_string(),
    })?;

    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Split entry bytes into a validated header and its payload
fn split_entry(raw: &[u8]) -> Result<(EntryHeader, &[u8]), String> {
    if raw.len() < 4 {
        return Err(format!("truncated entry ({} bytes)", raw.len()));
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&raw[..4]);
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    if header_len > MAX_HEADER_BYTES {
        return Err(format!("entry header length {} out of range", header_len));
    }
    if raw.len() - 4 < header_len {
        return Err("truncated entry header".to_string());
    }

    let (header, _): (EntryHeader, usize) =
        bincode::serde::decode_from_slice(&raw[4..4 + header_len], header_config())
            .map_err(|e| format!("unreadable entry header: {}", e))?;

    if header.magic != ENTRY_MAGIC {
        return Err("not a stancache entry (bad magic)".to_string());
    }
    if header.format_version != ENTRY_FORMAT_VERSION {
        return Err(format!(
            "entry format version {} (expected {})",
            header.format_version, ENTRY_FORMAT_VERSION
        ));
    }

    let payload = &raw[4 + header_len..];
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(format!("entry payload of {} bytes out of range", payload.len()));
    }
    let actual = checksum(payload);
    if actual != header.checksum {
        return Err(format!(
            "checksum mismatch: expected {}, got {}",
            header.checksum, actual
        ));
    }

    Ok((header, payload))
}

/// Decode entry bytes into an artifact
pub fn decode_entry<A: DeserializeOwned>(raw: &[u8]) -> Result<(EntryHeader, A), String> {
    let (header, payload) = split_entry(raw)?;
    let (artifact, read) =
        bincode::serde::decode_from_slice::<A, _>(payload, payload_config())
            .map_err(|e| format!("undecodable artifact: {}", e))?;
    if read != payload.len() {
        return Err(format!(
            "{} trailing bytes after artifact",
            payload.len() - read
        ));
    }
    Ok((header, artifact))
}

/// Read and decode the entry at `path`
///
/// Only a missing file yields [`Lookup::NotFound`]; every other failure,
/// including I/O errors, is reported as [`Lookup::Corrupt`].
pub fn read_entry<A: DeserializeOwned>(path: &Path) -> Lookup<A> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Lookup::NotFound,
        Err(e) => return Lookup::Corrupt(format!("unreadable: {}", e)),
    };

    match decode_entry(&raw) {
        Ok((_, artifact)) => Lookup::Found(artifact),
        Err(reason) => Lookup::Corrupt(reason),
    }
}

/// Read only the header of the entry at `path`
pub fn read_header(path: &Path) -> Result<EntryHeader, String> {
    let raw = fs::read(path).map_err(|e| e.to_string())?;
    split_entry(&raw).map(|(header, _)| header)
}

/// Write an entry, replacing any existing file at `path` atomically
///
/// The bytes go to a temporary sibling first and are renamed into place, so
/// concurrent readers see either the old entry or the new one.
pub fn write_entry<A: Serialize>(
    path: &Path,
    header: EntryHeader,
    artifact: &A,
) -> StanCacheResult<()> {
    let bytes = encode_entry(header, artifact)?;

    let parent = path.parent().ok_or_else(|| {
        StanCacheError::User(format!("cache entry path {} has no parent", path.display()))
    })?;
    fs::create_dir_all(parent).map_err(|e| {
        StanCacheError::io(format!("creating cache directory {}", parent.display()), e)
    })?;

    let mut staged = tempfile::Builder::new()
        .prefix(".stancache-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| StanCacheError::io(format!("staging entry in {}", parent.display()), e))?;
    staged
        .write_all(&bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| StanCacheError::io(format!("writing cache entry {}", path.display()), e))?;
    staged.persist(path).map_err(|e| {
        StanCacheError::io(format!("writing cache entry {}", path.display()), e.error)
    })?;

    Ok(())
}
