//! The XSB unit codec: framing shared by every store file.
//!
//! Every `.xsb` unit starts with the same envelope: a 4-byte magic, the
//! format version, a filetype code and a deduplicated string pool. The
//! body after the pool is a sequence of length-prefixed bincode payloads;
//! payload structs refer to pool strings by integer code. All integers
//! are little-endian.
//!
//! Version policy: the major version must match exactly; a file's minor
//! version must not exceed the reader's. Fields added after 1.0 are
//! listed in [`VersionedField`] with their introduction version, and the
//! reader consults that table before decoding them.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Magic constant opening every unit file.
pub const XSB_MAGIC: [u8; 4] = *b"XSBF";

/// Major format version this reader and writer speak.
pub const MAJOR_VERSION: u16 = 1;

/// Minor format version this reader and writer speak.
pub const MINOR_VERSION: u16 = 1;

/// Release number written into new units.
pub const RELEASE: u16 = 0;

/// The role of a unit file within a stored type system.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FileType {
    /// The per-system index: handle pool, name maps, namespace set.
    Index,
    /// One component's structural data.
    Component,
    /// A cross-package pointer: maps a stable path to an owning system.
    Pointer,
}

impl FileType {
    /// The stable one-byte code written into unit headers.
    pub fn code(self) -> u8 {
        match self {
            FileType::Index => 1,
            FileType::Component => 2,
            FileType::Pointer => 3,
        }
    }

    /// Decodes a filetype code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(FileType::Index),
            2 => Some(FileType::Component),
            3 => Some(FileType::Pointer),
            _ => None,
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            FileType::Index => "index",
            FileType::Component => "component",
            FileType::Pointer => "pointer",
        }
    }
}

/// Fields added to the format after 1.0, with their introduction version.
///
/// A reader must check [`XsbReader::has_field`] before decoding any of
/// these; files older than the introduction version simply do not carry
/// them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VersionedField {
    /// The release number in the unit header itself.
    ReleaseNumber,
    /// The index's redefinition chain map.
    RedefinitionMap,
    /// Top-level annotation text in the index.
    TopLevelAnnotations,
}

impl VersionedField {
    /// The `(major, minor, release)` at which the field first appears.
    pub fn introduced_in(self) -> (u16, u16, u16) {
        match self {
            VersionedField::ReleaseNumber => (1, 1, 0),
            VersionedField::RedefinitionMap => (1, 1, 0),
            VersionedField::TopLevelAnnotations => (1, 1, 0),
        }
    }
}

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Serializes one unit: envelope, string pool, payload sections.
pub struct XsbWriter {
    file_type: FileType,
    strings: Vec<String>,
    string_codes: HashMap<String, u32>,
    body: Vec<u8>,
}

impl XsbWriter {
    /// Starts a unit of the given filetype at the current format version.
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            strings: Vec::new(),
            string_codes: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Interns a string into the pool, returning its code.
    ///
    /// Repeated strings share one pool entry.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&code) = self.string_codes.get(s) {
            return code;
        }
        let code = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_codes.insert(s.to_string(), code);
        code
    }

    /// Appends one length-prefixed bincode payload section to the body.
    pub fn write_payload<T: Serialize>(&mut self, value: &T) -> Result<(), StoreError> {
        let bytes = bincode::serde::encode_to_vec(value, bincode_config()).map_err(|e| {
            StoreError::Malformed {
                path: PathBuf::new(),
                reason: format!("payload encoding failed: {e}"),
            }
        })?;
        self.body.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.body.extend_from_slice(&bytes);
        Ok(())
    }

    /// Finishes the unit, producing the complete file contents.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 64);
        out.extend_from_slice(&XSB_MAGIC);
        out.extend_from_slice(&MAJOR_VERSION.to_le_bytes());
        out.extend_from_slice(&MINOR_VERSION.to_le_bytes());
        out.extend_from_slice(&RELEASE.to_le_bytes());
        out.push(self.file_type.code());
        out.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());
        for s in &self.strings {
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        out.extend_from_slice(&self.body);
        out
    }
}

/// Parses one unit: validates the envelope, then yields payload sections.
#[derive(Debug)]
pub struct XsbReader {
    path: PathBuf,
    version: (u16, u16, u16),
    strings: Vec<String>,
    body: Vec<u8>,
    pos: usize,
}

impl XsbReader {
    /// Parses a unit from raw bytes, checking magic, version and filetype.
    pub fn parse(bytes: &[u8], expected: FileType, path: &Path) -> Result<Self, StoreError> {
        let mut cur = Cursor {
            bytes,
            pos: 0,
            path,
        };
        let magic = cur.take(4)?;
        if magic != XSB_MAGIC {
            return Err(StoreError::Malformed {
                path: path.to_path_buf(),
                reason: "bad magic".to_string(),
            });
        }
        let major = cur.u16()?;
        let minor = cur.u16()?;
        if major != MAJOR_VERSION || minor > MINOR_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                found_major: major,
                found_minor: minor,
                supported_major: MAJOR_VERSION,
                supported_minor: MINOR_VERSION,
            });
        }
        // The release number is itself version-gated.
        let release = if (major, minor, 0) >= VersionedField::ReleaseNumber.introduced_in() {
            cur.u16()?
        } else {
            0
        };
        let code = cur.u8()?;
        if FileType::from_code(code) != Some(expected) {
            return Err(StoreError::WrongFileType {
                path: path.to_path_buf(),
                expected: expected.label(),
            });
        }
        let count = cur.u32()? as usize;
        let mut strings = Vec::with_capacity(count);
        for _ in 0..count {
            let len = cur.u32()? as usize;
            let raw = cur.take(len)?;
            let s = std::str::from_utf8(raw).map_err(|_| StoreError::Malformed {
                path: path.to_path_buf(),
                reason: "string pool entry is not UTF-8".to_string(),
            })?;
            strings.push(s.to_string());
        }
        Ok(Self {
            path: path.to_path_buf(),
            version: (major, minor, release),
            strings,
            body: bytes[cur.pos..].to_vec(),
            pos: 0,
        })
    }

    /// The `(major, minor, release)` version the file was written at.
    pub fn version(&self) -> (u16, u16, u16) {
        self.version
    }

    /// Returns `true` if the file is new enough to carry `field`.
    pub fn has_field(&self, field: VersionedField) -> bool {
        self.version >= field.introduced_in()
    }

    /// Resolves a string pool code.
    pub fn string(&self, code: u32) -> Result<&str, StoreError> {
        self.strings
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| StoreError::Malformed {
                path: self.path.clone(),
                reason: format!("string code {code} out of range"),
            })
    }

    /// Decodes the next payload section.
    pub fn read_payload<T: DeserializeOwned>(&mut self) -> Result<T, StoreError> {
        let start = self.pos;
        if self.body.len() - start < 4 {
            return Err(self.malformed("truncated payload length"));
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&self.body[start..start + 4]);
        let len = u32::from_le_bytes(len_bytes) as usize;
        let data_start = start + 4;
        if self.body.len() - data_start < len {
            return Err(self.malformed("truncated payload"));
        }
        let slice = &self.body[data_start..data_start + len];
        let (value, consumed) =
            bincode::serde::decode_from_slice(slice, bincode_config()).map_err(|e| {
                StoreError::Malformed {
                    path: self.path.clone(),
                    reason: format!("payload decoding failed: {e}"),
                }
            })?;
        if consumed != len {
            return Err(self.malformed("payload has trailing bytes"));
        }
        self.pos = data_start + len;
        Ok(value)
    }

    /// Decodes a payload section added in a later format version.
    ///
    /// Returns `None` when the file predates the field's introduction.
    pub fn read_versioned_payload<T: DeserializeOwned>(
        &mut self,
        field: VersionedField,
    ) -> Result<Option<T>, StoreError> {
        if !self.has_field(field) {
            return Ok(None);
        }
        self.read_payload().map(Some)
    }

    fn malformed(&self, reason: &str) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], StoreError> {
        if self.bytes.len() - self.pos < n {
            return Err(StoreError::Malformed {
                path: self.path.to_path_buf(),
                reason: "truncated header".to_string(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, StoreError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, StoreError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, StoreError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Writes a finished unit to disk, creating parent directories.
pub fn write_unit(path: &Path, writer: XsbWriter) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, writer.finish()).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Reads and parses a unit file.
pub fn read_unit(path: &Path, expected: FileType) -> Result<XsbReader, StoreError> {
    let bytes = std::fs::read(path).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    XsbReader::parse(&bytes, expected, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        name: u32,
        count: u64,
    }

    #[test]
    fn envelope_roundtrip() {
        let mut w = XsbWriter::new(FileType::Index);
        let code = w.intern("http://a");
        w.write_payload(&Sample {
            name: code,
            count: 7,
        })
        .unwrap();
        let bytes = w.finish();

        let mut r = XsbReader::parse(&bytes, FileType::Index, Path::new("t.xsb")).unwrap();
        assert_eq!(r.version(), (MAJOR_VERSION, MINOR_VERSION, RELEASE));
        let back: Sample = r.read_payload().unwrap();
        assert_eq!(back.count, 7);
        assert_eq!(r.string(back.name).unwrap(), "http://a");
    }

    #[test]
    fn string_pool_deduplicates() {
        let mut w = XsbWriter::new(FileType::Index);
        let a = w.intern("ns");
        let b = w.intern("ns");
        let c = w.intern("other");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn bad_magic_rejected() {
        let mut w = XsbWriter::new(FileType::Index);
        w.write_payload(&Sample { name: 0, count: 0 }).unwrap();
        let mut bytes = w.finish();
        bytes[0] = b'Z';
        let err = XsbReader::parse(&bytes, FileType::Index, Path::new("t.xsb")).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn newer_minor_rejected() {
        let mut bytes = XsbWriter::new(FileType::Index).finish();
        let newer = (MINOR_VERSION + 1).to_le_bytes();
        bytes[6] = newer[0];
        bytes[7] = newer[1];
        let err = XsbReader::parse(&bytes, FileType::Index, Path::new("t.xsb")).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion { .. }));
    }

    #[test]
    fn wrong_filetype_rejected() {
        let bytes = XsbWriter::new(FileType::Pointer).finish();
        let err = XsbReader::parse(&bytes, FileType::Index, Path::new("t.xsb")).unwrap_err();
        assert!(matches!(err, StoreError::WrongFileType { .. }));
    }

    #[test]
    fn pre_release_minor_has_no_gated_fields() {
        // Hand-assemble a 1.0 unit: no release number in the header and no
        // versioned sections in the body.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&XSB_MAGIC);
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.push(FileType::Index.code());
        bytes.extend_from_slice(&0u32.to_le_bytes());

        let mut r = XsbReader::parse(&bytes, FileType::Index, Path::new("t.xsb")).unwrap();
        assert_eq!(r.version(), (1, 0, 0));
        assert!(!r.has_field(VersionedField::RedefinitionMap));
        let gated: Option<Vec<(u32, u32)>> = r
            .read_versioned_payload(VersionedField::RedefinitionMap)
            .unwrap();
        assert!(gated.is_none());
    }
}
