use log::debug;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::schema;

pub const BANK_SIZE: usize = 0x4000;
pub const MIN_ROM_SIZE: usize = 0x8000;
pub const MAX_ROM_SIZE: usize = 0x80_0000;

pub const GBC_FILE_EXTENSION: &str = ".gbc";

pub const HEADER_START: usize = 0x100;
pub const HEADER_END: usize = 0x150;
pub const LOGO_OFFSET: usize = 0x104;
pub const TITLE_OFFSET: usize = 0x134;
pub const TITLE_LEN: usize = 11;
pub const ROM_SIZE_CODE_OFFSET: usize = 0x148;

/// Boot logo the console compares against before it will run a cartridge.
pub const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00,
    0x0D, 0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD,
    0xD9, 0x99, 0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB,
    0xB9, 0x33, 0x3E,
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read ROM {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported cartridge size: {len} bytes (header declares {declared:?})")]
    SizeMismatch { len: usize, declared: Option<usize> },
    #[error("cartridge header signature is invalid")]
    BadSignature,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field at 0x{offset:06X} (width {width}) is outside a {len}-byte image")]
    OutOfRange {
        offset: usize,
        width: usize,
        len: usize,
    },
    #[error("unsupported field width {0}")]
    UnsupportedWidth(usize),
    #[error("value 0x{value:X} does not fit in {width} byte(s)")]
    ValueTooWide { value: u32, width: usize },
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write ROM {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid destination path '{}': {reason}", path.display())]
    PathInvalid { path: PathBuf, reason: &'static str },
}

/// Maps a header ROM-size code to a byte length.
pub fn rom_size_from_code(code: u8) -> Option<usize> {
    if code <= 0x08 {
        Some(MIN_ROM_SIZE << code)
    } else {
        None
    }
}

/// A whole cartridge image. The length is fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RomImage {
    data: Vec<u8>,
    loaded_len: usize,
}

impl RomImage {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::IoFailure {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        debug!("read {} bytes from {}", data.len(), path.display());
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LoadError> {
        let len = data.len();
        if len < HEADER_END {
            return Err(LoadError::SizeMismatch {
                len,
                declared: None,
            });
        }

        let declared = rom_size_from_code(data[ROM_SIZE_CODE_OFFSET]);
        let bank_aligned = len % BANK_SIZE == 0 && len.is_power_of_two();
        if !bank_aligned
            || !(MIN_ROM_SIZE..=MAX_ROM_SIZE).contains(&len)
            || declared != Some(len)
            || len < schema::required_len()
        {
            return Err(LoadError::SizeMismatch { len, declared });
        }

        if data[LOGO_OFFSET..LOGO_OFFSET + NINTENDO_LOGO.len()] != NINTENDO_LOGO {
            return Err(LoadError::BadSignature);
        }

        Ok(RomImage {
            data,
            loaded_len: len,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length recorded when the image was validated.
    pub fn loaded_len(&self) -> usize {
        self.loaded_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn title(&self) -> String {
        let raw = &self.data[TITLE_OFFSET..TITLE_OFFSET + TITLE_LEN];
        let nul_pos = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..nul_pos]).trim_end().to_string()
    }

    fn check_range(&self, offset: usize, width: usize) -> Result<(), FieldError> {
        if !(1..=4).contains(&width) {
            return Err(FieldError::UnsupportedWidth(width));
        }
        match offset.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(FieldError::OutOfRange {
                offset,
                width,
                len: self.data.len(),
            }),
        }
    }

    /// Reads a little-endian field of `width` bytes.
    pub fn read_field(&self, offset: usize, width: usize) -> Result<u32, FieldError> {
        self.check_range(offset, width)?;
        let value = self.data[offset..offset + width]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        Ok(value)
    }

    pub fn write_field(&mut self, offset: usize, width: usize, value: u32) -> Result<(), FieldError> {
        self.check_range(offset, width)?;
        if width < 4 && value >> (width * 8) != 0 {
            return Err(FieldError::ValueTooWide { value, width });
        }
        let bytes = value.to_le_bytes();
        self.data[offset..offset + width].copy_from_slice(&bytes[..width]);
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, FieldError> {
        self.read_field(offset, 1).map(|v| v as u8)
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<(), FieldError> {
        self.write_field(offset, 1, value as u32)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Writes the image to `dest` (extension normalised) through a temp file
    /// in the same directory, then renames it into place.
    pub fn save(&self, dest: &Path) -> Result<PathBuf, SaveError> {
        let path = normalize_destination(dest)?;
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(SaveError::PathInvalid {
                path,
                reason: "parent directory does not exist",
            });
        }
        if path.is_dir() {
            return Err(SaveError::PathInvalid {
                path,
                reason: "destination is a directory",
            });
        }

        let io_err = |source: io::Error| SaveError::IoFailure {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;
        tmp.write_all(&self.data).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!("wrote {} bytes to {}", self.data.len(), path.display());
        Ok(path)
    }
}

/// Appends `.gbc` unless the file name already ends with exactly `.gbc`.
pub fn normalize_destination(dest: &Path) -> Result<PathBuf, SaveError> {
    let raw = dest.as_os_str();
    if raw.is_empty() {
        return Err(SaveError::PathInvalid {
            path: dest.to_path_buf(),
            reason: "empty file name",
        });
    }

    let text = raw.to_string_lossy();
    if text.ends_with('/') || text.ends_with(std::path::MAIN_SEPARATOR) {
        return Err(SaveError::PathInvalid {
            path: dest.to_path_buf(),
            reason: "file name ends with a path separator",
        });
    }

    if text.ends_with(GBC_FILE_EXTENSION) {
        return Ok(dest.to_path_buf());
    }

    let mut with_ext = OsString::from(raw);
    with_ext.push(GBC_FILE_EXTENSION);
    Ok(PathBuf::from(with_ext))
}
