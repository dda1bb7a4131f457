use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod category;
pub mod checksum;
mod engine;
mod evolutions;
pub mod image;
pub mod items;
pub mod rng;
pub mod schema;

#[cfg(test)]
mod test_support;

pub use category::{Category, CategorySet, UnknownCategory};
pub use checksum::{ChecksumError, ChecksumReport};
pub use engine::{
    CategoryLog, Engine, RandomizationError, RandomizationRequest, SlotChange, SpoilerLog,
    DEFAULT_MAX_ATTEMPTS,
};
pub use image::{FieldError, LoadError, RomImage, SaveError};

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomiserSettings {
    pub seed: u64,
    pub categories: CategorySet,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub debug: bool,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl RandomiserSettings {
    pub fn request(&self) -> RandomizationRequest {
        RandomizationRequest {
            seed: self.seed,
            categories: self.categories.clone(),
            max_attempts: self.max_attempts,
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            RandomiserError::Config(format!("cannot read settings {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            RandomiserError::Config(format!("invalid settings {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Error)]
pub enum RandomiserError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Randomization(#[from] RandomizationError),
    #[error(transparent)]
    Checksum(#[from] ChecksumError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to write spoiler log {}: {source}", path.display())]
    SpoilerLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RandomiserError>;

/// Runs the request over `image` and leaves it with consistent checksums.
/// On error the image may hold a partial result and must not be saved.
pub fn randomise(image: &mut RomImage, request: &RandomizationRequest) -> Result<SpoilerLog> {
    let log = Engine::new(request.clone()).run(image)?;
    let report = checksum::fix_checksums(image)?;
    info!(
        "checksums: header 0x{:02X}, global 0x{:04X}",
        report.header_computed, report.global_computed
    );
    Ok(log)
}

fn spoiler_log_path(rom_path: &Path) -> PathBuf {
    rom_path.with_extension("spoiler.json")
}

fn write_spoiler_log(path: &Path, log: &SpoilerLog) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, log)?;
    out.flush()
}

/// Load, randomise, save. Returns the path actually written, which has the
/// `.gbc` extension appended when the requested name lacked it.
///
/// With `debug` set the spoiler log is written after the image; if that
/// fails the image stays on disk and the error is returned.
pub fn run(settings: RandomiserSettings) -> Result<PathBuf> {
    let mut image = RomImage::load(&settings.input_path)?;
    info!(
        "loaded {} ({} bytes, title '{}')",
        settings.input_path.display(),
        image.len(),
        image.title()
    );

    let log = randomise(&mut image, &settings.request())?;
    let written = image.save(&settings.output_path)?;
    info!("saved {}", written.display());

    if settings.debug {
        let path = spoiler_log_path(&written);
        write_spoiler_log(&path, &log)
            .map_err(|source| RandomiserError::SpoilerLog { path: path.clone(), source })?;
        info!("spoiler log {}", path.display());
    }

    Ok(written)
}
