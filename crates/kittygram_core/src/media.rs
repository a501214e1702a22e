//! Filesystem media store for cat images.
//!
//! # Responsibility
//! - Persist validated image files under `<root>/cats/images/`.
//! - Resolve stored references back to bytes.
//!
//! # Invariants
//! - References are media-root-relative, `/`-separated, and never escape the
//!   root.
//! - An existing file is never overwritten; colliding names get a short random
//!   suffix.

use crate::transcode::image::ImageFile;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Upload directory for cat images, relative to the media root.
pub const CAT_IMAGES_DIR: &str = "cats/images";
const SUFFIX_CHARS: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 8;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug)]
pub enum MediaError {
    Io {
        reference: String,
        source: std::io::Error,
    },
    InvalidReference(String),
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { reference, source } => {
                write!(f, "media io failed for `{reference}`: {source}")
            }
            Self::InvalidReference(reference) => {
                write!(f, "invalid media reference `{reference}`")
            }
        }
    }
}

impl Error for MediaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidReference(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes `file` and returns its stored reference, e.g.
    /// `cats/images/temp.png` or `cats/images/temp_1a2b3c4.png`.
    pub fn save(&self, file: &ImageFile) -> MediaResult<String> {
        let dir = self.root.join(CAT_IMAGES_DIR);
        std::fs::create_dir_all(&dir).map_err(|source| MediaError::Io {
            reference: CAT_IMAGES_DIR.to_string(),
            source,
        })?;

        let base_name = Path::new(&file.name)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| MediaError::InvalidReference(file.name.clone()))?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 0 {
                base_name.to_string()
            } else {
                with_random_suffix(base_name)
            };
            let reference = format!("{CAT_IMAGES_DIR}/{candidate}");
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&candidate))
            {
                Ok(mut handle) => {
                    handle
                        .write_all(&file.bytes)
                        .map_err(|source| MediaError::Io {
                            reference: reference.clone(),
                            source,
                        })?;
                    debug!(
                        "event=media_save module=media status=ok bytes={} attempt={attempt}",
                        file.bytes.len()
                    );
                    return Ok(reference);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(MediaError::Io { reference, source }),
            }
        }

        Err(MediaError::Io {
            reference: format!("{CAT_IMAGES_DIR}/{base_name}"),
            source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
        })
    }

    pub fn read(&self, reference: &str) -> MediaResult<Vec<u8>> {
        let path = self.resolve(reference)?;
        std::fs::read(path).map_err(|source| MediaError::Io {
            reference: reference.to_string(),
            source,
        })
    }

    /// Best-effort removal; a missing file is not an error.
    pub fn delete(&self, reference: &str) -> MediaResult<()> {
        let path = self.resolve(reference)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("event=media_delete module=media status=missing");
                Ok(())
            }
            Err(source) => Err(MediaError::Io {
                reference: reference.to_string(),
                source,
            }),
        }
    }

    fn resolve(&self, reference: &str) -> MediaResult<PathBuf> {
        let relative = Path::new(reference);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if reference.is_empty() || escapes {
            return Err(MediaError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn with_random_suffix(name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let suffix = &token[..SUFFIX_CHARS];
    match name.rsplit_once('.') {
        Some((stem, extension)) => format!("{stem}_{suffix}.{extension}"),
        None => format!("{name}_{suffix}"),
    }
}
