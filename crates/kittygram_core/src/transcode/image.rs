//! Image field transcoding.
//!
//! # Responsibility
//! - Decode `data:image/<ext>;base64,<payload>` strings into `temp.<ext>` files.
//! - Pass raw uploads through unchanged.
//! - Reject payloads that are empty, not a known image, or carry an
//!   unsupported extension.
//! - Render stored bytes back as a data URI.
//!
//! # Invariants
//! - Content is recognised by signature bytes; the extension is checked
//!   separately and does not need to agree with the content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prefix that marks an embedded image string.
pub const DATA_URI_MARKER: &str = "data:image";
/// File stem given to every decoded embedded image.
pub const TEMP_FILE_STEM: &str = "temp";
const BASE64_SEPARATOR: &str = ";base64,";

pub const MSG_NOT_A_FILE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";
pub const MSG_EMPTY_FILE: &str = "The submitted file is empty.";
pub const MSG_INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Recognised image container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
    Tiff,
    Ico,
}

const ALL_FORMATS: [ImageFormat; 7] = [
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::Ico,
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::Webp,
];

impl ImageFormat {
    /// Identifies the format from leading signature bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 14 && bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if bytes.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
            Some(Self::Ico)
        } else {
            None
        }
    }

    /// File extensions accepted for this format, lowercase.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            Self::Gif => &["gif"],
            Self::Bmp => &["bmp", "dib"],
            Self::Webp => &["webp"],
            Self::Tiff => &["tif", "tiff"],
            Self::Ico => &["ico"],
        }
    }

    /// Subtype for `image/<subtype>` media types.
    pub fn mime_subtype(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
            Self::Ico => "x-icon",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        let lowered = extension.to_ascii_lowercase();
        ALL_FORMATS
            .into_iter()
            .find(|format| format.extensions().contains(&lowered.as_str()))
    }
}

/// Named binary content headed for the media store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Text after the last `.` of the file name.
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, extension)| extension)
            .filter(|extension| !extension.is_empty())
    }
}

/// Raw inbound image value.
///
/// JSON bodies always produce `Encoded`; `Upload` is for callers that already
/// hold file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ImageInput {
    Encoded(String),
    Upload(ImageFile),
}

impl From<String> for ImageInput {
    fn from(value: String) -> Self {
        Self::Encoded(value)
    }
}

/// Image field rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// A string that is not an embedded image.
    NotAFile,
    Empty,
    ExtensionNotAllowed(String),
    /// Malformed data URI, bad base64, or unrecognised content.
    InvalidImage,
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAFile => write!(f, "{MSG_NOT_A_FILE}"),
            Self::Empty => write!(f, "{MSG_EMPTY_FILE}"),
            Self::ExtensionNotAllowed(extension) => write!(
                f,
                "File extension “{extension}” is not allowed. Allowed extensions are: {}.",
                allowed_extensions().join(", ")
            ),
            Self::InvalidImage => write!(f, "{MSG_INVALID_IMAGE}"),
        }
    }
}

impl Error for ImageError {}

/// Every extension the image validator accepts, sorted.
pub fn allowed_extensions() -> Vec<&'static str> {
    let mut extensions = ALL_FORMATS
        .into_iter()
        .flat_map(ImageFormat::extensions)
        .copied()
        .collect::<Vec<_>>();
    extensions.sort_unstable();
    extensions
}

/// Validated image ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImage {
    pub file: ImageFile,
    pub format: ImageFormat,
}

/// Converts an inbound image value into a validated file.
pub fn to_internal_value(input: ImageInput) -> Result<ValidImage, ImageError> {
    let file = match input {
        ImageInput::Encoded(data) if data.starts_with(DATA_URI_MARKER) => {
            decode_data_uri(&data)?
        }
        ImageInput::Encoded(_) => return Err(ImageError::NotAFile),
        ImageInput::Upload(file) => file,
    };
    let format = validate_image(&file)?;
    Ok(ValidImage { file, format })
}

/// Splits `<metadata>;base64,<payload>` and decodes the payload.
///
/// The extension is the last `/`-separated segment of the metadata.
pub fn decode_data_uri(data: &str) -> Result<ImageFile, ImageError> {
    let mut parts = data.split(BASE64_SEPARATOR);
    let (Some(metadata), Some(payload), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ImageError::InvalidImage);
    };

    let extension = metadata.rsplit('/').next().unwrap_or_default();
    let compact = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ImageError::InvalidImage)?;

    Ok(ImageFile::new(
        format!("{TEMP_FILE_STEM}.{extension}"),
        bytes,
    ))
}

/// Runs the image field checks in order: emptiness, content, extension.
pub fn validate_image(file: &ImageFile) -> Result<ImageFormat, ImageError> {
    if file.bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    let format = ImageFormat::sniff(&file.bytes).ok_or(ImageError::InvalidImage)?;
    let extension = file.extension().unwrap_or_default();
    if ImageFormat::from_extension(extension).is_none() {
        return Err(ImageError::ExtensionNotAllowed(extension.to_string()));
    }
    Ok(format)
}

/// Renders stored bytes as `data:image/<subtype>;base64,<payload>`.
///
/// The subtype follows the content when recognised, else the file extension.
pub fn to_representation(file_name: &str, bytes: &[u8]) -> String {
    let subtype = ImageFormat::sniff(bytes)
        .map(ImageFormat::mime_subtype)
        .map(str::to_string)
        .unwrap_or_else(|| {
            file_name
                .rsplit_once('.')
                .map(|(_, extension)| extension.to_ascii_lowercase())
                .unwrap_or_else(|| "octet-stream".to_string())
        });
    format!(
        "{DATA_URI_MARKER}/{subtype}{BASE64_SEPARATOR}{}",
        STANDARD.encode(bytes)
    )
}
