//! Wire ⇄ storage conversions for cat fields.
//!
//! # Responsibility
//! - `color`: exact hex → CSS3 name lookup on input, name passthrough on output.
//! - `image`: base64 data URI or raw upload → validated image file on input,
//!   stored file → data URI on output.
//!
//! Both directions are pure; persisting image bytes belongs to `media`.

pub mod color;
pub mod image;
