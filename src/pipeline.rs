//! Pipeline façade: base-64 container in, PNG data URI out.
//!
//! ```no_run
//! use astc_png::pipeline::convert_to_image;
//!
//! let uri = convert_to_image("E6vhXAQEAQQAAAQAAAEAAA...");
//! if uri.is_empty() {
//!     // not a valid container
//! }
//! ```
//!
//! Every stage reports a typed error internally.  [`convert_to_image`]
//! reduces them all to an empty string; [`try_convert_to_image`] and
//! [`Converter`] hand them to the caller.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConvertOptions;
use crate::decoder::{self, AstcDecoder, BlockDecoder, DecodeError};
use crate::encoder::{EncodeError, ImageEncoder, PngEncoder};
use crate::header::{self, HeaderError};
use crate::image::CHANNELS;
use crate::orchestrator;
use crate::transport::{self, TransportError};

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Transport decoding failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Empty payload")]
    EmptyPayload,
    #[error("Container rejected: {0}")]
    Header(#[from] HeaderError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
}

// ── Debug dump ───────────────────────────────────────────────────────────────

/// Writes a copy of each encoded image to a fixed path.
#[derive(Debug, Clone)]
pub struct DebugDump {
    path: PathBuf,
}

impl DebugDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails the conversion; problems are logged.
    pub fn write(&self, png: &[u8]) {
        match fs::write(&self.path, png) {
            Ok(()) => log::debug!("wrote {} byte debug image to {}", png.len(), self.path.display()),
            Err(e) => log::warn!("could not write debug image {}: {e}", self.path.display()),
        }
    }
}

// ── Converter ────────────────────────────────────────────────────────────────

pub struct Converter {
    decoder: Box<dyn BlockDecoder>,
    encoder: Box<dyn ImageEncoder>,
    options: ConvertOptions,
    dump:    Option<DebugDump>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl Converter {
    /// Built-in ASTC decoder and PNG encoder.
    pub fn new(options: ConvertOptions) -> Self {
        let dump = options.debug_output.clone().map(DebugDump::new);
        Self { decoder: Box::new(AstcDecoder), encoder: Box::new(PngEncoder), options, dump }
    }

    pub fn with_decoder(mut self, decoder: impl BlockDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn with_encoder(mut self, encoder: impl ImageEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Binary container to encoded image bytes.
    pub fn container_to_png(&self, container: &[u8]) -> Result<Vec<u8>, ConvertError> {
        decoder::ensure_initialized();
        let parsed = header::parse(container)?;
        let opts = &self.options;
        let image = orchestrator::decode_with(self.decoder.as_ref(), &parsed, opts.decode_mode, opts.swizzle)?;
        let pixels = image.to_rgba8(opts.slice, opts.flip_y)?;
        let (width, height) = (image.width(), image.height());
        drop(image);

        let png = self.encoder.encode(width, height, CHANNELS as u8, &pixels)?;
        if let Some(dump) = &self.dump {
            dump.write(&png);
        }
        Ok(png)
    }

    /// Base-64 container to PNG data URI.
    pub fn convert(&self, input: &str) -> Result<String, ConvertError> {
        let container = transport::try_decode(input)?;
        if container.is_empty() {
            return Err(ConvertError::EmptyPayload);
        }
        let png = self.container_to_png(&container)?;
        Ok(transport::to_data_uri(&png))
    }
}

// ── Façade ───────────────────────────────────────────────────────────────────

/// Convert with explicit options, keeping the error.
pub fn try_convert_to_image(input: &str, options: &ConvertOptions) -> Result<String, ConvertError> {
    Converter::new(options.clone()).convert(input)
}

/// Convert a base-64 container to a `data:image/png;base64,` URI using the
/// default options.  Returns an empty string if any stage fails.
pub fn convert_to_image(input: &str) -> String {
    convert_to_image_with(input, &ConvertOptions::default())
}

pub fn convert_to_image_with(input: &str, options: &ConvertOptions) -> String {
    match try_convert_to_image(input, options) {
        Ok(uri) => uri,
        Err(ConvertError::Decode(e @ DecodeError::Internal(_))) => {
            log::error!("internal decoder failure: {e}");
            String::new()
        }
        Err(e) => {
            log::debug!("conversion failed: {e}");
            String::new()
        }
    }
}
