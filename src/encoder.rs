//! Image encoder seam and the built-in PNG encoder.
//!
//! Encoders never touch the filesystem; output is appended to an in-memory
//! sink owned by the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unsupported channel count {0}, expected 1-4")]
    UnsupportedChannels(u8),
    #[error("Pixel buffer holds {actual} bytes, {width}x{height}x{channels} needs {expected}")]
    BufferSize { width: u32, height: u32, channels: u8, expected: usize, actual: usize },
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

pub trait ImageEncoder: Send + Sync {
    /// Encode row-major interleaved `pixels` of `channels` 8-bit samples.
    fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> Result<Vec<u8>, EncodeError>;
}

/// PNG output, 8 bits per sample, default compression.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngEncoder;

fn color_type(channels: u8) -> Result<png::ColorType, EncodeError> {
    match channels {
        1 => Ok(png::ColorType::Grayscale),
        2 => Ok(png::ColorType::GrayscaleAlpha),
        3 => Ok(png::ColorType::Rgb),
        4 => Ok(png::ColorType::Rgba),
        n => Err(EncodeError::UnsupportedChannels(n)),
    }
}

impl ImageEncoder for PngEncoder {
    fn encode(&self, width: u32, height: u32, channels: u8, pixels: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let color = color_type(channels)?;
        let expected = width as usize * height as usize * usize::from(channels);
        if pixels.len() != expected {
            return Err(EncodeError::BufferSize { width, height, channels, expected, actual: pixels.len() });
        }

        let mut output = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut output, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(pixels)?;
            writer.finish()?;
        }
        log::debug!("encoded {width}x{height} PNG ({channels} channels): {} bytes", output.len());
        Ok(output)
    }
}
