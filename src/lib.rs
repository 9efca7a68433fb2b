pub mod transport;
pub mod grid;
pub mod header;
pub mod decoder;
pub mod image;
pub mod orchestrator;
pub mod encoder;
pub mod config;
pub mod pipeline;

pub use config::ConvertOptions;
pub use decoder::{AstcDecoder, BlockDecoder, DecodeMode, ensure_initialized};
pub use encoder::{ImageEncoder, PngEncoder};
pub use header::{AstcHeader, BlockDims, ParsedContainer, parse};
pub use image::{ImageBuffer, Swizzle};
pub use pipeline::{ConvertError, Converter, convert_to_image, try_convert_to_image};
