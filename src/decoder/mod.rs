//! Block decoder: one 16-byte compressed block in, the colour of every texel
//! of its footprint out.
//!
//! # Stages
//! Decoding happens in two steps, exposed separately through [`BlockDecoder`]:
//!   - `physical_to_symbolic` unpacks the raw bits into a [`SymbolicBlock`]
//!     (block mode, partitions, endpoint values, weights).
//!   - `decompress_symbolic` turns the symbolic form into texel colours.
//!
//! Neither step fails on bad input.  A block the format does not allow, or
//! one that needs the HDR profile, decodes to [`ERROR_COLOR`].
//!
//! # Tables
//! Unquantization tables are process-wide and built once.  Call
//! [`ensure_initialized`] before decoding; repeated calls are free.

pub mod endpoints;
pub mod partition;
pub mod physical;
pub mod quant;
pub mod texels;
pub mod weights;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::Extent3;
use crate::header::BlockDims;

/// Colour written for blocks the LDR profile cannot represent.
pub const ERROR_COLOR: [u8; 4] = [0xFF, 0x00, 0xFF, 0xFF];

/// Footprints with fewer texels than this sample partitions at double spacing.
const SMALL_BLOCK_TEXELS: usize = 31;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum DecodeError {
    /// The orchestrator lost track of the grid after a successful parse.
    /// Never caused by block contents.
    #[error("Internal decoder error: {0}")]
    Internal(String),
    #[error("Image {x}x{y}x{z} is too large to allocate")]
    ImageTooLarge { x: u32, y: u32, z: u32 },
    #[error("Slice {slice} out of range, image depth is {depth}")]
    SliceOutOfRange { slice: u32, depth: u32 },
}

// ── Decode mode ──────────────────────────────────────────────────────────────

/// How endpoint colours are expanded before interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeMode {
    /// Linear LDR: every channel expands by bit replication.
    Ldr,
    /// sRGB LDR: colour channels keep their top 8 bits, alpha is linear.
    #[default]
    LdrSrgb,
}

impl DecodeMode {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ldr"                   => Some(DecodeMode::Ldr),
            "ldr-srgb" | "srgb"     => Some(DecodeMode::LdrSrgb),
            _                       => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DecodeMode::Ldr     => "ldr",
            DecodeMode::LdrSrgb => "ldr-srgb",
        }
    }
}

// ── Block descriptors ────────────────────────────────────────────────────────

/// Per-footprint parameters shared by every block of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSizeDescriptor {
    pub dims:        BlockDims,
    pub texel_count: usize,
    pub small_block: bool,
}

impl BlockSizeDescriptor {
    pub fn new(dims: BlockDims) -> Self {
        let texel_count = dims.texel_count();
        Self { dims, texel_count, small_block: texel_count < SMALL_BLOCK_TEXELS }
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.dims.is_3d()
    }

    #[inline]
    pub fn extent(&self) -> Extent3 {
        self.dims.extent()
    }
}

/// Unpacked contents of a weighted (non-constant) block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedBlock {
    pub partition_count:  u8,
    /// 10-bit partition pattern seed; 0 for single-partition blocks.
    pub partition_seed:   u16,
    /// Endpoint mode per partition; entries past `partition_count` are unused.
    pub color_formats:    [u8; 4],
    /// Unquantized endpoint integers per partition.
    pub color_values:     [[u8; 8]; 4],
    pub weight_grid:      Extent3,
    /// Unquantized weights (0..=64) in grid order.
    pub plane1:           Vec<u8>,
    pub plane2:           Option<Vec<u8>>,
    /// Channel driven by `plane2`.
    pub plane2_component: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolicBlock {
    /// Illegal encoding; decodes to [`ERROR_COLOR`].
    Error,
    /// Void-extent block with a UNORM16 colour.
    ConstantLdr([u16; 4]),
    /// Void-extent block with FP16 colour; not representable in LDR.
    ConstantHdr([u16; 4]),
    Weighted(WeightedBlock),
}

/// Decoded texels of one block, x fastest, then y, then z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBlock {
    /// Texel-space position of the block's first texel.
    pub origin: Extent3,
    pub dims:   Extent3,
    pub texels: Vec<[u8; 4]>,
}

// ── Decoder trait ────────────────────────────────────────────────────────────

pub trait BlockDecoder: Send + Sync {
    fn physical_to_symbolic(&self, bsd: &BlockSizeDescriptor, block: &[u8; 16]) -> SymbolicBlock;

    fn decompress_symbolic(
        &self,
        bsd: &BlockSizeDescriptor,
        mode: DecodeMode,
        symbolic: &SymbolicBlock,
        origin: Extent3,
    ) -> DecodedBlock;

    /// Both stages in one call.
    fn decode_block(
        &self,
        bsd: &BlockSizeDescriptor,
        mode: DecodeMode,
        block: &[u8; 16],
        origin: Extent3,
    ) -> DecodedBlock {
        let symbolic = self.physical_to_symbolic(bsd, block);
        self.decompress_symbolic(bsd, mode, &symbolic, origin)
    }
}

/// Built-in ASTC decoder for the LDR profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct AstcDecoder;

impl BlockDecoder for AstcDecoder {
    fn physical_to_symbolic(&self, bsd: &BlockSizeDescriptor, block: &[u8; 16]) -> SymbolicBlock {
        physical::physical_to_symbolic(bsd, block)
    }

    fn decompress_symbolic(
        &self,
        bsd: &BlockSizeDescriptor,
        mode: DecodeMode,
        symbolic: &SymbolicBlock,
        origin: Extent3,
    ) -> DecodedBlock {
        texels::decompress_symbolic(bsd, mode, symbolic, origin)
    }
}

/// Build the shared unquantization tables if no call has done so yet.
pub fn ensure_initialized() {
    quant::tables();
}
