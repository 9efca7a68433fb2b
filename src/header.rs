//! `.astc` container header and parser.
//!
//! # Layout (16 bytes, little-endian)
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0  | 4 | magic `0x5CA1AB13` |
//! | 4  | 1 | block width |
//! | 5  | 1 | block height |
//! | 6  | 1 | block depth |
//! | 7  | 3 | texel width (u24) |
//! | 10 | 3 | texel height (u24) |
//! | 13 | 3 | texel depth (u24) |
//!
//! The header is followed by `blocks.x * blocks.y * blocks.z` 16-byte blocks.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::grid::{BlockGrid, Extent3};

pub const MAGIC: u32 = 0x5CA1_AB13;
pub const HEADER_SIZE: usize = 16;

/// Largest texel dimension a 24-bit size field can carry.
pub const MAX_DIMENSION: u32 = 0x00FF_FFFF;

/// Block edge lengths allowed for 2D footprints (depth must be 1).
pub const FOOTPRINTS_2D: [u8; 6] = [4, 5, 6, 8, 10, 12];
/// Inclusive range of block edge lengths allowed for 3D footprints.
pub const FOOTPRINT_3D_RANGE: std::ops::RangeInclusive<u8> = 3..=6;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("Container too short: {0} bytes, header needs 16")]
    TooShort(usize),
    #[error("Invalid magic number 0x{0:08x}")]
    InvalidMagic(u32),
    #[error("Illegal block dimensions {x}x{y}x{z}")]
    IllegalBlockDimensions { x: u8, y: u8, z: u8 },
    #[error("Zero texel dimension {x}x{y}x{z}")]
    ZeroDimension { x: u32, y: u32, z: u32 },
    #[error("Texel dimension {0} does not fit in 24 bits")]
    DimensionTooLarge(u32),
    #[error("Truncated container: {required} bytes of blocks declared, {available} present")]
    Truncated { required: u64, available: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Validated block footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockDims {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl BlockDims {
    /// Accepts either a 3D footprint (each axis in 3..=6) or a 2D footprint
    /// (x and y from [`FOOTPRINTS_2D`], z == 1).
    pub fn new(x: u8, y: u8, z: u8) -> Result<Self, HeaderError> {
        let in_3d = |d: u8| FOOTPRINT_3D_RANGE.contains(&d);
        let in_2d = |d: u8| FOOTPRINTS_2D.contains(&d);
        let legal_3d = in_3d(x) && in_3d(y) && in_3d(z);
        let legal_2d = in_2d(x) && in_2d(y) && z == 1;
        if legal_3d || legal_2d {
            Ok(Self { x, y, z })
        } else {
            Err(HeaderError::IllegalBlockDimensions { x, y, z })
        }
    }

    pub fn is_3d(&self) -> bool {
        self.z > 1
    }

    pub fn texel_count(&self) -> usize {
        usize::from(self.x) * usize::from(self.y) * usize::from(self.z)
    }

    pub fn extent(&self) -> Extent3 {
        Extent3::new(u32::from(self.x), u32::from(self.y), u32::from(self.z))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstcHeader {
    pub block: BlockDims,
    pub size:  Extent3,
}

impl AstcHeader {
    pub fn new(block: BlockDims, size: Extent3) -> Result<Self, HeaderError> {
        validate_size(size)?;
        for d in [size.x, size.y, size.z] {
            if d > MAX_DIMENSION {
                return Err(HeaderError::DimensionTooLarge(d));
            }
        }
        Ok(Self { block, size })
    }

    pub fn grid(&self) -> BlockGrid {
        BlockGrid::new(self.block.extent(), self.size)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(MAGIC)?;
        writer.write_u8(self.block.x)?;
        writer.write_u8(self.block.y)?;
        writer.write_u8(self.block.z)?;
        writer.write_u24::<LittleEndian>(self.size.x)?;
        writer.write_u24::<LittleEndian>(self.size.y)?;
        writer.write_u24::<LittleEndian>(self.size.z)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, HeaderError> {
        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(HeaderError::InvalidMagic(magic));
        }
        let (bx, by, bz) = (reader.read_u8()?, reader.read_u8()?, reader.read_u8()?);
        let block = BlockDims::new(bx, by, bz)?;
        let size = Extent3 {
            x: reader.read_u24::<LittleEndian>()?,
            y: reader.read_u24::<LittleEndian>()?,
            z: reader.read_u24::<LittleEndian>()?,
        };
        validate_size(size)?;
        Ok(Self { block, size })
    }
}

fn validate_size(size: Extent3) -> Result<(), HeaderError> {
    if size.x == 0 || size.y == 0 || size.z == 0 {
        return Err(HeaderError::ZeroDimension { x: size.x, y: size.y, z: size.z });
    }
    Ok(())
}

/// A parsed container borrowing its block data from the input payload.
#[derive(Debug, Clone, Copy)]
pub struct ParsedContainer<'a> {
    pub header: AstcHeader,
    pub grid:   BlockGrid,
    /// Everything after the header; at least `grid.byte_len()` bytes.
    pub blocks: &'a [u8],
}

impl<'a> ParsedContainer<'a> {
    pub fn block_dims(&self) -> BlockDims {
        self.header.block
    }

    pub fn texel_dims(&self) -> Extent3 {
        self.header.size
    }

    pub fn block_counts(&self) -> Extent3 {
        self.grid.blocks
    }
}

/// Validate the header of `payload` and check the block data is complete.
/// No bytes are copied; the result borrows `payload`.
pub fn parse(payload: &[u8]) -> Result<ParsedContainer<'_>, HeaderError> {
    if payload.len() < HEADER_SIZE {
        log::debug!("container rejected: {} bytes is shorter than the header", payload.len());
        return Err(HeaderError::TooShort(payload.len()));
    }
    let (head, blocks) = payload.split_at(HEADER_SIZE);

    let header = AstcHeader::read(head).inspect_err(|e| log::warn!("container not recognized: {e}"))?;
    let grid = header.grid();

    let required = grid.byte_len().unwrap_or(u64::MAX);
    if (blocks.len() as u64) < required {
        log::warn!(
            "truncated container: {}x{}x{} blocks need {} bytes, {} present",
            grid.blocks.x, grid.blocks.y, grid.blocks.z, required, blocks.len()
        );
        return Err(HeaderError::Truncated { required, available: blocks.len() });
    }

    log::debug!(
        "container {}x{}x{} texels, {}x{}x{} footprint, {} blocks",
        header.size.x, header.size.y, header.size.z,
        header.block.x, header.block.y, header.block.z,
        grid.block_count()
    );
    Ok(ParsedContainer { header, grid, blocks })
}

/// Build a complete container from a header and its block data.
pub fn write_container(header: &AstcHeader, blocks: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_SIZE + blocks.len());
    header.write(&mut out)?;
    out.write_all(blocks)?;
    Ok(out)
}
