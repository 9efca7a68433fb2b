//! Block grid orchestration: walk every block of a parsed container through
//! the block decoder and assemble the image.
//!
//! Blocks are independent.  With the `parallel` feature the per-block decode
//! runs on Rayon's pool; results are then written in grid order, so the
//! image is identical either way.

use crate::decoder::{AstcDecoder, BlockDecoder, BlockSizeDescriptor, DecodeError, DecodeMode, DecodedBlock};
use crate::grid::{BlockCoord, BlockGrid};
use crate::header::ParsedContainer;
use crate::image::{ImageBuffer, Swizzle};

fn decode_one(
    decoder: &dyn BlockDecoder,
    bsd: &BlockSizeDescriptor,
    grid: &BlockGrid,
    blocks: &[u8],
    mode: DecodeMode,
    coord: BlockCoord,
) -> Result<DecodedBlock, DecodeError> {
    let block = grid.block(blocks, coord).ok_or_else(|| {
        DecodeError::Internal(format!(
            "block ({}, {}, {}) outside the validated data region",
            coord.x, coord.y, coord.z
        ))
    })?;
    let decoded = decoder.decode_block(bsd, mode, block, grid.origin(coord));
    if Some(decoded.texels.len() as u64) != decoded.dims.checked_volume() {
        return Err(DecodeError::Internal(format!(
            "block ({}, {}, {}) decoded to {} texels for a {}x{}x{} footprint",
            coord.x, coord.y, coord.z,
            decoded.texels.len(),
            decoded.dims.x, decoded.dims.y, decoded.dims.z
        )));
    }
    Ok(decoded)
}

/// Decode every block of `parsed` with the built-in decoder.
pub fn decode(parsed: &ParsedContainer<'_>, mode: DecodeMode, swizzle: Swizzle) -> Result<ImageBuffer, DecodeError> {
    decode_with(&AstcDecoder, parsed, mode, swizzle)
}

/// Decode every block of `parsed` with `decoder`.
///
/// Errors if the grid and the block data disagree, which a successful parse
/// rules out, or if `decoder` returns a block whose texel count does not
/// match its footprint.
pub fn decode_with(
    decoder: &dyn BlockDecoder,
    parsed: &ParsedContainer<'_>,
    mode: DecodeMode,
    swizzle: Swizzle,
) -> Result<ImageBuffer, DecodeError> {
    let bsd = BlockSizeDescriptor::new(parsed.block_dims());
    let grid = &parsed.grid;
    let mut image = ImageBuffer::new(parsed.texel_dims())?;

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let coords: Vec<BlockCoord> = grid.coords().collect();
        let decoded: Vec<Result<DecodedBlock, DecodeError>> = coords
            .par_iter()
            .map(|&coord| decode_one(decoder, &bsd, grid, parsed.blocks, mode, coord))
            .collect();
        for block in decoded {
            image.write_block(&block?, swizzle);
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        for coord in grid.coords() {
            let block = decode_one(decoder, &bsd, grid, parsed.blocks, mode, coord)?;
            image.write_block(&block, swizzle);
        }
    }

    log::debug!("decoded {} blocks into {}x{}x{} image", grid.block_count(), image.width(), image.height(), image.depth());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{SymbolicBlock, ERROR_COLOR};
    use crate::grid::Extent3;
    use crate::header::{self, AstcHeader, BlockDims};
    use std::sync::Mutex;

    /// Paints each block with its own index and records the origins it saw.
    struct IndexDecoder {
        origins: Mutex<Vec<Extent3>>,
    }

    impl BlockDecoder for IndexDecoder {
        fn physical_to_symbolic(&self, _: &BlockSizeDescriptor, block: &[u8; 16]) -> SymbolicBlock {
            SymbolicBlock::ConstantLdr([u16::from(block[0]) * 257; 4])
        }

        fn decompress_symbolic(
            &self,
            bsd: &BlockSizeDescriptor,
            _: DecodeMode,
            symbolic: &SymbolicBlock,
            origin: Extent3,
        ) -> DecodedBlock {
            self.origins.lock().unwrap().push(origin);
            let SymbolicBlock::ConstantLdr(c) = symbolic else { panic!("unexpected block") };
            let v = (c[0] >> 8) as u8;
            DecodedBlock { origin, dims: bsd.extent(), texels: vec![[v, v, v, 0xFF]; bsd.texel_count] }
        }
    }

    fn container(size: Extent3, dims: (u8, u8, u8)) -> Vec<u8> {
        let block = BlockDims::new(dims.0, dims.1, dims.2).unwrap();
        let header = AstcHeader::new(block, size).unwrap();
        let count = header.grid().block_count() as usize;
        let mut blocks = vec![0u8; count * 16];
        for (i, b) in blocks.chunks_exact_mut(16).enumerate() {
            b[0] = i as u8 + 1;
        }
        header::write_container(&header, &blocks).unwrap()
    }

    #[test]
    fn blocks_land_at_their_grid_position() {
        let bytes = container(Extent3::new(10, 6, 1), (4, 4, 1));
        let parsed = header::parse(&bytes).unwrap();
        let decoder = IndexDecoder { origins: Mutex::new(Vec::new()) };
        let img = decode_with(&decoder, &parsed, DecodeMode::Ldr, Swizzle::RGBA).unwrap();

        assert_eq!(img.size, Extent3::new(10, 6, 1));
        assert_eq!(img.texel(0, 0, 0), Some([1, 1, 1, 255]));
        assert_eq!(img.texel(9, 0, 0), Some([3, 3, 3, 255]));
        assert_eq!(img.texel(4, 5, 0), Some([5, 5, 5, 255]));

        let mut origins = decoder.origins.into_inner().unwrap();
        origins.sort_by_key(|o| (o.z, o.y, o.x));
        assert_eq!(origins.len(), 6);
        assert_eq!(origins[2], Extent3::new(8, 0, 0));
        assert_eq!(origins[3], Extent3::new(0, 4, 0));
    }

    #[test]
    fn volume_grid_walks_every_slice() {
        let bytes = container(Extent3::new(3, 3, 6), (3, 3, 3));
        let parsed = header::parse(&bytes).unwrap();
        let decoder = IndexDecoder { origins: Mutex::new(Vec::new()) };
        let img = decode_with(&decoder, &parsed, DecodeMode::Ldr, Swizzle::RGBA).unwrap();
        assert_eq!(img.texel(1, 1, 2), Some([1, 1, 1, 255]));
        assert_eq!(img.texel(1, 1, 3), Some([2, 2, 2, 255]));
    }

    /// Drops the last texels of every block.
    struct ShortDecoder;

    impl BlockDecoder for ShortDecoder {
        fn physical_to_symbolic(&self, _: &BlockSizeDescriptor, _: &[u8; 16]) -> SymbolicBlock {
            SymbolicBlock::Error
        }

        fn decompress_symbolic(
            &self,
            bsd: &BlockSizeDescriptor,
            _: DecodeMode,
            _: &SymbolicBlock,
            origin: Extent3,
        ) -> DecodedBlock {
            DecodedBlock { origin, dims: bsd.extent(), texels: vec![ERROR_COLOR; 3] }
        }
    }

    #[test]
    fn short_decoder_output_is_an_error() {
        let bytes = container(Extent3::new(4, 4, 1), (4, 4, 1));
        let parsed = header::parse(&bytes).unwrap();
        let err = decode_with(&ShortDecoder, &parsed, DecodeMode::Ldr, Swizzle::RGBA).unwrap_err();
        match err {
            DecodeError::Internal(msg) => assert!(msg.contains("3 texels"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_decode_matches_sequential_walk() {
        let bytes = container(Extent3::new(37, 23, 1), (6, 5, 1));
        let parsed = header::parse(&bytes).unwrap();
        let swizzle: Swizzle = "bgr1".parse().unwrap();

        let bsd = BlockSizeDescriptor::new(parsed.block_dims());
        let mut expected = ImageBuffer::new(parsed.texel_dims()).unwrap();
        for coord in parsed.grid.coords() {
            let block = parsed.grid.block(parsed.blocks, coord).unwrap();
            let decoded = AstcDecoder.decode_block(&bsd, DecodeMode::LdrSrgb, block, parsed.grid.origin(coord));
            expected.write_block(&decoded, swizzle);
        }

        let img = decode(&parsed, DecodeMode::LdrSrgb, swizzle).unwrap();
        assert_eq!(img.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn builtin_decoder_fills_illegal_blocks_with_error_colour() {
        let header = AstcHeader::new(BlockDims::new(4, 4, 1).unwrap(), Extent3::new(4, 4, 1)).unwrap();
        let bytes = header::write_container(&header, &[0u8; 16]).unwrap();
        let parsed = header::parse(&bytes).unwrap();
        let img = decode(&parsed, DecodeMode::LdrSrgb, Swizzle::RGBA).unwrap();
        assert!(img.as_bytes().chunks_exact(4).all(|t| t == ERROR_COLOR));
    }
}
