//! Block grid geometry.
//!
//! The grid is never stored in the container; it is derived from the block
//! footprint and the texel extent.  Blocks are laid out x fastest, then y,
//! then z, 16 bytes each.  All offset arithmetic lives in [`BlockGrid::offset`].

use serde::{Deserialize, Serialize};

/// Size of one compressed block in bytes.
pub const BLOCK_BYTES: usize = 16;

/// A three-axis size or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent3 {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Extent3 {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Product of the three axes, saturating at `u64::MAX`.
    pub fn volume(&self) -> u64 {
        self.checked_volume().unwrap_or(u64::MAX)
    }

    /// Product of the three axes, or `None` if it does not fit in 64 bits.
    pub fn checked_volume(&self) -> Option<u64> {
        u64::from(self.x)
            .checked_mul(u64::from(self.y))?
            .checked_mul(u64::from(self.z))
    }
}

/// Position of a block in the grid, in block units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGrid {
    /// Texel footprint of one block.
    pub block:  Extent3,
    /// Texel extent of the image.
    pub texels: Extent3,
    /// Number of blocks along each axis.
    pub blocks: Extent3,
}

impl BlockGrid {
    pub fn new(block: Extent3, texels: Extent3) -> Self {
        let blocks = Extent3 {
            x: texels.x.div_ceil(block.x),
            y: texels.y.div_ceil(block.y),
            z: texels.z.div_ceil(block.z),
        };
        Self { block, texels, blocks }
    }

    pub fn block_count(&self) -> u64 {
        self.blocks.volume()
    }

    /// Bytes of block data the grid requires, or `None` if that overflows.
    pub fn byte_len(&self) -> Option<u64> {
        self.blocks.checked_volume()?.checked_mul(BLOCK_BYTES as u64)
    }

    /// Byte offset of `coord` within the block data region.
    #[inline]
    pub fn offset(&self, coord: BlockCoord) -> usize {
        let (bx, by) = (self.blocks.x as usize, self.blocks.y as usize);
        ((coord.z as usize * by + coord.y as usize) * bx + coord.x as usize) * BLOCK_BYTES
    }

    /// Texel-space origin of the block at `coord`.
    #[inline]
    pub fn origin(&self, coord: BlockCoord) -> Extent3 {
        Extent3 {
            x: coord.x * self.block.x,
            y: coord.y * self.block.y,
            z: coord.z * self.block.z,
        }
    }

    /// Every block coordinate in payload order: z outer, y middle, x inner.
    pub fn coords(&self) -> impl Iterator<Item = BlockCoord> + Send + '_ {
        let Extent3 { x: bx, y: by, z: bz } = self.blocks;
        (0..bz).flat_map(move |z| {
            (0..by).flat_map(move |y| (0..bx).map(move |x| BlockCoord { x, y, z }))
        })
    }

    /// The 16-byte block at `coord`, or `None` if it lies outside `data`.
    pub fn block<'a>(&self, data: &'a [u8], coord: BlockCoord) -> Option<&'a [u8; BLOCK_BYTES]> {
        if coord.x >= self.blocks.x || coord.y >= self.blocks.y || coord.z >= self.blocks.z {
            return None;
        }
        let start = self.offset(coord);
        data.get(start..start + BLOCK_BYTES)?.try_into().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_use_ceiling_division() {
        let grid = BlockGrid::new(Extent3::new(4, 4, 1), Extent3::new(10, 8, 1));
        assert_eq!(grid.blocks, Extent3::new(3, 2, 1));
        assert_eq!(grid.block_count(), 6);
        assert_eq!(grid.byte_len(), Some(96));
    }

    #[test]
    fn oversized_grid_has_no_byte_len() {
        // 2^21 x 2^21 x 2^22 blocks: the block count alone needs 65 bits.
        let grid = BlockGrid::new(Extent3::new(4, 4, 1), Extent3::new(1 << 23, 1 << 23, 1 << 22));
        assert_eq!(grid.blocks.checked_volume(), None);
        assert_eq!(grid.block_count(), u64::MAX);
        assert_eq!(grid.byte_len(), None);

        // Fits in 64 bits as a count, overflows once scaled to bytes.
        let grid = BlockGrid::new(Extent3::new(4, 4, 1), Extent3::new(1 << 23, 1 << 23, 1 << 20));
        assert_eq!(grid.block_count(), 1 << 62);
        assert_eq!(grid.byte_len(), None);
    }

    #[test]
    fn coords_follow_payload_order() {
        let grid = BlockGrid::new(Extent3::new(3, 3, 3), Extent3::new(6, 6, 6));
        let offsets: Vec<usize> = grid.coords().map(|c| grid.offset(c)).collect();
        let expected: Vec<usize> = (0..8).map(|i| i * BLOCK_BYTES).collect();
        assert_eq!(offsets, expected);

        let last = grid.coords().last().unwrap();
        assert_eq!(last, BlockCoord { x: 1, y: 1, z: 1 });
        assert_eq!(grid.origin(last), Extent3::new(3, 3, 3));
    }

    #[test]
    fn block_lookup_is_bounds_checked() {
        let grid = BlockGrid::new(Extent3::new(4, 4, 1), Extent3::new(8, 4, 1));
        let data: Vec<u8> = (0..32).collect();
        let second = grid.block(&data, BlockCoord { x: 1, y: 0, z: 0 }).unwrap();
        assert_eq!(second[0], 16);
        assert!(grid.block(&data, BlockCoord { x: 2, y: 0, z: 0 }).is_none());
        assert!(grid.block(&data[..20], BlockCoord { x: 1, y: 0, z: 0 }).is_none());
    }
}
