//! Physical → symbolic block unpacking.
//!
//! # Bit layout (LSB of byte 0 is bit 0)
//! - bits 0..11: block mode (weight grid, weight quantization, dual plane)
//! - bits 11..13: partition count − 1
//! - single partition: bits 13..17 endpoint mode, colour data from bit 17
//! - multiple partitions: bits 13..23 partition seed, 23..29 endpoint modes,
//!   colour data from bit 29
//! - weights are stored bit-reversed from bit 127 downwards; extra endpoint
//!   mode bits and the dual-plane channel sit directly below them
//!
//! Anything the format forbids yields [`SymbolicBlock::Error`].

use super::quant::{self, QUANT_32, QUANT_6};
use super::{endpoints, BlockSizeDescriptor, SymbolicBlock, WeightedBlock};
use crate::grid::Extent3;

const MAX_WEIGHTS: usize = 64;
const MIN_WEIGHT_BITS: usize = 24;
const MAX_WEIGHT_BITS: usize = 96;

/// Marker in the low nine bits of a void-extent (constant colour) block.
const VOID_EXTENT_MARKER: u32 = 0x1FC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockMode {
    pub grid:         Extent3,
    pub dual_plane:   bool,
    pub weight_quant: u8,
    /// Stored weights across both planes.
    pub weight_count: usize,
    pub weight_bits:  usize,
}

fn finish_mode(grid: Extent3, base_quant: u32, high: bool, dual_plane: bool) -> Option<BlockMode> {
    let weight_quant = (base_quant - 2 + if high { 6 } else { 0 }) as u8;
    if weight_quant > QUANT_32 {
        return None;
    }
    let weight_count = grid.volume() as usize * if dual_plane { 2 } else { 1 };
    let weight_bits = quant::ise_bit_count(weight_count, weight_quant);
    let legal = weight_count <= MAX_WEIGHTS && (MIN_WEIGHT_BITS..=MAX_WEIGHT_BITS).contains(&weight_bits);
    legal.then_some(BlockMode { grid, dual_plane, weight_quant, weight_count, weight_bits })
}

pub(crate) fn decode_block_mode_2d(mode: u32) -> Option<BlockMode> {
    let mut base_quant = (mode >> 4) & 1;
    let mut high = (mode >> 9) & 1 != 0;
    let mut dual = (mode >> 10) & 1 != 0;
    let a = (mode >> 5) & 3;

    let (x, y);
    if mode & 3 != 0 {
        base_quant |= (mode & 3) << 1;
        let b = (mode >> 7) & 3;
        match (mode >> 2) & 3 {
            0 => (x, y) = (b + 4, a + 2),
            1 => (x, y) = (b + 8, a + 2),
            2 => (x, y) = (a + 2, b + 8),
            _ => {
                let b = b & 1;
                if mode & 0x100 != 0 {
                    (x, y) = (b + 2, a + 2);
                } else {
                    (x, y) = (a + 2, b + 6);
                }
            }
        }
    } else {
        base_quant |= ((mode >> 2) & 3) << 1;
        if (mode >> 2) & 3 == 0 {
            return None;
        }
        let b = (mode >> 9) & 3;
        match (mode >> 7) & 3 {
            0 => (x, y) = (12, a + 2),
            1 => (x, y) = (a + 2, 12),
            2 => {
                (x, y) = (a + 6, b + 6);
                dual = false;
                high = false;
            }
            _ => match (mode >> 5) & 3 {
                0 => (x, y) = (6, 10),
                1 => (x, y) = (10, 6),
                _ => return None,
            },
        }
    }
    finish_mode(Extent3::new(x, y, 1), base_quant, high, dual)
}

pub(crate) fn decode_block_mode_3d(mode: u32) -> Option<BlockMode> {
    let mut base_quant = (mode >> 4) & 1;
    let mut high = (mode >> 9) & 1 != 0;
    let mut dual = (mode >> 10) & 1 != 0;
    let a = (mode >> 5) & 3;

    let grid;
    if mode & 3 != 0 {
        base_quant |= (mode & 3) << 1;
        let b = (mode >> 7) & 3;
        let c = (mode >> 2) & 3;
        grid = Extent3::new(a + 2, b + 2, c + 2);
    } else {
        base_quant |= ((mode >> 2) & 3) << 1;
        if (mode >> 2) & 3 == 0 {
            return None;
        }
        let b = (mode >> 9) & 3;
        if (mode >> 7) & 3 != 3 {
            dual = false;
            high = false;
        }
        grid = match (mode >> 7) & 3 {
            0 => Extent3::new(6, b + 2, a + 2),
            1 => Extent3::new(a + 2, 6, b + 2),
            2 => Extent3::new(a + 2, b + 2, 6),
            _ => match (mode >> 5) & 3 {
                0 => Extent3::new(6, 2, 2),
                1 => Extent3::new(2, 6, 2),
                2 => Extent3::new(2, 2, 6),
                _ => return None,
            },
        };
    }
    finish_mode(grid, base_quant, high, dual)
}

fn void_extent(bsd: &BlockSizeDescriptor, bits: u128) -> SymbolicBlock {
    let read = |offset, count| quant::read_bits(bits, offset, count);
    let valid = if bsd.is_3d() {
        let ext: Vec<u32> = (0..6).map(|i| read(10 + 9 * i, 9)).collect();
        ext.iter().all(|&e| e == 0x1FF) || ext.chunks_exact(2).all(|p| p[0] < p[1])
    } else {
        if read(10, 2) != 3 {
            return SymbolicBlock::Error;
        }
        let ext: Vec<u32> = (0..4).map(|i| read(12 + 13 * i, 13)).collect();
        ext.iter().all(|&e| e == 0x1FFF) || ext.chunks_exact(2).all(|p| p[0] < p[1])
    };
    if !valid {
        return SymbolicBlock::Error;
    }
    let color = [read(64, 16), read(80, 16), read(96, 16), read(112, 16)].map(|c| c as u16);
    if read(9, 1) != 0 {
        SymbolicBlock::ConstantHdr(color)
    } else {
        SymbolicBlock::ConstantLdr(color)
    }
}

/// Unpack the 128 physical bits of `block` into a [`SymbolicBlock`].
pub fn physical_to_symbolic(bsd: &BlockSizeDescriptor, block: &[u8; 16]) -> SymbolicBlock {
    let bits = u128::from_le_bytes(*block);
    let read = |offset, count| quant::read_bits(bits, offset, count);

    let mode = read(0, 11);
    if mode & 0x1FF == VOID_EXTENT_MARKER {
        return void_extent(bsd, bits);
    }

    let decoded = if bsd.is_3d() { decode_block_mode_3d(mode) } else { decode_block_mode_2d(mode) };
    let Some(block_mode) = decoded else {
        return SymbolicBlock::Error;
    };
    let dims = bsd.extent();
    if block_mode.grid.x > dims.x || block_mode.grid.y > dims.y || block_mode.grid.z > dims.z {
        return SymbolicBlock::Error;
    }

    let partition_count = read(11, 2) as u8 + 1;
    if partition_count == 4 && block_mode.dual_plane {
        return SymbolicBlock::Error;
    }

    let mut below_weights = 128 - block_mode.weight_bits;
    let mut formats = [0u8; 4];
    let partition_seed;
    let color_start;
    if partition_count == 1 {
        partition_seed = 0;
        formats[0] = read(13, 4) as u8;
        color_start = 17;
    } else {
        partition_seed = read(13, 10) as u16;
        color_start = 29;
        let low = read(23, 6);
        let selector = low & 3;
        if selector == 0 {
            formats = [((low >> 2) & 0xF) as u8; 4];
        } else {
            let high_bits = 3 * usize::from(partition_count) - 4;
            below_weights -= high_bits;
            let encoded = low | (read(below_weights, high_bits) << 6);
            let class = selector - 1;
            let n = usize::from(partition_count);
            for (i, format) in formats.iter_mut().take(n).enumerate() {
                let class_bit = (encoded >> (2 + i)) & 1;
                let mode_bits = (encoded >> (2 + n + 2 * i)) & 3;
                *format = (((class + class_bit) << 2) | mode_bits) as u8;
            }
        }
    }

    let formats = &formats[..usize::from(partition_count)];
    let integer_count: usize = formats.iter().map(|&f| endpoints::value_count(f)).sum();
    if integer_count > quant::MAX_COLOR_INTEGERS {
        return SymbolicBlock::Error;
    }

    let plane2_component = block_mode.dual_plane.then(|| read(below_weights - 2, 2) as u8);
    let color_bits = below_weights as isize - color_start as isize - if block_mode.dual_plane { 2 } else { 0 };
    if color_bits <= 0 {
        return SymbolicBlock::Error;
    }

    let tables = quant::tables();
    let color_quant = match tables.color_quant_for(integer_count, color_bits as usize) {
        Some(q) if q >= QUANT_6 => q,
        _ => return SymbolicBlock::Error,
    };

    let color_table = &tables.color[usize::from(color_quant)];
    let raw_colors = quant::decode_ise(color_quant, integer_count, bits, color_start);
    let mut color_values = [[0u8; 8]; 4];
    let mut next = raw_colors.iter().map(|&v| color_table[usize::from(v)]);
    for (values, &format) in color_values.iter_mut().zip(formats) {
        for slot in values.iter_mut().take(endpoints::value_count(format)) {
            *slot = next.next().unwrap_or(0);
        }
    }

    let weight_table = &tables.weight[usize::from(block_mode.weight_quant)];
    let raw_weights = quant::decode_ise(block_mode.weight_quant, block_mode.weight_count, bits.reverse_bits(), 0);
    let weights: Vec<u8> = raw_weights.iter().map(|&v| weight_table[usize::from(v)]).collect();
    let (plane1, plane2) = if block_mode.dual_plane {
        let even = weights.iter().step_by(2).copied().collect();
        let odd = weights.iter().skip(1).step_by(2).copied().collect();
        (even, Some(odd))
    } else {
        (weights, None)
    };

    let mut color_formats = [0u8; 4];
    color_formats[..formats.len()].copy_from_slice(formats);

    SymbolicBlock::Weighted(WeightedBlock {
        partition_count,
        partition_seed,
        color_formats,
        color_values,
        weight_grid: block_mode.grid,
        plane1,
        plane2,
        plane2_component,
    })
}
