//! Symbolic → texel colours.

use super::endpoints::{self, Rgba};
use super::partition::select_partition;
use super::weights::infill;
use super::{BlockSizeDescriptor, DecodeMode, DecodedBlock, SymbolicBlock, WeightedBlock, ERROR_COLOR};
use crate::grid::Extent3;

/// Round a 16-bit channel to 8 bits.
#[inline]
fn unorm16_to_u8(c: u32) -> u8 {
    ((c * 255 + 32767) / 65535) as u8
}

/// Convert one interpolated 16-bit channel to its 8-bit output value.
#[inline]
fn output_channel(mode: DecodeMode, channel: usize, c: u32) -> u8 {
    match mode {
        DecodeMode::LdrSrgb if channel < 3 => (c >> 8) as u8,
        _ => unorm16_to_u8(c),
    }
}

/// Widen an 8-bit endpoint channel to 16 bits before interpolation.
#[inline]
fn expand_endpoint(mode: DecodeMode, channel: usize, c: i32) -> u32 {
    let c = c.clamp(0, 255) as u32;
    match mode {
        DecodeMode::LdrSrgb if channel < 3 => (c << 8) | 0x80,
        _ => c * 257,
    }
}

fn filled(bsd: &BlockSizeDescriptor, origin: Extent3, color: [u8; 4]) -> DecodedBlock {
    DecodedBlock { origin, dims: bsd.extent(), texels: vec![color; bsd.texel_count] }
}

/// Expand every texel of `symbolic` to an RGBA8 colour.
pub fn decompress_symbolic(
    bsd: &BlockSizeDescriptor,
    mode: DecodeMode,
    symbolic: &SymbolicBlock,
    origin: Extent3,
) -> DecodedBlock {
    match symbolic {
        SymbolicBlock::Error | SymbolicBlock::ConstantHdr(_) => filled(bsd, origin, ERROR_COLOR),
        SymbolicBlock::ConstantLdr(color) => {
            let mut rgba = [0u8; 4];
            for (ch, (out, &c)) in rgba.iter_mut().zip(color).enumerate() {
                *out = output_channel(mode, ch, u32::from(c));
            }
            filled(bsd, origin, rgba)
        }
        SymbolicBlock::Weighted(block) => match weighted(bsd, mode, block) {
            Some(texels) => DecodedBlock { origin, dims: bsd.extent(), texels },
            None => filled(bsd, origin, ERROR_COLOR),
        },
    }
}

fn weighted(bsd: &BlockSizeDescriptor, mode: DecodeMode, block: &WeightedBlock) -> Option<Vec<[u8; 4]>> {
    let count = usize::from(block.partition_count);
    let mut pairs: Vec<(Rgba, Rgba)> = Vec::with_capacity(count);
    for (&format, values) in block.color_formats.iter().zip(&block.color_values).take(count) {
        pairs.push(endpoints::decode_ldr(format, values)?);
    }

    let dims = bsd.extent();
    let plane1 = infill(dims, block.weight_grid, &block.plane1);
    let plane2 = block.plane2.as_ref().map(|w| infill(dims, block.weight_grid, w));
    let plane2_channel = block.plane2_component.map(usize::from);

    let mut texels = Vec::with_capacity(bsd.texel_count);
    for z in 0..dims.z {
        for y in 0..dims.y {
            for x in 0..dims.x {
                let i = texels.len();
                let p = select_partition(block.partition_seed, x, y, z, block.partition_count, bsd.small_block);
                let (e0, e1) = pairs[usize::from(p)];
                let mut rgba = [0u8; 4];
                for (ch, out) in rgba.iter_mut().enumerate() {
                    let w = match (&plane2, plane2_channel) {
                        (Some(p2), Some(c)) if c == ch => p2[i],
                        _ => plane1[i],
                    };
                    let w = u32::from(w);
                    let c0 = expand_endpoint(mode, ch, e0[ch]);
                    let c1 = expand_endpoint(mode, ch, e1[ch]);
                    *out = output_channel(mode, ch, (c0 * (64 - w) + c1 * w + 32) >> 6);
                }
                texels.push(rgba);
            }
        }
    }
    Some(texels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::BlockDims;

    fn bsd4x4() -> BlockSizeDescriptor {
        BlockSizeDescriptor::new(BlockDims::new(4, 4, 1).unwrap())
    }

    fn luminance_block(weight: u8) -> WeightedBlock {
        let mut color_values = [[0u8; 8]; 4];
        color_values[0][..2].copy_from_slice(&[0, 255]);
        WeightedBlock {
            partition_count:  1,
            partition_seed:   0,
            color_formats:    [0; 4],
            color_values,
            weight_grid:      Extent3::new(2, 2, 1),
            plane1:           vec![weight; 4],
            plane2:           None,
            plane2_component: None,
        }
    }

    fn decode(mode: DecodeMode, block: WeightedBlock) -> Vec<[u8; 4]> {
        decompress_symbolic(&bsd4x4(), mode, &SymbolicBlock::Weighted(block), Extent3::default()).texels
    }

    #[test]
    fn endpoints_at_weight_extremes() {
        for mode in [DecodeMode::Ldr, DecodeMode::LdrSrgb] {
            assert!(decode(mode, luminance_block(0)).iter().all(|&t| t == [0, 0, 0, 255]));
            assert!(decode(mode, luminance_block(64)).iter().all(|&t| t == [255, 255, 255, 255]));
        }
    }

    #[test]
    fn linear_midpoint() {
        let out = decode(DecodeMode::Ldr, luminance_block(32));
        assert!(out.iter().all(|&t| t == [128, 128, 128, 255]));
    }

    #[test]
    fn dual_plane_drives_one_channel() {
        let mut block = luminance_block(0);
        block.color_formats[0] = 4;
        block.color_values[0][..4].copy_from_slice(&[0, 255, 0, 255]);
        block.plane2 = Some(vec![64; 4]);
        block.plane2_component = Some(3);
        assert!(decode(DecodeMode::Ldr, block).iter().all(|&t| t == [0, 0, 0, 255]));
    }

    #[test]
    fn partitions_pick_their_own_endpoints() {
        let mut block = luminance_block(0);
        block.partition_count = 2;
        block.partition_seed = 7;
        block.color_values[1][..2].copy_from_slice(&[255, 255]);
        let out = decode(DecodeMode::Ldr, block);

        let bsd = bsd4x4();
        for (i, texel) in out.iter().enumerate() {
            let (x, y) = (i as u32 % 4, i as u32 / 4);
            let expected = if select_partition(7, x, y, 0, 2, bsd.small_block) == 0 { 0 } else { 255 };
            assert_eq!(texel[0], expected);
        }
    }

    #[test]
    fn hdr_content_is_error_colour() {
        let mut block = luminance_block(0);
        block.color_formats[0] = 2;
        assert!(decode(DecodeMode::LdrSrgb, block).iter().all(|&t| t == ERROR_COLOR));

        let out = decompress_symbolic(&bsd4x4(), DecodeMode::Ldr, &SymbolicBlock::ConstantHdr([0; 4]), Extent3::default());
        assert!(out.texels.iter().all(|&t| t == ERROR_COLOR));
    }

    #[test]
    fn constant_colour() {
        let symbolic = SymbolicBlock::ConstantLdr([0xFFFF, 0x8000, 0x0000, 0x8080]);
        let out = decompress_symbolic(&bsd4x4(), DecodeMode::LdrSrgb, &symbolic, Extent3::default());
        assert_eq!(out.texels.len(), 16);
        assert!(out.texels.iter().all(|&t| t == [0xFF, 0x80, 0x00, 0x80]));
    }
}
