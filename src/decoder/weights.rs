//! Weight infill: stretch the stored weight grid over every texel of the
//! block.  2D footprints interpolate bilinearly, 3D footprints use the
//! four-corner simplex scheme.

use crate::grid::Extent3;

/// Fixed-point (1/16 texel) position of each block texel on one grid axis.
fn axis_positions(block_len: u32, grid_len: u32) -> Vec<(usize, u32)> {
    let scale = (1024 + block_len / 2) / (block_len - 1);
    (0..block_len)
        .map(|t| {
            let g = (scale * t * (grid_len - 1) + 32) >> 6;
            ((g >> 4) as usize, g & 0xF)
        })
        .collect()
}

#[inline]
fn at(weights: &[u8], index: usize) -> u32 {
    weights.get(index).copied().map_or(0, u32::from)
}

/// Expand one plane of `grid` weights to a weight for every texel of `block`,
/// ordered x fastest, then y, then z.
pub fn infill(block: Extent3, grid: Extent3, weights: &[u8]) -> Vec<u8> {
    if block.z <= 1 {
        infill_2d(block, grid, weights)
    } else {
        infill_3d(block, grid, weights)
    }
}

fn infill_2d(block: Extent3, grid: Extent3, weights: &[u8]) -> Vec<u8> {
    let xs = axis_positions(block.x, grid.x);
    let ys = axis_positions(block.y, grid.y);
    let n = grid.x as usize;
    let mut out = Vec::with_capacity(xs.len() * ys.len());

    for &(jt, ft) in &ys {
        for &(js, fs) in &xs {
            let v0 = js + jt * n;
            let w11 = (fs * ft + 8) >> 4;
            let w10 = ft - w11;
            let w01 = fs - w11;
            let w00 = 16 + w11 - fs - ft;
            let sum = at(weights, v0) * w00
                + at(weights, v0 + 1) * w01
                + at(weights, v0 + n) * w10
                + at(weights, v0 + n + 1) * w11;
            out.push(((sum + 8) >> 4) as u8);
        }
    }
    out
}

fn infill_3d(block: Extent3, grid: Extent3, weights: &[u8]) -> Vec<u8> {
    let xs = axis_positions(block.x, grid.x);
    let ys = axis_positions(block.y, grid.y);
    let zs = axis_positions(block.z, grid.z);
    let n = grid.x as usize;
    let nm = (grid.x * grid.y) as usize;
    let mut out = Vec::with_capacity(xs.len() * ys.len() * zs.len());

    for &(jr, fr) in &zs {
        for &(jt, ft) in &ys {
            for &(js, fs) in &xs {
                let v0 = js + jt * n + jr * nm;
                // Walk from the base corner along the axes in order of
                // decreasing fraction.
                let case = (u8::from(fs > ft) << 2) | (u8::from(ft > fr) << 1) | u8::from(fs > fr);
                let (s1, s2, w) = match case {
                    7 => (1, n, [16 - fs, fs - ft, ft - fr, fr]),
                    3 => (n, 1, [16 - ft, ft - fs, fs - fr, fr]),
                    5 => (1, nm, [16 - fs, fs - fr, fr - ft, ft]),
                    4 => (nm, 1, [16 - fr, fr - fs, fs - ft, ft]),
                    2 => (n, nm, [16 - ft, ft - fr, fr - fs, fs]),
                    _ => (nm, n, [16 - fr, fr - ft, ft - fs, fs]),
                };
                let sum = at(weights, v0) * w[0]
                    + at(weights, v0 + s1) * w[1]
                    + at(weights, v0 + s1 + s2) * w[2]
                    + at(weights, v0 + n + nm + 1) * w[3];
                out.push(((sum + 8) >> 4) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_resolution_grid_is_identity() {
        let block = Extent3::new(4, 4, 1);
        let weights: Vec<u8> = (0..16).map(|i| i * 4).collect();
        assert_eq!(infill(block, block, &weights), weights);
    }

    #[test]
    fn corners_map_to_grid_corners() {
        let block = Extent3::new(8, 8, 1);
        let grid = Extent3::new(2, 2, 1);
        let out = infill(block, grid, &[0, 64, 32, 16]);
        assert_eq!(out[0], 0);
        assert_eq!(out[7], 64);
        assert_eq!(out[56], 32);
        assert_eq!(out[63], 16);
    }

    #[test]
    fn uniform_grid_stays_uniform() {
        let block = Extent3::new(6, 5, 1);
        let grid = Extent3::new(3, 2, 1);
        assert!(infill(block, grid, &[40; 6]).iter().all(|&w| w == 40));

        let block = Extent3::new(5, 4, 3);
        let grid = Extent3::new(2, 3, 2);
        let out = infill(block, grid, &[12; 12]);
        assert_eq!(out.len(), 60);
        assert!(out.iter().all(|&w| w == 12));
    }

    #[test]
    fn simplex_corners() {
        let block = Extent3::new(3, 3, 3);
        let grid = Extent3::new(2, 2, 2);
        let weights = [0, 8, 16, 24, 32, 40, 48, 64];
        let out = infill(block, grid, &weights);
        assert_eq!(out[0], 0);
        assert_eq!(out[2], 8);
        assert_eq!(out[6], 16);
        assert_eq!(out[26], 64);
    }
}
