//! Partition assignment: which endpoint pair a texel uses.
//!
//! Assignment is a pure function of the 10-bit partition seed, the partition
//! count and the texel position inside the block.  Blocks with fewer than 31
//! texels sample the pattern at twice the spacing.

fn hash52(mut p: u32) -> u32 {
    p ^= p >> 15;
    p = p.wrapping_sub(p << 17);
    p = p.wrapping_add(p << 7);
    p = p.wrapping_add(p << 4);
    p ^= p >> 5;
    p = p.wrapping_add(p << 16);
    p ^= p >> 7;
    p ^= p >> 3;
    p ^= p << 6;
    p ^= p >> 17;
    p
}

/// Partition (0..count) of texel `(x, y, z)` within its block.
pub fn select_partition(seed: u16, x: u32, y: u32, z: u32, count: u8, small_block: bool) -> u8 {
    if count <= 1 {
        return 0;
    }
    let (x, y, z) = if small_block { (x << 1, y << 1, z << 1) } else { (x, y, z) };
    let seed = u32::from(seed) + (u32::from(count) - 1) * 1024;
    let rnum = hash52(seed);

    let mut seeds = [
        rnum & 0xF,
        (rnum >> 4) & 0xF,
        (rnum >> 8) & 0xF,
        (rnum >> 12) & 0xF,
        (rnum >> 16) & 0xF,
        (rnum >> 20) & 0xF,
        (rnum >> 24) & 0xF,
        (rnum >> 28) & 0xF,
        (rnum >> 18) & 0xF,
        (rnum >> 22) & 0xF,
        (rnum >> 26) & 0xF,
        ((rnum >> 30) | (rnum << 2)) & 0xF,
    ];
    for s in &mut seeds {
        *s *= *s;
    }

    let (sh1, sh2) = if seed & 1 != 0 {
        (if seed & 2 != 0 { 4 } else { 5 }, if count == 3 { 6 } else { 5 })
    } else {
        (if count == 3 { 6 } else { 5 }, if seed & 2 != 0 { 4 } else { 5 })
    };
    let sh3 = if seed & 0x10 != 0 { sh1 } else { sh2 };
    for (i, s) in seeds.iter_mut().enumerate() {
        *s >>= match i {
            0..=7 if i % 2 == 0 => sh1,
            0..=7 => sh2,
            _ => sh3,
        };
    }

    let lane = |sx: u32, sy: u32, sz: u32, shift: u32| {
        sx.wrapping_mul(x)
            .wrapping_add(sy.wrapping_mul(y))
            .wrapping_add(sz.wrapping_mul(z))
            .wrapping_add(rnum >> shift)
            & 0x3F
    };
    let a = lane(seeds[0], seeds[1], seeds[10], 14);
    let b = lane(seeds[2], seeds[3], seeds[11], 10);
    let c = if count >= 3 { lane(seeds[4], seeds[5], seeds[8], 6) } else { 0 };
    let d = if count >= 4 { lane(seeds[6], seeds[7], seeds[9], 2) } else { 0 };

    if a >= b && a >= c && a >= d {
        0
    } else if b >= c && b >= d {
        1
    } else if c >= d {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_partition_is_always_zero() {
        for seed in [0, 1, 513, 1023] {
            assert_eq!(select_partition(seed, 3, 2, 0, 1, false), 0);
        }
    }

    #[test]
    fn results_stay_in_range() {
        for count in 2..=4u8 {
            for seed in (0..1024).step_by(37) {
                for y in 0..6 {
                    for x in 0..6 {
                        assert!(select_partition(seed, x, y, 0, count, false) < count);
                    }
                }
            }
        }
    }

    #[test]
    fn two_partition_seeds_split_blocks() {
        // Most seeds must actually divide an 8x8 block between both partitions.
        let split = (0..1024u16)
            .filter(|&seed| {
                let mut seen = [false; 2];
                for y in 0..8 {
                    for x in 0..8 {
                        seen[usize::from(select_partition(seed, x, y, 0, 2, false))] = true;
                    }
                }
                seen[0] && seen[1]
            })
            .count();
        assert!(split > 800, "only {split} seeds split the block");
    }
}
