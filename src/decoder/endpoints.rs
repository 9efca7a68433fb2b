//! Colour endpoint modes.
//!
//! Only the LDR modes are decoded.  HDR modes return `None`, which the texel
//! stage turns into the error colour as the LDR profile requires.

pub type Rgba = [i32; 4];

/// Number of unquantized integers consumed by endpoint mode `format`.
#[inline]
pub fn value_count(format: u8) -> usize {
    (usize::from(format >> 2) + 1) * 2
}

pub fn is_hdr(format: u8) -> bool {
    matches!(format, 2 | 3 | 7 | 11 | 14 | 15)
}

/// Moves the top bit of `a` into `b` and returns `a` as a 6-bit signed offset.
fn bit_transfer_signed(a: i32, b: i32) -> (i32, i32) {
    let b = (b >> 1) | (a & 0x80);
    let mut a = (a >> 1) & 0x3F;
    if a & 0x20 != 0 {
        a -= 0x40;
    }
    (a, b)
}

fn blue_contract([r, g, b, a]: Rgba) -> Rgba {
    [(r + b) >> 1, (g + b) >> 1, b, a]
}

fn clamp(c: Rgba) -> Rgba {
    c.map(|v| v.clamp(0, 255))
}

/// Decode one partition's endpoint pair from its unquantized `v` values.
pub fn decode_ldr(format: u8, v: &[u8]) -> Option<(Rgba, Rgba)> {
    if is_hdr(format) || v.len() < value_count(format) {
        return None;
    }
    let v: Vec<i32> = v.iter().map(|&x| i32::from(x)).collect();
    let pair = match format {
        0 => ([v[0], v[0], v[0], 255], [v[1], v[1], v[1], 255]),
        1 => {
            let l0 = (v[0] >> 2) | (v[1] & 0xC0);
            let l1 = (l0 + (v[1] & 0x3F)).min(255);
            ([l0, l0, l0, 255], [l1, l1, l1, 255])
        }
        4 => ([v[0], v[0], v[0], v[2]], [v[1], v[1], v[1], v[3]]),
        5 => {
            let (dl, l0) = bit_transfer_signed(v[1], v[0]);
            let (da, a0) = bit_transfer_signed(v[3], v[2]);
            let e1 = clamp([l0 + dl, l0 + dl, l0 + dl, a0 + da]);
            ([l0, l0, l0, a0], e1)
        }
        6 => {
            let scale = |c: i32| (c * v[3]) >> 8;
            ([scale(v[0]), scale(v[1]), scale(v[2]), 255], [v[0], v[1], v[2], 255])
        }
        8 | 12 => {
            let (a0, a1) = if format == 12 { (v[6], v[7]) } else { (255, 255) };
            let e0 = [v[0], v[2], v[4], a0];
            let e1 = [v[1], v[3], v[5], a1];
            if v[1] + v[3] + v[5] >= v[0] + v[2] + v[4] {
                (e0, e1)
            } else {
                (blue_contract(e1), blue_contract(e0))
            }
        }
        9 | 13 => {
            let (d0, b0) = bit_transfer_signed(v[1], v[0]);
            let (d1, b1) = bit_transfer_signed(v[3], v[2]);
            let (d2, b2) = bit_transfer_signed(v[5], v[4]);
            let (d3, b3) = if format == 13 { bit_transfer_signed(v[7], v[6]) } else { (0, 255) };
            let base = [b0, b1, b2, b3];
            let offset = [b0 + d0, b1 + d1, b2 + d2, b3 + d3];
            if d0 + d1 + d2 >= 0 {
                (clamp(base), clamp(offset))
            } else {
                (clamp(blue_contract(offset)), clamp(blue_contract(base)))
            }
        }
        10 => {
            let scale = |c: i32| (c * v[3]) >> 8;
            ([scale(v[0]), scale(v[1]), scale(v[2]), v[4]], [v[0], v[1], v[2], v[5]])
        }
        _ => return None,
    };
    Some(pair)
}
