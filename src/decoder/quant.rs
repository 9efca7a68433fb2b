//! Integer sequence encoding and unquantization tables.
//!
//! Quantization levels are addressed by index into [`QUANT_LEVELS`].  Each
//! level is stored as plain bits, as bits plus one trit per five values, or
//! as bits plus one quint per three values.

use std::sync::OnceLock;

/// Number of representable values for each quantization index.
pub const QUANT_LEVELS: [u16; 21] = [
    2, 3, 4, 5, 6, 8, 10, 12, 16, 20, 24, 32, 40, 48, 64, 80, 96, 128, 160, 192, 256,
];

/// Index of the 6-level quantization, the coarsest legal for colour values.
pub const QUANT_6: u8 = 4;
/// Index of the 32-level quantization, the finest legal for weights.
pub const QUANT_32: u8 = 11;

/// Largest number of colour integers a block can carry (four RGBA partitions
/// would need 32, but the format caps the total at 18).
pub const MAX_COLOR_INTEGERS: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Bits,
    Trits,
    Quints,
}

/// Storage shape of a quantization level: packing plus low-order bit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IseShape {
    pub encoding: Encoding,
    pub bits:     u32,
}

const fn shape(encoding: Encoding, bits: u32) -> IseShape {
    IseShape { encoding, bits }
}

const ISE_SHAPES: [IseShape; 21] = [
    shape(Encoding::Bits, 1),
    shape(Encoding::Trits, 0),
    shape(Encoding::Bits, 2),
    shape(Encoding::Quints, 0),
    shape(Encoding::Trits, 1),
    shape(Encoding::Bits, 3),
    shape(Encoding::Quints, 1),
    shape(Encoding::Trits, 2),
    shape(Encoding::Bits, 4),
    shape(Encoding::Quints, 2),
    shape(Encoding::Trits, 3),
    shape(Encoding::Bits, 5),
    shape(Encoding::Quints, 3),
    shape(Encoding::Trits, 4),
    shape(Encoding::Bits, 6),
    shape(Encoding::Quints, 4),
    shape(Encoding::Trits, 5),
    shape(Encoding::Bits, 7),
    shape(Encoding::Quints, 5),
    shape(Encoding::Trits, 6),
    shape(Encoding::Bits, 8),
];

#[inline]
pub fn ise_shape(quant: u8) -> IseShape {
    ISE_SHAPES[usize::from(quant)]
}

/// Bits needed to store `count` values at quantization `quant`.
pub fn ise_bit_count(count: usize, quant: u8) -> usize {
    let IseShape { encoding, bits } = ise_shape(quant);
    let base = count * bits as usize;
    match encoding {
        Encoding::Bits => base,
        Encoding::Trits => base + (8 * count + 4) / 5,
        Encoding::Quints => base + (7 * count + 2) / 3,
    }
}

/// Read `count` bits starting at `offset`; bits past the end read as zero.
#[inline]
pub fn read_bits(block: u128, offset: usize, count: usize) -> u32 {
    if count == 0 || offset >= 128 {
        return 0;
    }
    let mask = (1u128 << count) - 1;
    ((block >> offset) & mask) as u32
}

fn decode_trits(t: u32) -> [u8; 5] {
    let bit = |v: u32, n: u32| (v >> n) & 1;
    let (c, t3, t4);
    if (t >> 2) & 7 == 7 {
        c = (((t >> 5) & 7) << 2) | (t & 3);
        t4 = 2;
        t3 = 2;
    } else {
        c = t & 0x1F;
        if (t >> 5) & 3 == 3 {
            t4 = 2;
            t3 = bit(t, 7);
        } else {
            t4 = bit(t, 7);
            t3 = (t >> 5) & 3;
        }
    }
    let (t0, t1, t2);
    if c & 3 == 3 {
        t2 = 2;
        t1 = bit(c, 4);
        t0 = (bit(c, 3) << 1) | (bit(c, 2) & !bit(c, 3) & 1);
    } else if (c >> 2) & 3 == 3 {
        t2 = 2;
        t1 = 2;
        t0 = c & 3;
    } else {
        t2 = bit(c, 4);
        t1 = (c >> 2) & 3;
        t0 = (bit(c, 1) << 1) | (bit(c, 0) & !bit(c, 1) & 1);
    }
    [t0 as u8, t1 as u8, t2 as u8, t3 as u8, t4 as u8]
}

fn decode_quints(q: u32) -> [u8; 3] {
    let bit = |v: u32, n: u32| (v >> n) & 1;
    let (q0, q1, q2);
    if (q >> 1) & 3 == 3 && (q >> 5) & 3 == 0 {
        q2 = (bit(q, 0) << 2) | ((bit(q, 4) & !bit(q, 0) & 1) << 1) | (bit(q, 3) & !bit(q, 0) & 1);
        q1 = 4;
        q0 = 4;
    } else {
        let c;
        if (q >> 1) & 3 == 3 {
            q2 = 4;
            c = (((q >> 3) & 3) << 3) | ((!(q >> 5) & 3) << 1) | bit(q, 0);
        } else {
            q2 = (q >> 5) & 3;
            c = q & 0x1F;
        }
        if c & 7 == 5 {
            q1 = 4;
            q0 = (c >> 3) & 3;
        } else {
            q1 = (c >> 3) & 3;
            q0 = c & 7;
        }
    }
    [q0 as u8, q1 as u8, q2 as u8]
}

/// Trit bits following each of the five values of a trit block.
const TRIT_BITS: [(usize, u32); 5] = [(2, 0), (2, 2), (1, 4), (2, 5), (1, 7)];
/// Quint bits following each of the three values of a quint block.
const QUINT_BITS: [(usize, u32); 3] = [(3, 0), (2, 3), (2, 5)];

/// Decode `count` raw (still quantized) values from `block` at `offset`.
///
/// Trailing trit/quint bits belonging to values past `count` are not read
/// and count as zero.
pub fn decode_ise(quant: u8, count: usize, block: u128, offset: usize) -> Vec<u8> {
    let IseShape { encoding, bits } = ise_shape(quant);
    let bits = bits as usize;
    let mut low = Vec::with_capacity(count);
    let mut packed = Vec::with_capacity(count.div_ceil(3));
    let mut pos = offset;

    for i in 0..count {
        low.push(read_bits(block, pos, bits));
        pos += bits;
        let extra = match encoding {
            Encoding::Bits => None,
            Encoding::Trits => Some((i / 5, TRIT_BITS[i % 5])),
            Encoding::Quints => Some((i / 3, QUINT_BITS[i % 3])),
        };
        if let Some((group, (width, shift))) = extra {
            if packed.len() <= group {
                packed.push(0u32);
            }
            packed[group] |= read_bits(block, pos, width) << shift;
            pos += width;
        }
    }

    low.iter()
        .enumerate()
        .map(|(i, &m)| {
            let high = match encoding {
                Encoding::Bits => 0,
                Encoding::Trits => u32::from(decode_trits(packed[i / 5])[i % 5]),
                Encoding::Quints => u32::from(decode_quints(packed[i / 3])[i % 3]),
            };
            ((high << bits) | m) as u8
        })
        .collect()
}

/// Repeat the `from`-bit pattern of `value` until it is `to` bits wide.
fn replicate(value: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return 0;
    }
    let mut result = 0;
    let mut filled = 0;
    while filled < to {
        let take = from.min(to - filled);
        result = (result << take) | (value >> (from - take));
        filled += take;
    }
    result
}

/// Expand a bit pattern such as `"b000b0bb0"` where `b`..`f` name bits 1..5
/// of the low-order value `m`.
fn pattern(layout: &str, m: u32) -> u32 {
    layout.bytes().fold(0, |acc, c| {
        let bit = match c {
            b'b'..=b'f' => (m >> (c - b'a')) & 1,
            _ => 0,
        };
        (acc << 1) | bit
    })
}

/// Multiplier and bit pattern used to unquantize trit/quint colour values.
fn color_scramble(encoding: Encoding, bits: u32) -> (u32, &'static str) {
    match (encoding, bits) {
        (Encoding::Trits, 1) => (204, "000000000"),
        (Encoding::Trits, 2) => (93, "b000b0bb0"),
        (Encoding::Trits, 3) => (44, "cb000cbcb"),
        (Encoding::Trits, 4) => (22, "dcb000dcb"),
        (Encoding::Trits, 5) => (11, "edcb000ed"),
        (Encoding::Trits, _) => (5, "fedcb000f"),
        (Encoding::Quints, 1) => (113, "000000000"),
        (Encoding::Quints, 2) => (54, "b0000bb00"),
        (Encoding::Quints, 3) => (26, "cb0000cbc"),
        (Encoding::Quints, 4) => (13, "dcb0000dc"),
        (_, _) => (6, "edcb0000e"),
    }
}

fn unquantize_color(quant: u8, value: u32) -> u8 {
    let IseShape { encoding, bits } = ise_shape(quant);
    let levels = u32::from(QUANT_LEVELS[usize::from(quant)]);
    if encoding == Encoding::Bits {
        return replicate(value, bits, 8) as u8;
    }
    if bits == 0 {
        return ((value * 255 + (levels - 1) / 2) / (levels - 1)) as u8;
    }
    let digit = value >> bits;
    let m = value & ((1 << bits) - 1);
    let a = if m & 1 != 0 { 0x1FF } else { 0 };
    let (c, layout) = color_scramble(encoding, bits);
    let t = (digit * c + pattern(layout, m)) ^ a;
    ((a & 0x80) | (t >> 2)) as u8
}

fn unquantize_weight(quant: u8, value: u32) -> u8 {
    let IseShape { encoding, bits } = ise_shape(quant);
    let t = match (encoding, bits) {
        (Encoding::Bits, _) => replicate(value, bits, 6),
        (Encoding::Trits, 0) => [0, 32, 63][value as usize],
        (Encoding::Quints, 0) => [0, 16, 32, 47, 63][value as usize],
        _ => {
            let (c, layout) = match (encoding, bits) {
                (Encoding::Trits, 1) => (50, "0000000"),
                (Encoding::Quints, 1) => (28, "0000000"),
                (Encoding::Trits, 2) => (23, "b000b0b"),
                (Encoding::Quints, 2) => (13, "b0000b0"),
                _ => (11, "cb000cb"),
            };
            let digit = value >> bits;
            let m = value & ((1 << bits) - 1);
            let a = if m & 1 != 0 { 0x7F } else { 0 };
            let t = (digit * c + pattern(layout, m)) ^ a;
            (a & 0x20) | (t >> 2)
        }
    };
    (if t > 32 { t + 1 } else { t }) as u8
}

/// Lookup tables shared by every decode; built once by [`tables`].
pub struct QuantTables {
    /// `color[quant][value]` → 0..=255
    pub color:  Vec<Vec<u8>>,
    /// `weight[quant][value]` → 0..=64, for quant up to [`QUANT_32`]
    pub weight: Vec<Vec<u8>>,
    /// `color_quant[integer_count / 2][available_bits]` → finest quant that fits
    color_quant: Vec<[Option<u8>; 128]>,
}

impl QuantTables {
    fn build() -> Self {
        let levels = |q: u8| 0..u32::from(QUANT_LEVELS[usize::from(q)]);
        let color: Vec<Vec<u8>> = (0..QUANT_LEVELS.len() as u8)
            .map(|q| levels(q).map(|v| unquantize_color(q, v)).collect::<Vec<u8>>())
            .collect();
        let weight: Vec<Vec<u8>> = (0..=QUANT_32)
            .map(|q| levels(q).map(|v| unquantize_weight(q, v)).collect::<Vec<u8>>())
            .collect();

        let mut color_quant = vec![[None; 128]; MAX_COLOR_INTEGERS / 2 + 1];
        for (pairs, row) in color_quant.iter_mut().enumerate().skip(1) {
            for quant in 0..QUANT_LEVELS.len() as u8 {
                let needed = ise_bit_count(pairs * 2, quant);
                for slot in row.iter_mut().skip(needed) {
                    *slot = Some(quant);
                }
            }
        }
        log::debug!("quantization tables built");
        Self { color, weight, color_quant }
    }

    /// Finest colour quantization storing `integer_count` values in `bits`.
    pub fn color_quant_for(&self, integer_count: usize, bits: usize) -> Option<u8> {
        self.color_quant.get(integer_count / 2)?[bits.min(127)]
    }
}

static TABLES: OnceLock<QuantTables> = OnceLock::new();

/// The shared tables, building them on first use.  Safe to call from any
/// number of threads; construction happens exactly once.
pub fn tables() -> &'static QuantTables {
    TABLES.get_or_init(QuantTables::build)
}
