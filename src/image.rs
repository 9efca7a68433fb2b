//! Decoded image storage and channel swizzling.
//!
//! Samples are RGBA8, stored z-major, then y, then x.  Blocks on the right,
//! bottom and back edges may extend past the image; the excess texels are
//! dropped on write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::decoder::{DecodeError, DecodedBlock};
use crate::grid::Extent3;

pub const CHANNELS: usize = 4;

// ── Swizzle ──────────────────────────────────────────────────────────────────

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid swizzle {0:?}: expected four of r, g, b, a, 0, 1")]
pub struct SwizzleError(pub String);

/// Source of one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    R,
    G,
    B,
    A,
    Zero,
    One,
}

impl Selector {
    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'r' => Some(Selector::R),
            'g' => Some(Selector::G),
            'b' => Some(Selector::B),
            'a' => Some(Selector::A),
            '0' => Some(Selector::Zero),
            '1' => Some(Selector::One),
            _   => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Selector::R    => 'r',
            Selector::G    => 'g',
            Selector::B    => 'b',
            Selector::A    => 'a',
            Selector::Zero => '0',
            Selector::One  => '1',
        }
    }

    #[inline]
    fn pick(self, texel: [u8; 4]) -> u8 {
        match self {
            Selector::R    => texel[0],
            Selector::G    => texel[1],
            Selector::B    => texel[2],
            Selector::A    => texel[3],
            Selector::Zero => 0,
            Selector::One  => 0xFF,
        }
    }
}

/// Channel selection applied as decoded texels are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Swizzle(pub [Selector; 4]);

impl Swizzle {
    pub const RGBA: Swizzle = Swizzle([Selector::R, Selector::G, Selector::B, Selector::A]);

    #[inline]
    pub fn apply(&self, texel: [u8; 4]) -> [u8; 4] {
        self.0.map(|s| s.pick(texel))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::RGBA
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::RGBA
    }
}

impl FromStr for Swizzle {
    type Err = SwizzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selectors = s.chars().map(Selector::from_char).collect::<Option<Vec<Selector>>>()
            .ok_or_else(|| SwizzleError(s.to_string()))?;
        let selectors: [Selector; 4] = selectors.try_into().map_err(|_| SwizzleError(s.to_string()))?;
        Ok(Swizzle(selectors))
    }
}

impl TryFrom<String> for Swizzle {
    type Error = SwizzleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Swizzle> for String {
    fn from(s: Swizzle) -> Self {
        s.to_string()
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|s| write!(f, "{}", s.as_char()))
    }
}

// ── Image buffer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub size: Extent3,
    data:     Vec<u8>,
}

impl ImageBuffer {
    /// Zero-filled buffer for `size` texels.  Fails if the sample count
    /// does not fit in the address space.
    pub fn new(size: Extent3) -> Result<Self, DecodeError> {
        let len = size
            .checked_volume()
            .and_then(|v| usize::try_from(v).ok())
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or(DecodeError::ImageTooLarge { x: size.x, y: size.y, z: size.z })?;
        Ok(Self { size, data: vec![0; len] })
    }

    pub fn width(&self) -> u32 {
        self.size.x
    }

    pub fn height(&self) -> u32 {
        self.size.y
    }

    pub fn depth(&self) -> u32 {
        self.size.z
    }

    /// All samples, z-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        let (w, h) = (self.size.x as usize, self.size.y as usize);
        ((z as usize * h + y as usize) * w + x as usize) * CHANNELS
    }

    pub fn texel(&self, x: u32, y: u32, z: u32) -> Option<[u8; 4]> {
        if x >= self.size.x || y >= self.size.y || z >= self.size.z {
            return None;
        }
        let i = self.index(x, y, z);
        self.data.get(i..i + CHANNELS)?.try_into().ok()
    }

    /// Store `block` at its origin through `swizzle`, clipping at the edges.
    /// `block.texels` must hold one entry per texel of `block.dims`.
    pub fn write_block(&mut self, block: &DecodedBlock, swizzle: Swizzle) {
        let Extent3 { x: bw, y: bh, z: bd } = block.dims;
        let o = block.origin;
        let mut src = block.texels.iter();
        for dz in 0..bd {
            for dy in 0..bh {
                for dx in 0..bw {
                    let Some(&texel) = src.next() else { return };
                    let (x, y, z) = (o.x + dx, o.y + dy, o.z + dz);
                    if x >= self.size.x || y >= self.size.y || z >= self.size.z {
                        continue;
                    }
                    let i = self.index(x, y, z);
                    self.data[i..i + CHANNELS].copy_from_slice(&swizzle.apply(texel));
                }
            }
        }
    }

    /// Row-major RGBA8 copy of one z slice, optionally flipped top to bottom.
    pub fn to_rgba8(&self, slice: u32, flip_y: bool) -> Result<Vec<u8>, DecodeError> {
        if slice >= self.size.z {
            return Err(DecodeError::SliceOutOfRange { slice, depth: self.size.z });
        }
        let row = self.size.x as usize * CHANNELS;
        let start = self.index(0, 0, slice);
        let plane = &self.data[start..start + row * self.size.y as usize];
        let out = if flip_y && row > 0 {
            plane.chunks_exact(row).rev().flatten().copied().collect()
        } else {
            plane.to_vec()
        };
        Ok(out)
    }
}
