// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Owned square grid of 16-bit elevation samples.

use crate::error::TerrainError;
use relief_core::HeightSource;
use serde::{Deserialize, Serialize};

/// A `size` x `size` grid of raw height samples, stored row-major (`x + z * size`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightField {
    size: usize,
    samples: Vec<u16>,
}

impl HeightField {
    /// Number of samples in a `size` x `size` field.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::HeightFieldSize`] with `expected: usize::MAX` if the
    /// count does not fit in `usize`.
    pub(crate) fn sample_count(size: usize, supplied: usize) -> Result<usize, TerrainError> {
        size.checked_mul(size).ok_or(TerrainError::HeightFieldSize {
            expected: usize::MAX,
            actual: supplied,
        })
    }

    /// Creates a field where every sample equals `height`.
    pub fn flat(size: usize, height: u16) -> Self {
        Self {
            size,
            samples: vec![height; size * size],
        }
    }

    /// Creates a field by evaluating `f(x, z)` at every sample.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> u16) -> Self {
        let mut samples = Vec::with_capacity(size * size);
        for z in 0..size {
            for x in 0..size {
                samples.push(f(x, z));
            }
        }
        Self { size, samples }
    }

    /// Wraps existing row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::HeightFieldSize`] unless `samples.len() == size * size`.
    pub fn from_samples(size: usize, samples: Vec<u16>) -> Result<Self, TerrainError> {
        let expected = Self::sample_count(size, samples.len())?;
        if samples.len() != expected {
            return Err(TerrainError::HeightFieldSize {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self { size, samples })
    }

    /// Reads an 8-bit greyscale raw image. Each byte is taken as its own height value.
    pub fn from_raw_l8(size: usize, bytes: &[u8]) -> Result<Self, TerrainError> {
        let samples = bytes.iter().map(|&b| u16::from(b)).collect();
        Self::from_samples(size, samples)
    }

    /// Reads a 16-bit little-endian greyscale raw image.
    pub fn from_raw_l16(size: usize, bytes: &[u8]) -> Result<Self, TerrainError> {
        if bytes.len() % 2 != 0 {
            let expected = Self::sample_count(size, bytes.len() / 2)?;
            return Err(TerrainError::HeightFieldSize {
                expected,
                actual: bytes.len() / 2,
            });
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::from_samples(size, samples)
    }

    /// Edge length in samples.
    pub fn size(&self) -> usize {
        self.size
    }

    /// All samples, row-major.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Sample at `(x, z)`, or `None` outside the field.
    pub fn get(&self, x: usize, z: usize) -> Option<u16> {
        if x < self.size && z < self.size {
            self.samples.get(x + z * self.size).copied()
        } else {
            None
        }
    }

    /// Smallest and largest sample.
    pub fn min_max(&self) -> Option<(u16, u16)> {
        let min = self.samples.iter().copied().min()?;
        let max = self.samples.iter().copied().max()?;
        Some((min, max))
    }
}

impl HeightSource for HeightField {
    fn world_size(&self) -> usize {
        self.size
    }

    fn world_height(&self, x: usize, z: usize) -> u16 {
        self.get(x, z).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let field = HeightField::from_fn(3, |x, z| (x + 10 * z) as u16);
        assert_eq!(field.samples()[5], 12);
        assert_eq!(field.world_height(2, 1), 12);
        assert_eq!(field.min_max(), Some((0, 22)));
    }

    #[test]
    fn test_from_samples_rejects_wrong_length() {
        let err = HeightField::from_samples(3, vec![0; 8]).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::HeightFieldSize {
                expected: 9,
                actual: 8
            }
        ));
    }

    #[test]
    fn test_raw_l8_keeps_byte_values() {
        let field = HeightField::from_raw_l8(2, &[0, 1, 200, 255]).unwrap();
        assert_eq!(field.samples(), &[0, 1, 200, 255]);
    }

    #[test]
    fn test_oversized_width_is_rejected_without_overflow() {
        let huge = usize::MAX / 2;
        assert!(matches!(
            HeightField::from_raw_l8(huge, &[1, 2, 3]),
            Err(TerrainError::HeightFieldSize {
                expected: usize::MAX,
                actual: 3
            })
        ));
        assert!(matches!(
            HeightField::from_raw_l16(huge, &[1, 2, 3]),
            Err(TerrainError::HeightFieldSize {
                expected: usize::MAX,
                actual: 1
            })
        ));
        assert!(HeightField::from_samples(huge, vec![0; 4]).is_err());
    }

    #[test]
    fn test_raw_l16_is_little_endian() {
        let field = HeightField::from_raw_l16(1, &[0x34, 0x12]).unwrap();
        assert_eq!(field.get(0, 0), Some(0x1234));
        assert!(HeightField::from_raw_l16(1, &[0x34]).is_err());
        assert!(HeightField::from_raw_l16(2, &[0; 6]).is_err());
    }

    #[test]
    fn test_out_of_range_reads() {
        let field = HeightField::flat(2, 7);
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.world_height(0, 5), 0);
        assert_eq!(field.world_size(), 2);
    }
}
