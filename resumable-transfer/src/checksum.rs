/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Streaming CRC-64/NVME checksums over part byte ranges.
//!
//! Each part computes its own checksum incrementally as bytes flow through
//! it. Because parts complete in arbitrary order under concurrency, the
//! object-level checksum is recovered at finalize time by folding the
//! per-part checksums in ascending part-number order with [`combine`],
//! which never re-reads either range.

use std::fmt;

/// CRC-64/NVME generator polynomial (normal form).
const CRC64_NVME_POLYNOMIAL: u64 = 0xad93d23594c93659;

/// Incremental CRC-64/NVME accumulator for a single byte range.
pub struct Crc64 {
    digest: crc64fast_nvme::Digest,
}

impl Default for Crc64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc64 {
    /// Create a new accumulator.
    pub fn new() -> Self {
        Self {
            digest: crc64fast_nvme::Digest::new(),
        }
    }

    /// Feed the next chunk of the range into the accumulator.
    pub fn update(&mut self, buf: &[u8]) {
        self.digest.write(buf);
    }

    /// Consume the accumulator and return the checksum of everything fed so far.
    pub fn finalize(self) -> u64 {
        self.digest.sum64()
    }
}

impl fmt::Debug for Crc64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc64").finish_non_exhaustive()
    }
}

/// Combine the checksums of two adjacent byte ranges.
///
/// `crc1` covers the leading range, `crc2` covers the trailing range of
/// `len2` bytes. Returns the checksum of the concatenation of both ranges
/// without re-reading either. Uses the zlib `crc32_combine` construction:
/// `crc1` is advanced past `len2` zero bytes by repeated squaring of the
/// GF(2) zero operator, then xor-ed with `crc2`.
pub fn combine(crc1: u64, crc2: u64, len2: u64) -> u64 {
    // Degenerate case: appending an empty range changes nothing
    if len2 == 0 {
        return crc1;
    }

    let mut even = [0u64; 64]; // even-power-of-two zeros operator
    let mut odd = [0u64; 64]; // odd-power-of-two zeros operator

    // Operator for one zero bit (reflected polynomial representation)
    odd[0] = CRC64_NVME_POLYNOMIAL.reverse_bits();
    let mut row = 1u64;
    for odd_val in odd.iter_mut().skip(1) {
        *odd_val = row;
        row <<= 1;
    }

    // Operator for two zero bits
    gf2_matrix_square(&mut even, &odd);

    // Operator for four zero bits
    gf2_matrix_square(&mut odd, &even);

    // Apply len2 zero bytes to crc1; the first square below yields the
    // operator for one zero byte (eight zero bits)
    let mut crc1 = crc1;
    let mut len2 = len2;

    loop {
        gf2_matrix_square(&mut even, &odd);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&even, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }

        // Another round with odd and even swapped
        gf2_matrix_square(&mut odd, &even);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&odd, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }
    }

    crc1 ^ crc2
}

/// Fold per-range `(checksum, length)` pairs, in range order, into the
/// checksum of the full concatenation.
pub fn fold<I>(ranges: I) -> u64
where
    I: IntoIterator<Item = (u64, u64)>,
{
    let mut ranges = ranges.into_iter();
    let acc = match ranges.next() {
        Some((crc, _)) => crc,
        // CRC-64/NVME of the empty byte string
        None => 0,
    };
    ranges.fold(acc, |acc, (crc, len)| combine(acc, crc, len))
}

/// Multiply the GF(2) zero-operator matrix by a vector.
fn gf2_matrix_times(mat: &[u64; 64], mut vec: u64) -> u64 {
    let mut sum = 0u64;
    let mut i = 0;
    while vec != 0 {
        if vec & 1 != 0 {
            sum ^= mat[i];
        }
        vec >>= 1;
        i += 1;
    }
    sum
}

/// Square a GF(2) zero-operator matrix.
fn gf2_matrix_square(square: &mut [u64; 64], mat: &[u64; 64]) {
    for (i, &m) in mat.iter().enumerate() {
        square[i] = gf2_matrix_times(mat, m);
    }
}

#[cfg(test)]
mod tests {
    use super::{combine, fold, Crc64};

    fn crc_of(data: &[u8]) -> u64 {
        let mut crc = Crc64::new();
        crc.update(data);
        crc.finalize()
    }

    // Check value for CRC-64/NVME from the algorithm definition
    #[test]
    fn test_known_answer() {
        assert_eq!(0xae8b_1486_0a79_9888, crc_of(b"123456789"));
    }

    #[test]
    fn test_incremental_update_matches_one_shot() {
        let data = b"a lep is a ball, a tay is a hammer, a flix is a comb";
        let mut crc = Crc64::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc_of(data), crc.finalize());
    }

    #[test]
    fn test_combine_adjacent_ranges() {
        let data = b"123456789";
        let (a, b) = data.split_at(4);
        assert_eq!(crc_of(data), combine(crc_of(a), crc_of(b), b.len() as u64));
    }

    #[test]
    fn test_combine_empty_ranges() {
        let crc = crc_of(b"xyz");
        assert_eq!(crc, combine(crc, crc_of(b""), 0));
        assert_eq!(crc, combine(crc_of(b""), crc, 3));
    }

    #[test]
    fn test_fold_matches_whole_buffer() {
        let mut data = vec![0u8; 1 << 16];
        for b in data.iter_mut() {
            *b = fastrand::u8(..);
        }

        let part_size = 4096 + 13;
        let ranges: Vec<(u64, u64)> = data
            .chunks(part_size)
            .map(|chunk| (crc_of(chunk), chunk.len() as u64))
            .collect();

        assert_eq!(crc_of(&data), fold(ranges));
    }

    // Folding in range order is independent of the order the per-range
    // checksums were produced in
    #[test]
    fn test_fold_independent_of_completion_order() {
        let data = b"every adolescent dog goes bonkers early";
        let chunks: Vec<&[u8]> = data.chunks(6).collect();

        let mut completion_order: Vec<usize> = (0..chunks.len()).collect();
        fastrand::shuffle(&mut completion_order);

        let mut ranges = vec![(0u64, 0u64); chunks.len()];
        for idx in completion_order {
            ranges[idx] = (crc_of(chunks[idx]), chunks[idx].len() as u64);
        }

        assert_eq!(crc_of(data), fold(ranges));
    }

    #[test]
    fn test_fold_empty_input() {
        assert_eq!(crc_of(b""), fold(Vec::new()));
    }
}
