// Flacon -- a bit-exact FLAC encoder and decoder
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The `subframe` module deals with subframes that make up a frame of the
//! FLAC stream: one channel's encoded block.
//!
//! Grounded on claxon's `subframe` module: the `SubframeType`/`decode`
//! dispatch shape and the fixed-predictor/Rice decode path are kept, the
//! encode-side candidate builders (`encode_constant`, `encode_verbatim`,
//! `encode_fixed`) are new (claxon is decode-only), and LPC decoding is
//! carried for decoder-tolerance scenarios the encoder itself never
//! produces.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{fmt_err, Result};
use crate::predictor;
use crate::rice;
use std::io::Read;

/// The decoded payload of a subframe, before the wasted-bits left shift
/// that `SubframeData::to_samples` applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subframe {
    Constant(i32),
    Verbatim(Vec<i32>),
    Fixed { order: u8, warmup: Vec<i32>, residual: rice::Residual },
    Lpc { warmup: Vec<i32>, shift: i32, qlp_coefficients: Vec<i32>, residual: rice::Residual },
}

/// A subframe together with its wasted-bits count, the two pieces the
/// 8-bit subframe header carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubframeData {
    pub wasted_bits: u32,
    pub subframe: Subframe,
}

impl SubframeData {
    /// Reconstructs the full block of samples this subframe encodes.
    pub fn to_samples(&self, block_size: usize) -> Vec<i32> {
        let samples = match &self.subframe {
            Subframe::Constant(value) => vec![*value; block_size],
            Subframe::Verbatim(samples) => samples.clone(),
            Subframe::Fixed { order, warmup, residual } => {
                predictor::reconstruct(*order, warmup, &rice::flatten(residual))
            }
            Subframe::Lpc { warmup, shift, qlp_coefficients, residual } => {
                reconstruct_lpc(warmup, *shift, qlp_coefficients, &rice::flatten(residual))
            }
        };
        if self.wasted_bits == 0 {
            samples
        } else {
            samples.into_iter().map(|s| s << self.wasted_bits).collect()
        }
    }
}

fn reconstruct_lpc(warmup: &[i32], shift: i32, qlp_coefficients: &[i32], residual: &[i32]) -> Vec<i32> {
    let order = warmup.len();
    let mut samples = Vec::with_capacity(order + residual.len());
    samples.extend_from_slice(warmup);
    for &r in residual {
        let history = &samples[samples.len() - order..];
        let prediction: i64 = qlp_coefficients
            .iter()
            .zip(history.iter().rev())
            .map(|(&c, &s)| c as i64 * s as i64)
            .sum();
        let predicted = if shift >= 0 { prediction >> shift } else { prediction << -shift };
        samples.push((r as i64 + predicted) as i32);
    }
    samples
}

const SUBFRAME_TYPE_CONSTANT: u64 = 0b000000;
const SUBFRAME_TYPE_VERBATIM: u64 = 0b000001;

fn read_wasted_bits<R: Read>(r: &mut BitReader<R>) -> Result<u32> {
    if !r.read_bit()? {
        return Ok(0);
    }
    let mut k = 1;
    while !r.read_bit()? {
        k += 1;
    }
    Ok(k)
}

fn write_wasted_bits(w: &mut BitWriter, wasted_bits: u32) {
    if wasted_bits == 0 {
        w.write_uint(0, 1);
        return;
    }
    w.write_uint(1, 1);
    for _ in 1..wasted_bits {
        w.write_uint(0, 1);
    }
    w.write_uint(1, 1);
}

/// Reads a subframe for a channel whose samples are `bits_per_sample` bits
/// wide, out of a block of `block_size` samples.
pub fn read_subframe<R: Read>(
    r: &mut BitReader<R>,
    bits_per_sample: u32,
    block_size: usize,
) -> Result<SubframeData> {
    if r.read_bit()? {
        return fmt_err("subframe header reserved bit is set");
    }
    let type_code = r.read_uint(6)?;
    let wasted_bits = read_wasted_bits(r)?;
    let effective_bps = match bits_per_sample.checked_sub(wasted_bits) {
        Some(bps) => bps,
        None => return fmt_err("wasted bits count exceeds bits per sample"),
    };

    let subframe = match type_code {
        SUBFRAME_TYPE_CONSTANT => Subframe::Constant(r.read_signed(effective_bps)? as i32),
        SUBFRAME_TYPE_VERBATIM => {
            let mut samples = Vec::with_capacity(block_size);
            for _ in 0..block_size {
                samples.push(r.read_signed(effective_bps)? as i32);
            }
            Subframe::Verbatim(samples)
        }
        code if (0b001000..=0b001100).contains(&code) => {
            let order = (code - 0b001000) as u8;
            read_fixed_subframe(r, order, effective_bps, block_size)?
        }
        code if code & 0b100000 != 0 => {
            let order = (code & 0b011111) as u8 + 1;
            read_lpc_subframe(r, order, effective_bps, block_size)?
        }
        _ => return fmt_err("reserved subframe type code"),
    };

    Ok(SubframeData { wasted_bits, subframe })
}

fn read_fixed_subframe<R: Read>(
    r: &mut BitReader<R>,
    order: u8,
    bps: u32,
    block_size: usize,
) -> Result<Subframe> {
    if block_size <= order as usize {
        return fmt_err("fixed subframe order exceeds block size");
    }
    let mut warmup = Vec::with_capacity(order as usize);
    for _ in 0..order {
        warmup.push(r.read_signed(bps)? as i32);
    }
    let residual = rice::read_residual(r, block_size, order as usize)?;
    Ok(Subframe::Fixed { order, warmup, residual })
}

fn read_lpc_subframe<R: Read>(
    r: &mut BitReader<R>,
    order: u8,
    bps: u32,
    block_size: usize,
) -> Result<Subframe> {
    if block_size <= order as usize {
        return fmt_err("lpc subframe order exceeds block size");
    }
    let mut warmup = Vec::with_capacity(order as usize);
    for _ in 0..order {
        warmup.push(r.read_signed(bps)? as i32);
    }
    let precision = r.read_uint(4)? as u32 + 1;
    if precision == 16 {
        return fmt_err("reserved LPC precision");
    }
    let shift = r.read_signed(5)? as i32;
    let mut qlp_coefficients = Vec::with_capacity(order as usize);
    for _ in 0..order {
        qlp_coefficients.push(r.read_signed(precision)? as i32);
    }
    let residual = rice::read_residual(r, block_size, order as usize)?;
    Ok(Subframe::Lpc { warmup, shift, qlp_coefficients, residual })
}

/// Writes a subframe's 8-bit header and payload to a bit-level sink.
///
/// The encoder never emits wasted bits or LPC subframes (both are
/// decoder-tolerance-only per the format's non-goals for encoding).
pub fn write_subframe(w: &mut BitWriter, data: &SubframeData, bits_per_sample: u32) {
    w.write_uint(0, 1);
    match &data.subframe {
        Subframe::Constant(value) => {
            w.write_uint(SUBFRAME_TYPE_CONSTANT, 6);
            write_wasted_bits(w, data.wasted_bits);
            w.write_signed(*value as i64, bits_per_sample - data.wasted_bits);
        }
        Subframe::Verbatim(samples) => {
            w.write_uint(SUBFRAME_TYPE_VERBATIM, 6);
            write_wasted_bits(w, data.wasted_bits);
            for &s in samples {
                w.write_signed(s as i64, bits_per_sample - data.wasted_bits);
            }
        }
        Subframe::Fixed { order, warmup, residual } => {
            w.write_uint(0b001000 | *order as u64, 6);
            write_wasted_bits(w, data.wasted_bits);
            let bps = bits_per_sample - data.wasted_bits;
            for &s in warmup {
                w.write_signed(s as i64, bps);
            }
            rice::write_residual(w, residual);
        }
        Subframe::Lpc { .. } => unreachable!("the encoder never emits LPC subframes"),
    }
}

/// Bits a subframe would occupy on the wire, including its 8-bit header.
/// Used by the encoder to compare candidates without serializing them.
pub fn bit_len(data: &SubframeData, bits_per_sample: u32, block_size: usize) -> u64 {
    let header = 8 + if data.wasted_bits == 0 { 0 } else { data.wasted_bits as u64 };
    let bps = (bits_per_sample - data.wasted_bits) as u64;
    header
        + match &data.subframe {
            Subframe::Constant(_) => bps,
            Subframe::Verbatim(_) => bps * block_size as u64,
            Subframe::Fixed { order, residual, .. } => *order as u64 * bps + rice::bit_len(residual),
            Subframe::Lpc { .. } => unreachable!("the encoder never emits LPC subframes"),
        }
}

/// Builds the Constant candidate, if every sample in `samples` is equal.
pub fn encode_constant(samples: &[i32]) -> Option<SubframeData> {
    let first = *samples.first()?;
    if samples.iter().all(|&s| s == first) {
        Some(SubframeData { wasted_bits: 0, subframe: Subframe::Constant(first) })
    } else {
        None
    }
}

/// Builds the Verbatim candidate: always feasible.
pub fn encode_verbatim(samples: &[i32]) -> SubframeData {
    SubframeData { wasted_bits: 0, subframe: Subframe::Verbatim(samples.to_vec()) }
}

/// Builds the Fixed candidate of the given `order`, if the block is long
/// enough for it.
pub fn encode_fixed(order: u8, samples: &[i32]) -> Result<Option<SubframeData>> {
    if samples.len() <= order as usize {
        return Ok(None);
    }
    let warmup = samples[..order as usize].to_vec();
    let residual_values = predictor::residual(order, samples);
    let residual = rice::encode(&residual_values)?;
    Ok(Some(SubframeData { wasted_bits: 0, subframe: Subframe::Fixed { order, warmup, residual } }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn round_trip(data: &SubframeData, bits_per_sample: u32, block_size: usize) -> Vec<i32> {
        let mut w = BitWriter::new();
        write_subframe(&mut w, data, bits_per_sample);
        let bytes = w.into_bytes();
        let mut r = BitReader::new(Cursor::new(bytes));
        let decoded = read_subframe(&mut r, bits_per_sample, block_size).unwrap();
        assert_eq!(&decoded, data);
        decoded.to_samples(block_size)
    }

    #[test]
    fn constant_round_trips() {
        let data = encode_constant(&[7; 10]).unwrap();
        assert_eq!(round_trip(&data, 16, 10), vec![7; 10]);
    }

    #[test]
    fn verbatim_round_trips() {
        let samples = vec![1, -2, 3, -4, 5];
        let data = encode_verbatim(&samples);
        assert_eq!(round_trip(&data, 16, 5), samples);
    }

    #[test]
    fn fixed_round_trips_for_every_order() {
        let samples: Vec<i32> = (0..20).map(|i| (i * i) % 37 - 18).collect();
        for order in 0..=4u8 {
            let data = encode_fixed(order, &samples).unwrap().unwrap();
            assert_eq!(round_trip(&data, 16, samples.len()), samples);
        }
    }

    #[test]
    fn encode_constant_rejects_non_constant_blocks() {
        assert!(encode_constant(&[1, 2]).is_none());
    }

    #[test]
    fn encode_fixed_rejects_order_at_or_above_block_size() {
        assert!(encode_fixed(4, &[1, 2, 3]).unwrap().is_none());
    }

    #[test]
    fn wasted_bits_round_trip() {
        let data = SubframeData { wasted_bits: 3, subframe: Subframe::Constant(5) };
        let samples = round_trip(&data, 16, 8);
        assert_eq!(samples, vec![5 << 3; 8]);
    }

    #[test]
    fn rejects_wasted_bits_exceeding_bits_per_sample() {
        let mut w = BitWriter::new();
        w.write_uint(0, 1);
        w.write_uint(SUBFRAME_TYPE_CONSTANT, 6);
        write_wasted_bits(&mut w, 20);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(Cursor::new(bytes));
        assert!(read_subframe(&mut r, 16, 8).is_err());
    }

    #[test]
    fn rejects_reserved_lpc_precision() {
        let order = 1u64;
        let mut w = BitWriter::new();
        w.write_uint(0, 1);
        w.write_uint(0b100000 | (order - 1), 6);
        w.write_uint(0, 1); // no wasted bits.
        w.write_signed(0, 16); // warmup sample.
        w.write_uint(0b1111, 4); // reserved precision code.
        let bytes = w.into_bytes();

        let mut r = BitReader::new(Cursor::new(bytes));
        assert!(read_subframe(&mut r, 16, 4).is_err());
    }
}
