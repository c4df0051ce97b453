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

//! Partitioned Rice coding of a subframe's residual.
//!
//! Grounded on claxon's `subframe::decode_partitioned_rice` /
//! `decode_rice_partition` (which includes the "escaped partition", raw
//! binary samples, case) for the decode side, and the original Python
//! reference's `Rice2Partition` / `rice_parameter` for the encoder side,
//! which claxon has no counterpart for.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{fmt_err, Result};
use std::io::Read;

/// The on-wire residual coding method: selects the parameter field width
/// and the value that marks an escaped (raw binary) partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// 4-bit Rice parameter, escape code `0b1111`.
    Rice4,
    /// 5-bit Rice parameter, escape code `0b11111`.
    Rice5,
}

impl Method {
    fn param_bits(self) -> u32 {
        match self {
            Method::Rice4 => 4,
            Method::Rice5 => 5,
        }
    }

    fn escape_code(self) -> u64 {
        match self {
            Method::Rice4 => 0b1111,
            Method::Rice5 => 0b1_1111,
        }
    }

    fn max_parameter(self) -> u32 {
        match self {
            Method::Rice4 => 14,
            Method::Rice5 => 30,
        }
    }

    fn from_wire_code(code: u64) -> Result<Method> {
        match code {
            0 => Ok(Method::Rice4),
            1 => Ok(Method::Rice5),
            _ => fmt_err("invalid residual coding method"),
        }
    }

    fn wire_code(self) -> u64 {
        match self {
            Method::Rice4 => 0,
            Method::Rice5 => 1,
        }
    }
}

/// One partition of a partitioned-Rice-coded residual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partition {
    /// Samples Rice-coded with a single shared parameter.
    Coded { parameter: u32, residuals: Vec<i32> },
    /// An "escaped" partition: samples stored as fixed-width raw binary,
    /// used when no Rice parameter would compress the partition well.
    Escaped { raw_bits: u32, residuals: Vec<i32> },
}

impl Partition {
    fn residuals(&self) -> &[i32] {
        match self {
            Partition::Coded { residuals, .. } => residuals,
            Partition::Escaped { residuals, .. } => residuals,
        }
    }
}

/// A full partitioned-Rice residual, as stored after a subframe's warmup
/// samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residual {
    pub method: Method,
    pub partition_order: u32,
    pub partitions: Vec<Partition>,
}

fn partition_len(block_size: usize, predictor_order: usize, partition_order: u32, index: usize) -> usize {
    let per_partition = block_size >> partition_order;
    if index == 0 {
        per_partition - predictor_order
    } else {
        per_partition
    }
}

/// Reads a partitioned-Rice residual of `block_size - predictor_order`
/// total values.
pub fn read_residual<R: Read>(
    r: &mut BitReader<R>,
    block_size: usize,
    predictor_order: usize,
) -> Result<Residual> {
    let method = Method::from_wire_code(r.read_uint(2)?)?;
    let partition_order = r.read_uint(4)? as u32;
    let partition_count = 1usize << partition_order;

    if block_size % partition_count != 0 {
        return fmt_err("partition order does not evenly divide block size");
    }
    let per_partition = block_size / partition_count;
    if per_partition < predictor_order {
        return fmt_err("first residual partition is too small for the predictor order");
    }

    let mut partitions = Vec::with_capacity(partition_count);
    for i in 0..partition_count {
        let count = partition_len(block_size, predictor_order, partition_order, i);
        let parameter_field = r.read_uint(method.param_bits())?;
        if parameter_field == method.escape_code() {
            let raw_bits = r.read_uint(5)? as u32;
            let mut residuals = Vec::with_capacity(count);
            for _ in 0..count {
                residuals.push(r.read_signed(raw_bits)? as i32);
            }
            partitions.push(Partition::Escaped { raw_bits, residuals });
        } else {
            let parameter = parameter_field as u32;
            let mut residuals = Vec::with_capacity(count);
            for _ in 0..count {
                residuals.push(r.read_rice_signed(parameter)? as i32);
            }
            partitions.push(Partition::Coded { parameter, residuals });
        }
    }

    Ok(Residual { method, partition_order, partitions })
}

/// Writes a partitioned-Rice residual.
pub fn write_residual(w: &mut BitWriter, residual: &Residual) {
    w.write_uint(residual.method.wire_code(), 2);
    w.write_uint(residual.partition_order as u64, 4);
    for partition in &residual.partitions {
        match *partition {
            Partition::Coded { parameter, ref residuals } => {
                w.write_uint(parameter as u64, residual.method.param_bits());
                for &value in residuals {
                    w.write_rice_signed(value as i64, parameter);
                }
            }
            Partition::Escaped { raw_bits, ref residuals } => {
                w.write_uint(residual.method.escape_code(), residual.method.param_bits());
                w.write_uint(raw_bits as u64, 5);
                for &value in residuals {
                    w.write_signed(value as i64, raw_bits);
                }
            }
        }
    }
}

/// Total bits a residual occupies on the wire, including the method and
/// partition-order header fields. Lets the encoder compare candidate
/// subframes by size without re-serializing them.
pub fn bit_len(residual: &Residual) -> u64 {
    let mut bits = 2 + 4;
    for partition in &residual.partitions {
        bits += residual.method.param_bits() as u64;
        match *partition {
            Partition::Coded { parameter, ref residuals } => {
                for &value in residuals {
                    bits += rice_code_len(value as i64, parameter);
                }
            }
            Partition::Escaped { raw_bits, ref residuals } => {
                bits += 5 + residuals.len() as u64 * raw_bits as u64;
            }
        }
    }
    bits
}

fn zigzag(value: i64) -> u64 {
    if value < 0 {
        (-value as u64) * 2 - 1
    } else {
        value as u64 * 2
    }
}

fn rice_code_len(value: i64, parameter: u32) -> u64 {
    (zigzag(value) >> parameter) + 1 + parameter as u64
}

/// Picks the Rice parameter that minimizes the coded length of `residuals`,
/// using the mean-absolute-value heuristic from the original encoder
/// (`E = ceil(mean(|r|))`, `p = ceil(log2(ln(2) * E))`), then does a small
/// local search around it since the heuristic is only an approximation.
///
/// Fails with `EncodeOverflow` if even the heuristic's own guess exceeds
/// the method's maximum parameter; this should never trigger for 16-bit
/// audio, but the encoder asserts it rather than silently clamping.
fn choose_parameter(residuals: &[i32], max_parameter: u32) -> Result<u32> {
    if residuals.is_empty() {
        return Ok(0);
    }
    let sum_abs: u64 = residuals.iter().map(|&r| zigzag(r as i64) / 2 + (r < 0) as u64).sum();
    let mean = sum_abs as f64 / residuals.len() as f64;
    let guess = if mean > 0.0 {
        (mean * std::f64::consts::LN_2).log2().ceil().max(0.0) as u32
    } else {
        0
    };
    if guess > max_parameter {
        return fmt_err("rice parameter overflow");
    }

    let mut best_param = guess;
    let mut best_len = residuals.iter().map(|&r| rice_code_len(r as i64, best_param)).sum::<u64>();
    let lo = guess.saturating_sub(2);
    let hi = (guess + 2).min(max_parameter);
    for p in lo..=hi {
        let len: u64 = residuals.iter().map(|&r| rice_code_len(r as i64, p)).sum();
        if len < best_len {
            best_len = len;
            best_param = p;
        }
    }
    Ok(best_param)
}

/// Builds a single-partition (`partition_order = 0`) Rice5-coded residual
/// for `residuals`, matching the original encoder's `make_subframe_fixed`.
pub fn encode(residuals: &[i32]) -> Result<Residual> {
    let method = Method::Rice5;
    let parameter = choose_parameter(residuals, method.max_parameter())?;
    Ok(Residual {
        method,
        partition_order: 0,
        partitions: vec![Partition::Coded { parameter, residuals: residuals.to_vec() }],
    })
}

/// The residual values in partition order, concatenated back into one
/// sequence (matching the order they appear in the subframe).
pub fn flatten(residual: &Residual) -> Vec<i32> {
    residual.partitions.iter().flat_map(|p| p.residuals().iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_coded_partitions() {
        let residuals: Vec<i32> = (-50..50).collect();
        let residual = encode(&residuals).unwrap();

        let mut w = BitWriter::new();
        write_residual(&mut w, &residual);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(Cursor::new(bytes));
        let decoded = read_residual(&mut r, residuals.len(), 0).unwrap();
        assert_eq!(flatten(&decoded), residuals);
    }

    #[test]
    fn round_trips_escaped_partition() {
        let residual = Residual {
            method: Method::Rice4,
            partition_order: 0,
            partitions: vec![Partition::Escaped { raw_bits: 10, residuals: vec![1, -1, 500, -500] }],
        };
        let mut w = BitWriter::new();
        write_residual(&mut w, &residual);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(Cursor::new(bytes));
        let decoded = read_residual(&mut r, 4, 0).unwrap();
        assert_eq!(decoded, residual);
    }

    #[test]
    fn round_trips_multiple_partitions_with_predictor_order() {
        let block_size = 16;
        let predictor_order = 2;
        let residuals: Vec<i32> = (0..block_size - predictor_order).map(|i| (i as i32) % 7 - 3).collect();

        let residual = Residual {
            method: Method::Rice5,
            partition_order: 2,
            partitions: (0..4)
                .map(|i| {
                    let count = if i == 0 { block_size / 4 - predictor_order } else { block_size / 4 };
                    let start = if i == 0 { 0 } else { block_size / 4 * i - predictor_order };
                    Partition::Coded { parameter: 3, residuals: residuals[start..start + count].to_vec() }
                })
                .collect(),
        };

        let mut w = BitWriter::new();
        write_residual(&mut w, &residual);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(Cursor::new(bytes));
        let decoded = read_residual(&mut r, block_size, predictor_order).unwrap();
        assert_eq!(flatten(&decoded), residuals);
    }

    #[test]
    fn choose_parameter_is_optimal_for_simple_distributions() {
        let residuals: Vec<i32> = vec![0; 100];
        assert_eq!(choose_parameter(&residuals, 30).unwrap(), 0);
    }
}
