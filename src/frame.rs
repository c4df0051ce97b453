// Flacon -- a bit-exact FLAC encoder and decoder
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License, version 3,
// as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The `frame` module deals with the frames that make up a FLAC stream.
//!
//! Grounded on claxon's `frame` module: `ChannelAssignment` and the
//! `decode_left_side`/`decode_right_side`/`decode_mid_side` undecorrelation
//! functions are carried over in shape; `read_frame_header` is rewritten
//! against this crate's `bitstream`/`crc`/`varint` modules, and
//! `write_frame_header`/`write_frame` are new (claxon is decode-only).

use crate::bitstream::{BitReader, BitWriter};
use crate::constants;
use crate::error::{fmt_err, Result};
use crate::subframe::{self, SubframeData};
use crate::varint;
use std::io::Read;

/// How the subframes of a frame combine into output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// `n` independently coded channels, no decorrelation.
    Independent(u8),
    /// Channel 0 is left, channel 1 is (left - right).
    LeftSide,
    /// Channel 0 is (left - right), channel 1 is right.
    RightSide,
    /// Channel 0 is mid, channel 1 is side; see `decode_mid_side`.
    MidSide,
}

impl ChannelAssignment {
    /// Number of subframes (and thus output channels) this assignment has.
    pub fn channels(&self) -> u8 {
        match *self {
            ChannelAssignment::Independent(n) => n,
            ChannelAssignment::LeftSide | ChannelAssignment::RightSide | ChannelAssignment::MidSide => 2,
        }
    }

    /// The bits-per-sample adjustment for the "side" subframe, which
    /// carries one extra bit of range. `None` for independent channels.
    fn side_channel_index(&self) -> Option<u8> {
        match *self {
            ChannelAssignment::LeftSide | ChannelAssignment::MidSide => Some(1),
            ChannelAssignment::RightSide => Some(0),
            ChannelAssignment::Independent(_) => None,
        }
    }
}

/// Reconstructs (left, right) from an independently-coded left channel and
/// a side channel (left - right).
pub fn decode_left_side(left: &[i32], side: &[i32]) -> Vec<i32> {
    left.iter().zip(side.iter()).map(|(&l, &s)| l - s).collect()
}

/// Reconstructs (left, right) from a side channel (left - right) and an
/// independently-coded right channel.
pub fn decode_right_side(side: &[i32], right: &[i32]) -> Vec<i32> {
    side.iter().zip(right.iter()).map(|(&s, &r)| r + s).collect()
}

/// Reconstructs left given mid and side channels, where
/// `mid = (left + right) >> 1` (rounded down) and `side = left - right`.
pub fn decode_mid_side(mid: &[i32], side: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let mut left = Vec::with_capacity(mid.len());
    let mut right = Vec::with_capacity(mid.len());
    for (&m, &s) in mid.iter().zip(side.iter()) {
        let doubled_mid = (m << 1) | (s & 1);
        left.push((doubled_mid + s) >> 1);
        right.push((doubled_mid - s) >> 1);
    }
    (left, right)
}

const SYNC_CODE: u64 = 0b11_1111_1111_1110;

/// Parsed frame header fields, independent of the subframe payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub block_size: u32,
    pub channel_assignment: ChannelAssignment,
    pub bits_per_sample: u32,
    pub frame_number: u64,
}

fn decode_block_size<R: Read>(r: &mut BitReader<R>, code: u64) -> Result<u32> {
    match code {
        0 => fmt_err("reserved block size code"),
        1 => Ok(192),
        2..=5 => Ok(576 << (code - 2)),
        6 => Ok(r.read_uint(8)? as u32 + 1),
        7 => Ok(r.read_uint(16)? as u32 + 1),
        8..=15 => Ok(256 << (code - 8)),
        _ => unreachable!(),
    }
}

fn decode_sample_rate<R: Read>(r: &mut BitReader<R>, code: u64) -> Result<()> {
    match code {
        0..=11 => Ok(()),
        12 => {
            r.read_uint(8)?;
            Ok(())
        }
        13 | 14 => {
            r.read_uint(16)?;
            Ok(())
        }
        15 => fmt_err("reserved sample rate code"),
        _ => unreachable!(),
    }
}

fn decode_channel_assignment(code: u64) -> Result<ChannelAssignment> {
    match code {
        0..=7 => Ok(ChannelAssignment::Independent(code as u8 + 1)),
        8 => Ok(ChannelAssignment::LeftSide),
        9 => Ok(ChannelAssignment::RightSide),
        10 => Ok(ChannelAssignment::MidSide),
        _ => fmt_err("reserved channel assignment code"),
    }
}

fn decode_bits_per_sample(code: u64, streaminfo_bits_per_sample: u32) -> Result<u32> {
    match code {
        0b000 => Ok(streaminfo_bits_per_sample),
        0b001 => Ok(8),
        0b010 => Ok(12),
        0b100 => Ok(16),
        0b101 => Ok(20),
        0b110 => Ok(24),
        _ => fmt_err("reserved sample size code"),
    }
}

/// Reads one frame header. The caller has already consumed the first sync
/// byte (`0xff`) via `read_byte_or_eof` while probing for end-of-stream;
/// `first_byte` must be that byte.
fn read_frame_header<R: Read>(
    r: &mut BitReader<R>,
    first_byte: u8,
    streaminfo_bits_per_sample: u32,
) -> Result<FrameHeader> {
    let sync = ((first_byte as u64) << 6) | r.read_uint(6)?;
    if sync != SYNC_CODE {
        return fmt_err("sync code lost");
    }
    if r.read_bit()? {
        return fmt_err("frame header reserved bit is set");
    }
    let _blocking_strategy = r.read_bit()?;

    let block_size_code = r.read_uint(4)?;
    let sample_rate_code = r.read_uint(4)?;
    let channel_assignment_code = r.read_uint(4)?;
    let bits_per_sample_code = r.read_uint(3)?;
    if r.read_bit()? {
        return fmt_err("frame header reserved bit is set");
    }

    let frame_number = varint::read_var_length_int(r)?;
    let block_size = decode_block_size(r, block_size_code)?;
    decode_sample_rate(r, sample_rate_code)?;
    let channel_assignment = decode_channel_assignment(channel_assignment_code)?;
    let bits_per_sample = decode_bits_per_sample(bits_per_sample_code, streaminfo_bits_per_sample)?;

    Ok(FrameHeader { block_size, channel_assignment, bits_per_sample, frame_number })
}

fn block_size_code(block_size: u32) -> u64 {
    if block_size == constants::BLOCK_SIZE as u32 {
        constants::BLOCK_SIZE_CODE as u64
    } else {
        constants::BLOCK_SIZE_CODE_CUSTOM_16BIT as u64
    }
}

fn write_frame_header(w: &mut BitWriter, block_size: u32, frame_number: u64) {
    w.write_uint(SYNC_CODE, 14);
    w.write_uint(0, 1);
    w.write_uint(0, 1);
    w.write_uint(block_size_code(block_size), 4);
    w.write_uint(constants::SAMPLE_RATE_CODE as u64, 4);
    w.write_uint(constants::CHANNEL_ASSIGNMENT_CODE as u64, 4);
    w.write_uint(constants::SAMPLE_SIZE_CODE as u64, 3);
    w.write_uint(0, 1);
    varint::write_var_length_int(w, frame_number);
    if block_size_code(block_size) == constants::BLOCK_SIZE_CODE_CUSTOM_16BIT as u64 {
        w.write_uint(block_size as u64 - 1, 16);
    }
}

/// A full decoded frame: its header and one reconstructed channel per
/// subframe, in subframe (not necessarily output) order.
pub struct Frame {
    pub header: FrameHeader,
    pub channels: Vec<Vec<i32>>,
}

/// Reads one frame from `r`, or returns `Ok(None)` if the stream ends
/// cleanly at a frame boundary (no partial frame was started).
pub fn read_frame<R: Read>(
    reader: &mut R,
    streaminfo_bits_per_sample: u32,
) -> Result<Option<Frame>> {
    let mut r = BitReader::new(reader);

    let first_byte = match r.read_byte_or_eof()? {
        None => return Ok(None),
        Some(b) => b,
    };

    let header = read_frame_header(&mut r, first_byte, streaminfo_bits_per_sample)?;

    let computed_crc8 = r.crc8();
    let presumed_crc8 = r.read_uint(8)? as u8;
    if computed_crc8 != presumed_crc8 {
        return fmt_err("frame header crc-8 mismatch");
    }

    let num_subframe_channels = header.channel_assignment.channels();
    let side_index = header.channel_assignment.side_channel_index();
    let mut subframes = Vec::with_capacity(num_subframe_channels as usize);
    for i in 0..num_subframe_channels {
        let bps = if side_index == Some(i) { header.bits_per_sample + 1 } else { header.bits_per_sample };
        subframes.push(subframe::read_subframe(&mut r, bps, header.block_size as usize)?);
    }

    r.align_to_byte();
    let computed_crc16 = r.crc16();
    let presumed_crc16 = r.read_uint(16)? as u16;
    if computed_crc16 != presumed_crc16 {
        return fmt_err("frame footer crc-16 mismatch");
    }

    let channels = undecorrelate(&header.channel_assignment, &subframes, header.block_size as usize);
    Ok(Some(Frame { header, channels }))
}

fn undecorrelate(
    assignment: &ChannelAssignment,
    subframes: &[SubframeData],
    block_size: usize,
) -> Vec<Vec<i32>> {
    match *assignment {
        ChannelAssignment::Independent(_) => {
            subframes.iter().map(|s| s.to_samples(block_size)).collect()
        }
        ChannelAssignment::LeftSide => {
            let left = subframes[0].to_samples(block_size);
            let side = subframes[1].to_samples(block_size);
            let right = decode_left_side(&left, &side);
            vec![left, right]
        }
        ChannelAssignment::RightSide => {
            let side = subframes[0].to_samples(block_size);
            let right = subframes[1].to_samples(block_size);
            let left = decode_right_side(&side, &right);
            vec![left, right]
        }
        ChannelAssignment::MidSide => {
            let mid = subframes[0].to_samples(block_size);
            let side = subframes[1].to_samples(block_size);
            let (left, right) = decode_mid_side(&mid, &side);
            vec![left, right]
        }
    }
}

/// Writes one frame (two independently-coded channels, per this crate's
/// non-goal of encoding any inter-channel decorrelation).
pub fn write_frame<W: std::io::Write>(
    writer: &mut W,
    frame_number: u64,
    block_size: u32,
    subframes: &[SubframeData; 2],
) -> Result<()> {
    let mut header_bits = BitWriter::new();
    write_frame_header(&mut header_bits, block_size, frame_number);
    let header_bytes = header_bits.into_bytes();
    let crc8 = crate::crc::crc8(&header_bytes);

    let mut payload_bits = BitWriter::new();
    for s in subframes {
        subframe::write_subframe(&mut payload_bits, s, constants::SAMPLE_SIZE);
    }
    let payload_bytes = payload_bits.into_bytes();

    let mut frame_bytes = header_bytes;
    frame_bytes.push(crc8);
    frame_bytes.extend_from_slice(&payload_bytes);
    let crc16 = crate::crc::crc16_buypass(&frame_bytes);

    writer.write_all(&frame_bytes)?;
    writer.write_all(&crc16.to_be_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_left_side_inverts_encoding() {
        let left = vec![10, 20, 30];
        let right = vec![7, 25, 28];
        let side: Vec<i32> = left.iter().zip(right.iter()).map(|(&l, &r)| l - r).collect();
        assert_eq!(decode_left_side(&left, &side), right);
    }

    #[test]
    fn decode_right_side_inverts_encoding() {
        let left = vec![10, 20, 30];
        let right = vec![7, 25, 28];
        let side: Vec<i32> = left.iter().zip(right.iter()).map(|(&l, &r)| l - r).collect();
        assert_eq!(decode_right_side(&side, &right), left);
    }

    #[test]
    fn decode_mid_side_inverts_encoding() {
        let left = vec![10, -20, 30, -7];
        let right = vec![7, -25, 28, -7];
        let mid: Vec<i32> = left.iter().zip(right.iter()).map(|(&l, &r)| (l + r) >> 1).collect();
        let side: Vec<i32> = left.iter().zip(right.iter()).map(|(&l, &r)| l - r).collect();
        let (decoded_left, decoded_right) = decode_mid_side(&mid, &side);
        assert_eq!(decoded_left, left);
        assert_eq!(decoded_right, right);
    }

    #[test]
    fn frame_round_trips_through_write_and_read() {
        use crate::subframe::encode_fixed;

        let left: Vec<i32> = (0..100).collect();
        let right: Vec<i32> = (0..100).map(|i| 100 - i).collect();
        let left_sf = encode_fixed(2, &left).unwrap().unwrap();
        let right_sf = encode_fixed(2, &right).unwrap().unwrap();

        let mut bytes = Vec::new();
        write_frame(&mut bytes, 0, 100, &[left_sf, right_sf]).unwrap();

        let mut cursor = std::io::Cursor::new(bytes);
        let frame = read_frame(&mut cursor, 16).unwrap().unwrap();
        assert_eq!(frame.channels[0], left);
        assert_eq!(frame.channels[1], right);
        assert_eq!(frame.header.frame_number, 0);
        assert_eq!(frame.header.block_size, 100);

        assert!(read_frame(&mut cursor, 16).unwrap().is_none());
    }
}
