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

//! The `metadata` module deals with metadata at the beginning of a FLAC
//! stream: the block header that precedes every metadata block, and the
//! STREAMINFO block this crate actually produces and consumes.
//!
//! Grounded on claxon's `metadata` module for `BlockType`/`BlockHeader`/
//! `read_block_header` and the `StreamInfo` field layout; `write_block_header`
//! and `write_streaminfo_block` are new (claxon is decode-only). The other
//! block kinds (APPLICATION, SEEKTABLE, VORBIS_COMMENT, CUESHEET, PICTURE)
//! are only ever skipped by length, never parsed, since this encoder never
//! emits them.

use std::io::{Read, Write};

use crate::error::{fmt_err, Result};

fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_be_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_be_u24<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 3];
    r.read_exact(&mut buf)?;
    Ok((buf[0] as u32) << 16 | (buf[1] as u32) << 8 | buf[2] as u32)
}

fn read_be_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn write_be_u24<W: Write>(w: &mut W, value: u32) -> Result<()> {
    let bytes = value.to_be_bytes();
    w.write_all(&bytes[1..])?;
    Ok(())
}

/// The different kinds of metadata block defined by the FLAC format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum BlockType {
    /// A STREAMINFO block, with technical details about the stream.
    StreamInfo = 0,
    /// A PADDING block, filled with zeros.
    Padding = 1,
    /// An APPLICATION block that holds application-defined data.
    Application = 2,
    /// A SEEKTABLE block, with data for supporting faster seeks.
    SeekTable = 3,
    /// A VORBIS_COMMENT block, with metadata tags.
    VorbisComment = 4,
    /// A CUESHEET block.
    CueSheet = 5,
    /// A PICTURE block, with cover art or other image metadata.
    Picture = 6,
}

/// A metadata block header.
#[derive(Clone, Copy)]
pub struct BlockHeader {
    /// Whether this is the last metadata block before the audio data.
    pub is_last: bool,
    /// The type of metadata block.
    pub block_type: BlockType,
    /// Length of the metadata block in bytes, excluding this header.
    pub length: u32,
}

/// Reads a metadata block header.
///
/// How the contents of the block should be interpreted depends on the type
/// of block. It is always possible to skip over the block by skipping
/// `header.length` bytes after reading the header.
pub fn read_block_header<R: Read>(input: &mut R) -> Result<BlockHeader> {
    let byte = read_u8(input)?;

    let is_last = (byte >> 7) == 1;
    let block_type_u8 = byte & 0b0111_1111;

    let length = read_be_u24(input)?;

    let block_type = match block_type_u8 {
        0 => BlockType::StreamInfo,
        1 => BlockType::Padding,
        2 => BlockType::Application,
        3 => BlockType::SeekTable,
        4 => BlockType::VorbisComment,
        5 => BlockType::CueSheet,
        6 => BlockType::Picture,
        127 => return fmt_err("invalid metadata block type"),
        _ => return fmt_err("invalid metadata block, encountered reserved block type"),
    };

    if block_type == BlockType::StreamInfo && length != 34 {
        return fmt_err("invalid streaminfo metadata block length");
    }

    Ok(BlockHeader { is_last, block_type, length })
}

/// Writes a metadata block header.
pub fn write_block_header<W: Write>(output: &mut W, is_last: bool, block_type: BlockType, length: u32) -> Result<()> {
    let byte = ((is_last as u8) << 7) | (block_type as u8);
    output.write_all(&[byte])?;
    write_be_u24(output, length)?;
    Ok(())
}

/// The STREAMINFO metadata block, with technical information about the
/// stream. Every FLAC stream this crate writes carries exactly one, as the
/// sole metadata block.
#[derive(Clone, Copy, Debug)]
pub struct StreamInfo {
    /// The minimum block size (in inter-channel samples) used in the stream.
    pub min_block_size: u16,
    /// The maximum block size (in inter-channel samples) used in the stream.
    pub max_block_size: u16,
    /// The minimum frame size (in bytes) used in the stream.
    pub min_frame_size: Option<u32>,
    /// The maximum frame size (in bytes) used in the stream.
    pub max_frame_size: Option<u32>,
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The number of channels.
    pub channels: u32,
    /// The number of bits per sample.
    pub bits_per_sample: u32,
    /// The total number of inter-channel samples in the stream.
    pub samples: Option<u64>,
    /// MD5 signature of the unencoded audio data.
    pub md5sum: [u8; 16],
}

/// Reads a STREAMINFO block.
pub fn read_streaminfo_block<R: Read>(input: &mut R) -> Result<StreamInfo> {
    let min_block_size = read_be_u16(input)?;
    let max_block_size = read_be_u16(input)?;

    let min_frame_size = read_be_u24(input)?;
    let max_frame_size = read_be_u24(input)?;

    let sample_rate_msb = read_be_u16(input)?;
    let sample_rate_lsb = read_u8(input)?;
    let sample_rate = (sample_rate_msb as u32) << 4 | (sample_rate_lsb as u32) >> 4;

    let n_channels_bps = sample_rate_lsb;
    let n_channels = ((n_channels_bps >> 1) & 0b0000_0111) + 1;

    let bps_msb = n_channels_bps & 1;
    let bps_lsb_n_samples = read_u8(input)?;
    let bits_per_sample = (bps_msb << 4 | (bps_lsb_n_samples >> 4)) + 1;

    let n_samples_msb = bps_lsb_n_samples & 0b0000_1111;
    let n_samples_lsb = read_be_u32(input)?;
    let n_samples = (n_samples_msb as u64) << 32 | n_samples_lsb as u64;

    let mut md5sum = [0u8; 16];
    input.read_exact(&mut md5sum)?;

    if min_block_size > max_block_size {
        return fmt_err("inconsistent bounds, min block size > max block size");
    }
    if min_block_size < 16 {
        return fmt_err("invalid block size, must be at least 16");
    }
    if min_frame_size > max_frame_size && max_frame_size != 0 {
        return fmt_err("inconsistent bounds, min frame size > max frame size");
    }
    if sample_rate == 0 || sample_rate > 655350 {
        return fmt_err("invalid sample rate");
    }

    Ok(StreamInfo {
        min_block_size,
        max_block_size,
        min_frame_size: if min_frame_size == 0 { None } else { Some(min_frame_size) },
        max_frame_size: if max_frame_size == 0 { None } else { Some(max_frame_size) },
        sample_rate,
        channels: n_channels as u32,
        bits_per_sample: bits_per_sample as u32,
        samples: if n_samples == 0 { None } else { Some(n_samples) },
        md5sum,
    })
}

/// Writes a STREAMINFO block, the inverse of `read_streaminfo_block`.
pub fn write_streaminfo_block<W: Write>(output: &mut W, info: &StreamInfo) -> Result<()> {
    output.write_all(&info.min_block_size.to_be_bytes())?;
    output.write_all(&info.max_block_size.to_be_bytes())?;
    write_be_u24(output, info.min_frame_size.unwrap_or(0))?;
    write_be_u24(output, info.max_frame_size.unwrap_or(0))?;

    let sample_rate_msb = (info.sample_rate >> 4) as u16;
    let channels_bits = (((info.channels - 1) & 0b111) as u8) << 1;
    let bps_top_bit = (((info.bits_per_sample - 1) >> 4) & 1) as u8;
    let sample_rate_lsb = (((info.sample_rate & 0xf) as u8) << 4) | channels_bits | bps_top_bit;

    output.write_all(&sample_rate_msb.to_be_bytes())?;
    output.write_all(&[sample_rate_lsb])?;

    let samples = info.samples.unwrap_or(0);
    let bps_low_nsamples_hi = ((((info.bits_per_sample - 1) & 0xf) as u8) << 4) | ((samples >> 32) as u8 & 0xf);
    output.write_all(&[bps_low_nsamples_hi])?;
    output.write_all(&(samples as u32).to_be_bytes())?;

    output.write_all(&info.md5sum)?;
    Ok(())
}
