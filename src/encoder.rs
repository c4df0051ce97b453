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

//! Stream assembly: turns interleaved PCM into a complete FLAC byte stream.
//!
//! Grounded on the original Python reference's `encode_wave_stream`, which
//! drives the same per-block candidate search and frame assembly; the
//! teacher has no encoder counterpart to ground this module on directly.

use std::io::Write;

use crate::constants;
use crate::error::Result;
use crate::frame;
use crate::metadata::{self, BlockType, StreamInfo};
use crate::subframe::{self, SubframeData};

const MAGIC: &[u8; 4] = b"fLaC";

/// Builds the candidate subframe with the smallest serialized bit length
/// for one channel's block of samples.
///
/// Ties break Constant < Verbatim < Fixed(order ascending), per the order
/// candidates are pushed below.
fn choose_subframe(samples: &[i32]) -> Result<SubframeData> {
    let mut candidates = Vec::new();
    if let Some(constant) = subframe::encode_constant(samples) {
        candidates.push(constant);
    }
    candidates.push(subframe::encode_verbatim(samples));
    for order in 0..=constants::MAX_FIXED_PREDICTOR_ORDER {
        if let Some(fixed) = subframe::encode_fixed(order, samples)? {
            candidates.push(fixed);
        }
    }

    let bps = constants::SAMPLE_SIZE;
    let block_size = samples.len();
    let best = candidates
        .into_iter()
        .min_by_key(|c| subframe::bit_len(c, bps, block_size))
        .expect("encode_verbatim is always a feasible candidate");
    Ok(best)
}

/// Encodes interleaved stereo PCM (`channels[0]` = left, `channels[1]` =
/// right) into a complete FLAC stream, writing it to `writer`.
pub fn encode<W: Write>(writer: &mut W, channels: &[Vec<i32>; 2], md5sum: [u8; 16]) -> Result<()> {
    let num_samples = channels[0].len();
    debug_assert_eq!(channels[1].len(), num_samples);

    writer.write_all(MAGIC)?;

    let info = StreamInfo {
        min_block_size: constants::BLOCK_SIZE as u16,
        max_block_size: constants::BLOCK_SIZE as u16,
        min_frame_size: None,
        max_frame_size: None,
        sample_rate: constants::SAMPLE_RATE,
        channels: constants::NUM_CHANNELS,
        bits_per_sample: constants::SAMPLE_SIZE,
        samples: Some(num_samples as u64),
        md5sum,
    };
    metadata::write_block_header(writer, true, BlockType::StreamInfo, 34)?;
    metadata::write_streaminfo_block(writer, &info)?;

    let mut offset = 0usize;
    let mut frame_number = 0u64;
    while offset < num_samples {
        let block_len = constants::BLOCK_SIZE.min(num_samples - offset);
        let left = &channels[0][offset..offset + block_len];
        let right = &channels[1][offset..offset + block_len];

        let left_subframe = choose_subframe(left)?;
        let right_subframe = choose_subframe(right)?;
        frame::write_frame(writer, frame_number, block_len as u32, &[left_subframe, right_subframe])?;

        offset += block_len;
        frame_number += 1;
    }

    Ok(())
}
