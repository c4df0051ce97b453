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

//! Compile-time stream parameters.
//!
//! This crate only ever encodes 16-bit/44.1kHz stereo PCM with a fixed block
//! size of 4096 samples, so these are constants rather than fields threaded
//! through every function, per the "keep global constants in one place"
//! guidance: the frame and stream-info bit codes that the format derives
//! from these numbers are computed from them below rather than hardcoded
//! again at each call site.

/// Number of inter-channel samples per full block.
pub const BLOCK_SIZE: usize = 4096;

/// Sample rate of the audio this crate encodes, in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Bits per sample of the audio this crate encodes.
pub const SAMPLE_SIZE: u32 = 16;

/// Number of channels of the audio this crate encodes.
pub const NUM_CHANNELS: u32 = 2;

/// Maximum order of the fixed predictors the encoder considers.
pub const MAX_FIXED_PREDICTOR_ORDER: u8 = 4;

/// The 4-bit frame header block-size code for a full `BLOCK_SIZE` block.
///
/// `BLOCK_SIZE` is 4096 = 256 << 4, which is code `1100` (12) in the
/// `256 << (n - 8)` family of codes.
pub const BLOCK_SIZE_CODE: u8 = 0b1100;

/// The 4-bit frame header block-size code meaning "read the actual size,
/// minus one, from a 16-bit field at the end of the header."
pub const BLOCK_SIZE_CODE_CUSTOM_16BIT: u8 = 0b0111;

/// The 4-bit frame header sample-rate code for `SAMPLE_RATE` (44,100 Hz).
pub const SAMPLE_RATE_CODE: u8 = 0b1001;

/// The 4-bit frame header channel-assignment code for independent stereo.
pub const CHANNEL_ASSIGNMENT_CODE: u8 = 0b0001;

/// The 3-bit frame header sample-size code for `SAMPLE_SIZE` (16 bits).
pub const SAMPLE_SIZE_CODE: u8 = 0b100;
