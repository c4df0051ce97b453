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

//! Flacon is a bit-exact FLAC encoder and decoder for 16-bit/44.1kHz stereo
//! PCM. The encoder accepts a RIFF/WAVE input; the decoder inverts any
//! stream the encoder can produce, and additionally tolerates the wider
//! format (variable block size, LPC subframes, mid/side and left/side/
//! right/side channel assignment) that third-party encoders may emit.

pub mod bitstream;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod predictor;
pub mod rice;
pub mod subframe;
pub mod varint;
pub mod wave;

use std::io::{Read, Seek, Write};

use error::Result;

/// Encodes a RIFF/WAVE input into a complete FLAC stream.
pub fn encode<R: Read, W: Write>(wave_input: R, flac_output: &mut W) -> Result<()> {
    let pcm = wave::read_wave(wave_input)?;
    let channels: [Vec<i32>; 2] = pcm
        .channels
        .try_into()
        .map_err(|_| error::Error::Unsupported("WAVE file is not stereo"))?;
    encoder::encode(flac_output, &channels, pcm.md5sum)
}

/// Decodes a complete FLAC stream into a RIFF/WAVE output.
pub fn decode<R: Read + Seek, W: Write + Seek>(flac_input: &mut R, wave_output: W) -> Result<()> {
    let decoded = decoder::decode(flac_input)?;
    wave::write_wave(wave_output, &decoded.channels)
}
