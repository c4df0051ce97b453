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

//! Reading and writing the RIFF/WAVE envelope around the raw PCM this crate
//! encodes and decodes.
//!
//! Grounded on the teacher's own dev-dependency on `hound` (used in its
//! `examples/` and `tests/` to produce WAVE fixtures); this crate promotes
//! `hound` to a normal dependency since the CLI binaries need it at run
//! time, not just for test fixtures. This crate accepts and produces only
//! the one WAVE shape spec'd for the encoder: PCM, 2 channels, 44,100 Hz,
//! 16 bits per sample, interleaved little-endian signed samples.

use std::io::{Read, Seek, Write};

use crate::constants;
use crate::error::{unsupported_err, Result};

/// The interleaved stereo PCM samples read from a WAVE file, plus the MD5
/// digest of their raw little-endian byte representation.
pub struct PcmInput {
    /// Per-channel sample sequences, in channel order.
    pub channels: Vec<Vec<i32>>,
    /// MD5 digest of the whole interleaved PCM byte stream, computed before
    /// any block is encoded.
    pub md5sum: [u8; 16],
}

/// Reads a WAVE file, enforcing the one shape this crate's encoder accepts.
///
/// Fails with `Unsupported` if the file is not PCM, 16-bit, 44.1kHz stereo.
pub fn read_wave<R: Read>(reader: R) -> Result<PcmInput> {
    let mut wav = hound::WavReader::new(reader).map_err(|_| crate::error::Error::Unsupported("not a WAVE file"))?;
    let spec = wav.spec();

    if spec.sample_format != hound::SampleFormat::Int {
        return unsupported_err("WAVE data is not PCM");
    }
    if spec.channels != constants::NUM_CHANNELS as u16 {
        return unsupported_err("WAVE file is not stereo");
    }
    if spec.sample_rate != constants::SAMPLE_RATE {
        return unsupported_err("WAVE file is not 44.1kHz");
    }
    if spec.bits_per_sample != constants::SAMPLE_SIZE as u16 {
        return unsupported_err("WAVE file is not 16-bit");
    }

    let mut md5_bytes = Vec::new();
    let mut channels: Vec<Vec<i32>> = vec![Vec::new(); spec.channels as usize];
    let mut channel_index = 0usize;
    for sample in wav.samples::<i16>() {
        let sample = sample?;
        md5_bytes.extend_from_slice(&sample.to_le_bytes());
        channels[channel_index].push(sample as i32);
        channel_index = (channel_index + 1) % channels.len();
    }

    let md5sum = md5::compute(&md5_bytes).0;
    Ok(PcmInput { channels, md5sum })
}

impl From<hound::Error> for crate::error::Error {
    fn from(err: hound::Error) -> crate::error::Error {
        match err {
            hound::Error::IoError(e) => crate::error::Error::Io(e),
            _ => crate::error::Error::Unsupported("malformed WAVE file"),
        }
    }
}

/// Writes a WAVE file from interleaved stereo PCM samples.
pub fn write_wave<W: Write + Seek>(writer: W, channels: &[Vec<i32>]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: constants::NUM_CHANNELS as u16,
        sample_rate: constants::SAMPLE_RATE,
        bits_per_sample: constants::SAMPLE_SIZE as u16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut wav = hound::WavWriter::new(writer, spec)?;
    let num_samples = channels.first().map_or(0, |c| c.len());
    for i in 0..num_samples {
        for channel in channels {
            wav.write_sample(channel[i] as i16)?;
        }
    }
    wav.finalize()?;
    Ok(())
}
