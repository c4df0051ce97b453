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

//! Crate-level round-trip and conformance tests, grounded on claxon's own
//! `tests/streaminfo.rs` (one integration test file, no external fixture
//! files) but rebuilt around in-memory WAVE buffers instead of a
//! `testsamples/` directory and the external `metaflac` tool, neither of
//! which this crate has any use for: the encoder and decoder are both
//! implemented here, so the comparison is against this crate's own decoder,
//! not a third party.

use std::io::Cursor;

fn make_wave(channels: &[Vec<i32>]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        let num_samples = channels[0].len();
        for i in 0..num_samples {
            for channel in channels {
                writer.write_sample(channel[i] as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    bytes
}

fn read_wave(bytes: &[u8]) -> Vec<Vec<i32>> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let channels = reader.spec().channels as usize;
    let mut out = vec![Vec::new(); channels];
    for (i, sample) in reader.samples::<i16>().enumerate() {
        out[i % channels].push(sample.unwrap() as i32);
    }
    out
}

fn round_trip(channels: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let wave_bytes = make_wave(channels);
    let mut flac_bytes = Vec::new();
    flacon::encode(Cursor::new(wave_bytes), &mut flac_bytes).unwrap();

    let mut wave_out = Vec::new();
    flacon::decode(&mut Cursor::new(flac_bytes), Cursor::new(&mut wave_out)).unwrap();
    read_wave(&wave_out)
}

#[test]
fn round_trip_recovers_byte_identical_samples() {
    let left: Vec<i32> = (0..20_000).map(|i| ((i * 37) % 4000) - 2000).collect();
    let right: Vec<i32> = (0..20_000).map(|i| ((i * 53) % 4000) - 2000).collect();
    let decoded = round_trip(&[left.clone(), right.clone()]);
    assert_eq!(decoded, vec![left, right]);
}

#[test]
fn encoded_stream_begins_with_magic_and_last_metadata_flag() {
    let channels = [vec![0i32; 100], vec![0i32; 100]];
    let wave_bytes = make_wave(&channels);
    let mut flac_bytes = Vec::new();
    flacon::encode(Cursor::new(wave_bytes), &mut flac_bytes).unwrap();

    assert_eq!(&flac_bytes[0..4], b"fLaC");
    let is_last = (flac_bytes[4] >> 7) == 1;
    assert!(is_last);
}

#[test]
fn frame_headers_are_sync_aligned() {
    let channels = [vec![7i32; 4096], vec![-7i32; 4096]];
    let wave_bytes = make_wave(&channels);
    let mut flac_bytes = Vec::new();
    flacon::encode(Cursor::new(wave_bytes), &mut flac_bytes).unwrap();

    let first_frame_byte = 4 + 4 + 34;
    let sync_byte_0 = flac_bytes[first_frame_byte];
    let sync_byte_1 = flac_bytes[first_frame_byte + 1];
    assert_eq!(sync_byte_0, 0xff);
    assert_eq!(sync_byte_1 >> 2, 0b11_1110);
}

#[test]
fn frame_crc_integrity_is_checked_on_decode() {
    let channels = [vec![1i32; 4096], vec![2i32; 4096]];
    let wave_bytes = make_wave(&channels);
    let mut flac_bytes = Vec::new();
    flacon::encode(Cursor::new(wave_bytes), &mut flac_bytes).unwrap();

    let last = flac_bytes.len() - 1;
    flac_bytes[last] ^= 0xff;

    let mut wave_out = Vec::new();
    assert!(flacon::decode(&mut Cursor::new(flac_bytes), Cursor::new(&mut wave_out)).is_err());
}

#[test]
fn short_final_block_uses_custom_block_size_field() {
    let channels = [vec![3i32; 5000], vec![-3i32; 5000]];
    let decoded = round_trip(&channels);
    assert_eq!(decoded, vec![vec![3i32; 5000], vec![-3i32; 5000]]);
}

#[test]
fn decoder_tolerates_mid_side_variable_block_size_and_lpc() {
    use flacon::bitstream::BitWriter;
    use flacon::frame;
    use flacon::rice;

    let block_size = 192u32;
    let left: Vec<i32> = (0..block_size as i32).map(|i| 1000 + i).collect();
    let right: Vec<i32> = (0..block_size as i32).map(|i| 1000 - i).collect();
    let mid: Vec<i32> = left.iter().zip(&right).map(|(&l, &r)| (l + r) >> 1).collect();
    let side: Vec<i32> = left.iter().zip(&right).map(|(&l, &r)| l - r).collect();

    // The mid channel is encoded as a hand-rolled order-2 LPC subframe: the
    // encoder never emits LPC (subframe::write_subframe refuses it), so
    // this exercises only the decoder's tolerance for third-party streams.
    let order = 2usize;
    let qlp_coefficients = vec![2i32, -1];
    let shift = 0i32;
    let mut residual_values = Vec::with_capacity(mid.len() - order);
    for i in order..mid.len() {
        let prediction =
            qlp_coefficients[0] as i64 * mid[i - 1] as i64 + qlp_coefficients[1] as i64 * mid[i - 2] as i64;
        residual_values.push((mid[i] as i64 - prediction) as i32);
    }
    let mid_residual = rice::encode(&residual_values).unwrap();
    let side_subframe = flacon::subframe::encode_fixed(1, &side).unwrap().unwrap();

    let mut header_bits = BitWriter::new();
    header_bits.write_uint(0b11_1111_1111_1110, 14);
    header_bits.write_uint(0, 1);
    header_bits.write_uint(1, 1);
    header_bits.write_uint(1, 4); // block size code 1 == 192.
    header_bits.write_uint(0b1001, 4);
    header_bits.write_uint(10, 4); // mid/side.
    header_bits.write_uint(0b100, 3);
    header_bits.write_uint(0, 1);
    flacon::varint::write_var_length_int(&mut header_bits, 0);
    let header_bytes = header_bits.into_bytes();
    let crc8 = flacon::crc::crc8(&header_bytes);

    let mut payload_bits = BitWriter::new();
    // Mid subframe: reserved bit, LPC type code (0b100000 | (order - 1)),
    // no wasted bits, warmup samples, precision - 1, shift, qlp
    // coefficients, then the partitioned-Rice residual.
    payload_bits.write_uint(0, 1);
    payload_bits.write_uint(0b100000 | (order as u64 - 1), 6);
    payload_bits.write_uint(0, 1); // no wasted bits.
    for &w in &mid[..order] {
        payload_bits.write_signed(w as i64, 16);
    }
    payload_bits.write_uint(3 - 1, 4); // precision 3 bits, enough for signed {2, -1}.
    payload_bits.write_signed(shift as i64, 5);
    for &c in &qlp_coefficients {
        payload_bits.write_signed(c as i64, 3);
    }
    rice::write_residual(&mut payload_bits, &mid_residual);

    flacon::subframe::write_subframe(&mut payload_bits, &side_subframe, 17);
    let payload_bytes = payload_bits.into_bytes();

    let mut frame_bytes = header_bytes;
    frame_bytes.push(crc8);
    frame_bytes.extend_from_slice(&payload_bytes);
    let crc16 = flacon::crc::crc16_buypass(&frame_bytes);
    frame_bytes.extend_from_slice(&crc16.to_be_bytes());

    let mut reader = &frame_bytes[..];
    let decoded = frame::read_frame(&mut reader, 16).unwrap().unwrap();
    assert_eq!(decoded.channels[0], left);
    assert_eq!(decoded.channels[1], right);
}
