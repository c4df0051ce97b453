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

//! CRC-8 and CRC-16/BUYPASS, the two checksums used to guard the frame
//! header and frame body respectively.
//!
//! Grounded on claxon's `crc::Crc8Reader`, which wraps a byte source and
//! accumulates a running CRC-8 as `frame::read_frame_header` reads through
//! it. This crate's frame format additionally needs a CRC-16 over the same
//! byte range extended through the subframe payload, so rather than
//! wrapping the reader twice, `bitstream::BitReader` tracks both checksums
//! itself via the `update_crc8`/`update_crc16` steps below, snapshotting
//! each at the point `frame::read_frame` needs it.

/// Feeds one byte through the CRC-8 (polynomial 0x07, init 0, no xor-out)
/// used for the FLAC frame header.
pub(crate) fn update_crc8(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
    }
    crc
}

/// Feeds one byte through CRC-16/BUYPASS (polynomial 0x8005, init 0, no
/// xor-out) used for the FLAC frame footer.
pub(crate) fn update_crc16(mut crc: u16, byte: u8) -> u16 {
    crc ^= (byte as u16) << 8;
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
    }
    crc
}

/// Computes the CRC-8 of a complete byte slice in one call.
///
/// Used by the encoder, which has the header bytes available up front.
pub fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |crc, &b| update_crc8(crc, b))
}

/// Computes the CRC-16/BUYPASS of a complete byte slice in one call.
pub fn crc16_buypass(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |crc, &b| update_crc16(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    // The standard CRC catalogue check values for "123456789".
    const CHECK: &[u8] = b"123456789";

    #[test]
    fn crc8_matches_check_value() {
        assert_eq!(crc8(CHECK), 0xf4);
    }

    #[test]
    fn crc16_buypass_matches_check_value() {
        assert_eq!(crc16_buypass(CHECK), 0xfee8);
    }
}
