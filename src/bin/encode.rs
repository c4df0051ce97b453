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

//! `flac-encode INPUT.wav OUTPUT.flac`
//!
//! Grounded on claxon's `src/bin/decode.rs` for the two-positional-argument
//! shape, modernized to propagate errors through `main`'s `Result` return
//! instead of panicking via `.expect()`.

use std::env;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::process::ExitCode;

use flacon::error::Error;

fn run() -> Result<(), Error> {
    let mut args = env::args_os().skip(1);
    let input_path = args.next().ok_or(Error::Unsupported("usage: flac-encode INPUT.wav OUTPUT.flac"))?;
    let output_path = args.next().ok_or(Error::Unsupported("usage: flac-encode INPUT.wav OUTPUT.flac"))?;

    let input = BufReader::new(File::open(input_path)?);
    let mut output = BufWriter::new(File::create(output_path)?);
    flacon::encode(input, &mut output)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flac-encode: {}", err);
            ExitCode::FAILURE
        }
    }
}
