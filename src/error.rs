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

//! The `error` module defines the error and result types used throughout the
//! crate.

use std::error;
use std::fmt;
use std::io;

/// An error that prevents successful encoding or decoding of a FLAC stream.
#[derive(Debug)]
pub enum Error {
    /// Not a decoding error, but a problem with the underlying IO.
    Io(io::Error),

    /// The stream does not conform to the subset of FLAC this crate handles.
    ///
    /// The message describes which part of the format was violated, e.g.
    /// a missing sync code or an inconsistent bound.
    Format(&'static str),

    /// The input is well-formed but outside what this crate supports, e.g.
    /// a WAVE file that is not 16-bit/44.1kHz/stereo.
    Unsupported(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => write!(f, "IO error: {}", err),
            Error::Format(msg) => write!(f, "invalid FLAC stream: {}", msg),
            Error::Unsupported(msg) => write!(f, "unsupported input: {}", msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Format(_) | Error::Unsupported(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Either `T` on success, or an `Error` on failure.
pub type Result<T> = std::result::Result<T, Error>;

/// Builds an `Err(Error::Format(msg))`, for use with `?` at the call site.
pub fn fmt_err<T>(msg: &'static str) -> Result<T> {
    Err(Error::Format(msg))
}

/// Builds an `Err(Error::Unsupported(msg))`, for use with `?` at the call site.
pub fn unsupported_err<T>(msg: &'static str) -> Result<T> {
    Err(Error::Unsupported(msg))
}
