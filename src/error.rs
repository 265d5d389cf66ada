//! The error type used across the crate.

use std::io;

use failure::Fail;


/// The things that can go wrong while exporting.
///
/// Size accounting problems (a property whose type has no known byte width)
/// are deliberately *not* part of this enum: they only degrade the schema and
/// are reported via `log`, see [`schema::compile`][crate::schema::compile].
#[derive(Debug, Fail)]
pub enum Error {
    /// The requested format names no supported PLY encoding. This is raised
    /// when the format token is parsed, before any I/O happens.
    #[fail(display = "unsupported PLY format: {}", _0)]
    UnsupportedFormat(String),

    /// A vertex row did not hold one value per compiled vertex property.
    ///
    /// The binary encoder checks this before touching its buffer, since a
    /// mismatched row would silently shift every following vertex.
    #[fail(display = "vertex row holds {} values, but the schema defines {} properties", got, expected)]
    RowArityMismatch {
        expected: usize,
        got: usize,
    },

    /// A sink operation failed. The core performs no partial-file cleanup;
    /// whatever was written so far is left to the sink's owner.
    #[fail(display = "IO error: {}", _0)]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}
