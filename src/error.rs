use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `archguard`.
///
/// Filtered entries are never represented here — per the filter's
/// fail-safe contract, an entry that is dropped by policy simply never
/// appears in the output stream. Every variant below is a pass-through
/// failure from the underlying host decoder or the byte source it reads
/// from.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "zip")]
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}
