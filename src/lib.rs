//! Lexical path sanitization and symlink-traversal filtering for tar
//! and zip extraction.
//!
//! This crate does not extract archives to disk and does not decode
//! any compression format; it sits between a host decoder (the `tar`
//! or `zip` crate) and whatever the caller does with each entry,
//! rewriting or dropping entries according to a [`SecurityMode`]
//! bitmask before they are ever observed by the caller. The filtering
//! is purely lexical: no entry is ever resolved against the real
//! filesystem, so the same archive produces the same filtered output
//! regardless of what already exists on disk.
//!
//! ```no_run
//! use archguard::{SecurityMode, tar::Reader};
//! use std::fs::File;
//!
//! # fn main() -> archguard::Result<()> {
//! let mut reader = Reader::new(File::open("archive.tar")?);
//! reader.set_security_mode(SecurityMode::maximum());
//! for entry in reader.entries()? {
//!     let entry = entry?;
//!     println!("{}", entry.metadata().name);
//! }
//! # Ok(())
//! # }
//! ```

mod entry;
mod error;
mod filter;
mod mode;
mod path;

#[cfg(feature = "tar")]
pub mod tar;

#[cfg(feature = "zip")]
pub mod zip;

pub use entry::{EntryType, EntryTypeSerde, RawEntry, SanitizedEntry};
pub use error::{Error, Result};
pub use filter::PathStyle;
pub use mode::SecurityMode;
pub use path::{posix, shortname, windows};
