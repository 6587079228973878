//! The streaming tar reader (spec §6).
//!
//! `Reader<R>` wraps [`tar::Archive`] and applies the filter pipeline
//! entry-by-entry as the underlying stream is advanced. Unlike the zip
//! wrapper, there is no random access here: entries are filtered in
//! the order the host decoder yields them, and `SymlinkSet` state
//! accumulates for the lifetime of the `Reader`.

use std::io::{self, Read};

use crate::entry::{EntryType, RawEntry, SanitizedEntry};
use crate::error::Result;
use crate::filter::{filter_tar_entry, PathStyle, SymlinkSet};
use crate::mode::SecurityMode;

fn map_entry_type(ty: ::tar::EntryType) -> EntryType {
    match ty {
        ::tar::EntryType::Regular | ::tar::EntryType::Continuous => EntryType::Regular,
        ::tar::EntryType::Directory => EntryType::Directory,
        ::tar::EntryType::Symlink => EntryType::Symlink,
        ::tar::EntryType::Link => EntryType::HardLink,
        ::tar::EntryType::Char => EntryType::CharDevice,
        ::tar::EntryType::Block => EntryType::BlockDevice,
        ::tar::EntryType::Fifo => EntryType::Fifo,
        _ => EntryType::Other,
    }
}

/// Builds the pipeline-facing [`RawEntry`] from a `tar` crate header,
/// folding PAX extended-header records into the extension/xattr split
/// the filter expects: libarchive's `SCHILY.xattr.*` convention marks
/// real extended attributes, everything else is an ordinary extension
/// record.
fn build_raw_entry<R: Read>(entry: &::tar::Entry<'_, R>) -> io::Result<RawEntry> {
    let header = entry.header();
    let name = entry.path()?.to_string_lossy().into_owned();
    let linkname = entry
        .link_name()?
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mode = header.mode()?;
    let entry_type = map_entry_type(header.entry_type());

    let mut extensions = std::collections::HashMap::new();
    let mut xattrs = std::collections::HashMap::new();
    if let Some(pax) = entry.pax_extensions()? {
        for record in pax {
            let record = record?;
            let key = record.key()?.to_string();
            let Ok(value) = record.value() else {
                continue;
            };
            match xattr_name(&key) {
                Some(xattr_key) => {
                    xattrs.insert(xattr_key.to_string(), value.to_string());
                }
                None => {
                    extensions.insert(key, value.to_string());
                }
            }
        }
    }

    Ok(RawEntry {
        name,
        linkname,
        entry_type,
        mode,
        extensions,
        xattrs,
    })
}

/// Strips libarchive's `SCHILY.xattr.` prefix off a PAX extension-record
/// key, returning the bare attribute name if the record is a real
/// extended attribute rather than an ordinary extension record.
fn xattr_name(key: &str) -> Option<&str> {
    key.strip_prefix("SCHILY.xattr.")
}

/// Wraps a streaming tar reader, admitting only entries that survive
/// the filter pipeline under the current [`SecurityMode`].
pub struct Reader<R: Read> {
    archive: ::tar::Archive<R>,
    mode: SecurityMode,
    style: PathStyle,
    symlinks: SymlinkSet,
}

impl<R: Read> Reader<R> {
    /// Opens `inner` with the default security mode and the lexical
    /// sanitizer matching the host this code is compiled for.
    pub fn new(inner: R) -> Self {
        Self::with_style(inner, PathStyle::for_platform())
    }

    /// Opens `inner`, pinning the lexical sanitizer to `style`
    /// regardless of host platform.
    pub fn with_style(inner: R, style: PathStyle) -> Self {
        Self {
            archive: ::tar::Archive::new(inner),
            mode: SecurityMode::default_for_platform(),
            style,
            symlinks: SymlinkSet::new(),
        }
    }

    pub fn security_mode(&self) -> SecurityMode {
        self.mode
    }

    /// Changes the active mode for entries read from this point
    /// onward. Entries already yielded are unaffected; the symlink
    /// traversal state accumulated so far is kept (spec §7).
    ///
    /// In practice this only has an effect when called before
    /// [`Reader::entries`] is first invoked: `Entries` borrows `self`
    /// for its whole iteration and the underlying `tar::Archive`'s own
    /// entry stream is single-use, so there is no way to call this
    /// again between two `Next`-equivalent steps of an in-progress
    /// scan, unlike the zip reader.
    pub fn set_security_mode(&mut self, mode: SecurityMode) {
        self.mode = mode;
    }

    /// Returns an iterator over the entries that survive filtering,
    /// each readable in turn. Filtered-out entries are skipped
    /// transparently; they are never surfaced to the caller.
    pub fn entries(&mut self) -> Result<Entries<'_, R>> {
        Ok(Entries {
            inner: self.archive.entries()?,
            mode: self.mode,
            style: self.style,
            symlinks: &mut self.symlinks,
        })
    }
}

/// An iterator over a tar [`Reader`]'s admitted entries.
pub struct Entries<'a, R: Read> {
    inner: ::tar::Entries<'a, R>,
    mode: SecurityMode,
    style: PathStyle,
    symlinks: &'a mut SymlinkSet,
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<Entry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.inner.next()?;
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };
            let raw = match build_raw_entry(&entry) {
                Ok(raw) => raw,
                Err(err) => return Some(Err(err.into())),
            };
            match filter_tar_entry(self.mode, self.style, self.symlinks, raw) {
                Some(sanitized) => return Some(Ok(Entry { entry, sanitized })),
                None => continue,
            }
        }
    }
}

/// A single admitted tar entry: its sanitized metadata, plus the
/// ability to read its raw byte content by delegating straight to the
/// host decoder's own `Read` implementation.
pub struct Entry<'a, R: Read> {
    entry: ::tar::Entry<'a, R>,
    sanitized: SanitizedEntry,
}

impl<'a, R: Read> Entry<'a, R> {
    pub fn metadata(&self) -> &SanitizedEntry {
        &self.sanitized
    }
}

impl<'a, R: Read> Read for Entry<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.entry.read(buf)
    }
}
