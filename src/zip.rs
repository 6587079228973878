//! The random-access zip reader (spec §6).
//!
//! Unlike the streaming tar wrapper, `Reader<R>` materializes its
//! entire filtered file list up front — once at construction, and
//! again whenever [`Reader::set_security_mode`] changes the active
//! policy. Each recomputation walks the archive's central directory in
//! its original order and runs a fresh [`SymlinkSet`] over it, so the
//! result is a pure function of `(archive, mode)` rather than
//! accumulated call history (spec §7, "idempotent and reversible").

use std::io::{Read, Seek};

use crate::entry::{EntryType, RawEntry, SanitizedEntry};
use crate::error::{Error, Result};
use crate::filter::{filter_zip_entry, PathStyle, SymlinkSet};
use crate::mode::SecurityMode;

fn classify(file: &::zip::read::ZipFile<'_>) -> EntryType {
    if file.is_dir() {
        return EntryType::Directory;
    }
    match file.unix_mode() {
        Some(mode) => classify_unix_mode(mode),
        None => EntryType::Regular,
    }
}

/// Maps a raw POSIX `unix_mode()` value to the entry-type contract.
/// DOS-origin zip entries (`unix_mode() == None`, or mode bits with no
/// type nibble set) have no type information at all and are treated as
/// ordinary, matching `is_special_by_unix_mode`'s own `0 => false` case.
fn classify_unix_mode(mode: u32) -> EntryType {
    const S_IFMT: u32 = 0o170000;
    const S_IFREG: u32 = 0o100000;
    const S_IFDIR: u32 = 0o040000;
    const S_IFLNK: u32 = 0o120000;
    const S_IFCHR: u32 = 0o020000;
    const S_IFBLK: u32 = 0o060000;
    const S_IFIFO: u32 = 0o010000;
    match mode & S_IFMT {
        0 | S_IFREG => EntryType::Regular,
        S_IFDIR => EntryType::Directory,
        S_IFLNK => EntryType::Symlink,
        S_IFCHR => EntryType::CharDevice,
        S_IFBLK => EntryType::BlockDevice,
        S_IFIFO => EntryType::Fifo,
        _ => EntryType::Other,
    }
}

/// Reads a zip entry's target for symlink entries: the zip format has
/// no link-name header field, so the link target is the entry's file
/// content itself (the convention `zip`/`unzip`/Info-ZIP all use).
fn read_link_target(file: &mut ::zip::read::ZipFile<'_>) -> std::io::Result<String> {
    let mut target = String::new();
    file.read_to_string(&mut target)?;
    Ok(target)
}

struct FilteredFile {
    original_index: usize,
    sanitized: SanitizedEntry,
}

/// Wraps a random-access zip archive, exposing only the entries that
/// survive the filter pipeline under the current [`SecurityMode`].
pub struct Reader<R: Read + Seek> {
    archive: ::zip::ZipArchive<R>,
    mode: SecurityMode,
    style: PathStyle,
    filtered: Vec<FilteredFile>,
}

impl<R: Read + Seek> Reader<R> {
    pub fn new(inner: R) -> Result<Self> {
        Self::with_style(inner, PathStyle::for_platform())
    }

    pub fn with_style(inner: R, style: PathStyle) -> Result<Self> {
        let archive = ::zip::ZipArchive::new(inner)?;
        let mut reader = Self {
            archive,
            mode: SecurityMode::default_for_platform(),
            style,
            filtered: Vec::new(),
        };
        reader.recompute_filtered()?;
        Ok(reader)
    }

    pub fn security_mode(&self) -> SecurityMode {
        self.mode
    }

    /// Re-filters the full entry list against `mode`, discarding the
    /// previous filtered view and recomputing symlink-traversal state
    /// from scratch.
    pub fn set_security_mode(&mut self, mode: SecurityMode) -> Result<()> {
        self.mode = mode;
        self.recompute_filtered()
    }

    /// The number of entries that currently survive filtering.
    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Metadata for every entry that currently survives filtering, in
    /// archive order.
    pub fn entries(&self) -> impl Iterator<Item = &SanitizedEntry> {
        self.filtered.iter().map(|f| &f.sanitized)
    }

    /// Opens the `index`th *filtered* entry for reading (not the
    /// original archive index — entries dropped by the filter do not
    /// consume a slot here).
    pub fn open_by_index(&mut self, index: usize) -> Result<::zip::read::ZipFile<'_>> {
        let original_index = self
            .filtered
            .get(index)
            .ok_or_else(|| Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "index out of range")))?
            .original_index;
        Ok(self.archive.by_index(original_index)?)
    }

    fn recompute_filtered(&mut self) -> Result<()> {
        let mut filtered = Vec::new();
        let mut symlinks = SymlinkSet::new();

        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            let entry_type = classify(&file);
            let original_unix_mode = file.unix_mode().unwrap_or(0);
            let name = file.name().to_string();
            let linkname = if entry_type == EntryType::Symlink {
                read_link_target(&mut file)?
            } else {
                String::new()
            };

            let raw = RawEntry {
                name,
                linkname,
                entry_type,
                mode: original_unix_mode,
                extensions: std::collections::HashMap::new(),
                xattrs: std::collections::HashMap::new(),
            };

            if let Some(sanitized) =
                filter_zip_entry(self.mode, self.style, &mut symlinks, raw, original_unix_mode)
            {
                filtered.push(FilteredFile {
                    original_index: i,
                    sanitized,
                });
            }
        }

        self.filtered = filtered;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write as _};
    use ::zip::write::{SimpleFileOptions, ZipWriter};

    fn build_archive(entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, unix_mode, data) in entries {
            let options = SimpleFileOptions::default().unix_permissions(*unix_mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn traversal_filenames_are_sanitized() {
        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[
            ("../traverse", S_IFREG | 0o644, b"a"),
            ("/absolute", S_IFREG | 0o644, b"b"),
        ]);
        let mut reader =
            Reader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
        reader
            .set_security_mode(SecurityMode::SANITIZE_FILENAMES)
            .unwrap();

        let names: Vec<&str> = reader.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["traverse", "absolute"]);
    }

    #[test]
    fn without_sanitize_filenames_names_pass_through() {
        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[("../traverse", S_IFREG | 0o644, b"a")]);
        let mut reader =
            Reader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
        reader.set_security_mode(SecurityMode::empty()).unwrap();

        let names: Vec<&str> = reader.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["../traverse"]);
    }

    #[test]
    fn set_security_mode_recomputes_from_scratch() {
        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[("a/b.txt", S_IFREG | 0o644, b"x")]);
        let mut reader =
            Reader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
        reader.set_security_mode(SecurityMode::empty()).unwrap();
        assert_eq!(reader.len(), 1);

        reader
            .set_security_mode(SecurityMode::SKIP_SPECIAL_FILES)
            .unwrap();
        assert_eq!(reader.len(), 1, "regular file is never special");
    }

    #[test]
    fn mode_sanitization_clears_setuid_setgid_sticky() {
        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[("a.txt", S_IFREG | 0o4755, b"x")]);
        let mut reader =
            Reader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
        reader
            .set_security_mode(SecurityMode::SANITIZE_FILE_MODE)
            .unwrap();

        let entry = reader.entries().next().unwrap();
        assert_eq!(entry.mode & 0o7000, 0);
        assert_eq!(entry.mode & 0o777, 0o755);
    }

    #[test]
    fn content_is_readable_after_filtering() {
        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[("hello.txt", S_IFREG | 0o644, b"hello world")]);
        let mut reader =
            Reader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();

        let mut file = reader.open_by_index(0).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello world");
    }

    #[test]
    fn reader_works_over_a_real_temp_file_not_just_an_in_memory_cursor() {
        use std::io::{Seek, SeekFrom};

        const S_IFREG: u32 = 0o100000;
        let bytes = build_archive(&[("hello.txt", S_IFREG | 0o644, b"hello world")]);

        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut reader = Reader::with_style(file, PathStyle::Posix).unwrap();
        let names: Vec<&str> = reader.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["hello.txt"]);

        let mut opened = reader.open_by_index(0).unwrap();
        let mut contents = String::new();
        opened.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello world");
    }
}
