//! The per-entry filtering pipeline shared by the tar and zip readers
//! (spec §4.4).
//!
//! The six policy steps are implemented as small, independently
//! testable functions here; [`filter_tar_entry`] and
//! [`filter_zip_entry`] compose them in each codec's own order. The
//! two codecs agree on every step except where the entry's *type* is
//! checked: tar checks it first, against the host decoder's own type
//! tag, before any mutation; zip checks it after filename
//! sanitization, against a derived unix-mode-based test, because the
//! zip format has no first-class type tag of its own.

use std::collections::HashMap;
use std::collections::HashSet;

use log::{debug, trace};

use crate::entry::{EntryType, RawEntry, SanitizedEntry, XATTR_EXTENSION_ALLOWLIST};
use crate::mode::SecurityMode;
use crate::path::{self, posix, windows};

mod mode_bits {
    pub const PERMISSION_BITS: u32 = 0o777;
    pub const SETUID: u32 = 0o4000;
    pub const SETGID: u32 = 0o2000;
    pub const STICKY: u32 = 0o1000;
}

/// Which platform's lexical sanitizer a reader should apply to
/// filenames. The filter pipeline itself is platform-agnostic; only
/// this one choice varies (spec §9, "Platform variance").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    pub fn for_platform() -> Self {
        if cfg!(target_os = "windows") {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    pub fn sanitize(self, name: &str) -> String {
        match self {
            PathStyle::Posix => posix::sanitize(name),
            PathStyle::Windows => windows::sanitize(name),
        }
    }

    fn separator(self) -> char {
        match self {
            PathStyle::Posix => '/',
            PathStyle::Windows => '\\',
        }
    }
}

/// Which codec's mode-sanitization rule applies (spec §4.4 step 2):
/// this tracks tar-vs-zip, *not* the POSIX/Windows filename-sanitizer
/// choice — a Windows-style tar reader still masks to the low 9
/// permission bits, and a POSIX-style zip reader still only clears
/// setuid/setgid/sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Tar,
    Zip,
}

/// Masks `mode` to the low 9 permission bits for tar, or clears just
/// setuid/setgid/sticky while preserving everything else (including
/// the directory bit) for zip (spec §8 test vector 5).
pub fn sanitize_mode(mode: u32, kind: ModeKind) -> u32 {
    match kind {
        ModeKind::Tar => mode & mode_bits::PERMISSION_BITS,
        ModeKind::Zip => mode & !(mode_bits::SETUID | mode_bits::SETGID | mode_bits::STICKY),
    }
}

/// Rewrites `name` with the lexical sanitizer matching `style`.
pub fn sanitize_filename(name: &str, style: PathStyle) -> String {
    style.sanitize(name)
}

/// True if any component of `name` looks like a DOS 8.3 short name.
pub fn is_short_filename(name: &str) -> bool {
    path::has_short_filename(name)
}

/// True if `entry_type` should be dropped outright by
/// `SKIP_SPECIAL_FILES` using the host decoder's own type tag (tar
/// ordering: spec §4.4 step 1).
pub fn is_special_by_type(entry_type: EntryType) -> bool {
    !entry_type.is_ordinary()
}

/// True if `mode` bits look like a non-regular, non-directory,
/// non-symlink unix file — the fs-mode-based test the zip wrapper
/// substitutes for a first-class type tag (spec §4.4 step 1, zip
/// ordering note).
pub fn is_special_by_unix_mode(mode: u32) -> bool {
    const S_IFMT: u32 = 0o170000;
    const S_IFREG: u32 = 0o100000;
    const S_IFDIR: u32 = 0o040000;
    const S_IFLNK: u32 = 0o120000;
    match mode & S_IFMT {
        0 => false, // no type bits present: treat as ordinary (DOS-origin entry)
        S_IFREG | S_IFDIR | S_IFLNK => false,
        _ => true,
    }
}

/// Drops every extended attribute and retains only allow-listed
/// extension-record keys (spec §4.4 step 6).
pub fn filter_extensions(extensions: HashMap<String, String>, drop_xattrs: bool) -> HashMap<String, String> {
    if !drop_xattrs {
        return extensions;
    }
    extensions
        .into_iter()
        .filter(|(k, _)| XATTR_EXTENSION_ALLOWLIST.contains(&k.as_str()))
        .collect()
}

/// The append-only set of symlink paths a single reader has emitted so
/// far in the current scan (spec §3, "Filter state").
#[derive(Debug, Default)]
pub struct SymlinkSet {
    seen: HashSet<String>,
}

impl SymlinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the comparison key for `name` under the active mode: a
    /// single trailing separator is trimmed, and the key is
    /// case-folded when `PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL` is
    /// set (spec §4.4 step 5a).
    pub fn key_for(name: &str, style: PathStyle, mode: SecurityMode) -> String {
        let sep = style.separator();
        let trimmed = name.strip_suffix(sep).unwrap_or(name);
        if mode.contains(SecurityMode::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL) {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }

    /// Walks every prefix `c[1]/../c[i]` of `key` and returns true if
    /// any of them was previously recorded as a symlink (spec §4.4 step
    /// 5c). This, not a single full-path lookup, is what catches a
    /// file entry nested *underneath* an attacker-controlled symlink.
    pub fn blocks(&self, key: &str, style: PathStyle) -> bool {
        let sep = style.separator();
        if key.is_empty() {
            return false;
        }
        let mut prefix_end = 0;
        for (i, part) in key.split(sep).enumerate() {
            if i > 0 {
                prefix_end += sep.len_utf8();
            }
            prefix_end += part.len();
            if self.seen.contains(&key[..prefix_end]) {
                return true;
            }
        }
        false
    }

    /// Records `key` as a symlink path once it has cleared the
    /// traversal check (spec §4.4 step 5d).
    pub fn record(&mut self, key: String) {
        self.seen.insert(key);
    }
}

/// Runs the symlink-traversal check/record step (spec §4.4 step 5) and
/// reports whether the entry should be dropped.
fn check_symlink_traversal(
    mode: SecurityMode,
    style: PathStyle,
    symlinks: &mut SymlinkSet,
    name: &str,
    linkname: &str,
) -> bool {
    if !mode.contains(SecurityMode::PREVENT_SYMLINK_TRAVERSAL) {
        return false;
    }
    let key = SymlinkSet::key_for(name, style, mode);
    if symlinks.blocks(&key, style) {
        debug!("dropping {name}: nested under a previously-seen symlink");
        return true;
    }
    if !linkname.is_empty() {
        trace!("recording {key} as a symlink traversal root");
        symlinks.record(key);
    }
    false
}

fn finish(raw: RawEntry, mode: SecurityMode) -> SanitizedEntry {
    let drop_xattrs = mode.contains(SecurityMode::DROP_XATTRS);
    SanitizedEntry {
        name: raw.name,
        linkname: raw.linkname,
        entry_type: raw.entry_type.into(),
        mode: raw.mode,
        extensions: filter_extensions(raw.extensions, drop_xattrs),
        xattrs: if drop_xattrs { HashMap::new() } else { raw.xattrs },
    }
}

/// Composes the pipeline in tar's ordering: type filter first, then
/// mode, filename, short-filename, symlink, and xattr steps, in that
/// order (spec §4.4).
pub fn filter_tar_entry(
    mode: SecurityMode,
    style: PathStyle,
    symlinks: &mut SymlinkSet,
    mut raw: RawEntry,
) -> Option<SanitizedEntry> {
    if mode.contains(SecurityMode::SKIP_SPECIAL_FILES) && is_special_by_type(raw.entry_type) {
        debug!("dropping {}: special file type {:?}", raw.name, raw.entry_type);
        return None;
    }
    if mode.contains(SecurityMode::SANITIZE_FILE_MODE) {
        raw.mode = sanitize_mode(raw.mode, ModeKind::Tar);
    }
    if mode.contains(SecurityMode::SANITIZE_FILENAMES) {
        raw.name = sanitize_filename(&raw.name, style);
    }
    if mode.contains(SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES) && is_short_filename(&raw.name) {
        debug!("dropping {}: looks like a short filename", raw.name);
        return None;
    }
    if check_symlink_traversal(mode, style, symlinks, &raw.name, &raw.linkname) {
        return None;
    }
    Some(finish(raw, mode))
}

/// Composes the pipeline in zip's ordering: mode and filename steps
/// first, then the fs-mode-based type filter (using the entry's
/// *original*, pre-sanitization unix mode bits), then short-filename,
/// symlink, and xattr steps (spec §4.4 step 1's codec-ordering note).
pub fn filter_zip_entry(
    mode: SecurityMode,
    style: PathStyle,
    symlinks: &mut SymlinkSet,
    mut raw: RawEntry,
    original_unix_mode: u32,
) -> Option<SanitizedEntry> {
    if mode.contains(SecurityMode::SANITIZE_FILE_MODE) {
        raw.mode = sanitize_mode(raw.mode, ModeKind::Zip);
    }
    if mode.contains(SecurityMode::SANITIZE_FILENAMES) {
        raw.name = sanitize_filename(&raw.name, style);
    }
    if mode.contains(SecurityMode::SKIP_SPECIAL_FILES) && is_special_by_unix_mode(original_unix_mode) {
        debug!("dropping {}: unix mode {:#o} looks like a special file", raw.name, original_unix_mode);
        return None;
    }
    if mode.contains(SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES) && is_short_filename(&raw.name) {
        debug!("dropping {}: looks like a short filename", raw.name);
        return None;
    }
    if check_symlink_traversal(mode, style, symlinks, &raw.name, &raw.linkname) {
        return None;
    }
    Some(finish(raw, mode))
}
