//! The entry-header contract shared by both codec wrappers (spec §3).

use std::collections::HashMap;

/// The external entry-type contract: "one of regular, directory,
/// symbolic link, hard link, char device, block device, fifo, other".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Regular,
    Directory,
    Symlink,
    HardLink,
    CharDevice,
    BlockDevice,
    Fifo,
    Other,
}

impl EntryType {
    /// The set kept by `SKIP_SPECIAL_FILES` (spec §4.4 step 1).
    pub fn is_ordinary(self) -> bool {
        matches!(
            self,
            EntryType::Regular | EntryType::Directory | EntryType::Symlink
        )
    }
}

/// Extension-record keys retained when `DROP_XATTRS` strips everything
/// else (spec §4.4 step 6).
pub const XATTR_EXTENSION_ALLOWLIST: [&str; 3] = ["ctime", "mtime", "atime"];

/// A host-decoder entry header, read by a codec wrapper before it is
/// handed to the filter pipeline. Borrowed rather than owned: the
/// wrapper builds one of these fresh from whatever the `tar`/`zip`
/// crate's own header type exposes, for a single pipeline call.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub linkname: String,
    pub entry_type: EntryType,
    pub mode: u32,
    pub extensions: HashMap<String, String>,
    pub xattrs: HashMap<String, String>,
}

/// The mutated, filter-produced entry a reader yields to its caller.
///
/// Owns every field so the "original must not be observable through
/// any reference retained by the caller" invariant (spec §3) is
/// structural rather than a convention callers must respect.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SanitizedEntry {
    pub name: String,
    pub linkname: String,
    pub entry_type: EntryTypeSerde,
    pub mode: u32,
    pub extensions: HashMap<String, String>,
    pub xattrs: HashMap<String, String>,
}

// `EntryType` is duplicated behind a serde-friendly alias rather than
// deriving Serialize directly on the original, so the `serde` feature
// stays entirely optional without touching the type used on the hot
// path elsewhere in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryTypeSerde {
    Regular,
    Directory,
    Symlink,
    HardLink,
    CharDevice,
    BlockDevice,
    Fifo,
    Other,
}

impl From<EntryType> for EntryTypeSerde {
    fn from(value: EntryType) -> Self {
        match value {
            EntryType::Regular => EntryTypeSerde::Regular,
            EntryType::Directory => EntryTypeSerde::Directory,
            EntryType::Symlink => EntryTypeSerde::Symlink,
            EntryType::HardLink => EntryTypeSerde::HardLink,
            EntryType::CharDevice => EntryTypeSerde::CharDevice,
            EntryType::BlockDevice => EntryTypeSerde::BlockDevice,
            EntryType::Fifo => EntryTypeSerde::Fifo,
            EntryType::Other => EntryTypeSerde::Other,
        }
    }
}
