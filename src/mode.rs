use bitflags::bitflags;

bitflags! {
    /// Independently-toggleable extraction-safety policies.
    ///
    /// `Default` and `Maximum` are the two named presets; individual
    /// flags can otherwise be combined freely with the usual bitmask
    /// operators (`|`, `&`, `!`, `.contains`, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SecurityMode: u32 {
        /// Drop entries that are not regular file, directory, or symbolic link.
        const SKIP_SPECIAL_FILES = 0x01;
        /// Clear setuid/setgid/sticky/temporary/append/exclusive and other
        /// special mode bits; keep the low 9 permission bits for tar, strip
        /// the corresponding portable bits for zip.
        const SANITIZE_FILE_MODE = 0x02;
        /// Rewrite each entry's path with the lexical path sanitizer.
        const SANITIZE_FILENAMES = 0x04;
        /// Remove extended attributes; retain only the `ctime`/`mtime`/`atime`
        /// extension-record allow-list.
        const DROP_XATTRS = 0x08;
        /// Reject entries that would be extracted through a previously-seen
        /// symbolic link.
        const PREVENT_SYMLINK_TRAVERSAL = 0x10;
        /// When the symlink filter is active, compare path components
        /// case-insensitively. Inert without `PREVENT_SYMLINK_TRAVERSAL`.
        const PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL = 0x20;
        /// Drop entries whose path contains a component matching the 8.3
        /// short-filename pattern.
        const SKIP_WINDOWS_SHORT_FILENAMES = 0x40;
    }
}

impl SecurityMode {
    /// `SanitizeFilenames | PreventSymlinkTraversal` on every platform,
    /// plus whatever the host filesystem's semantics additionally demand.
    ///
    /// - Windows hosts fold in case-insensitive symlink comparison and the
    ///   8.3 short-filename filter, since NTFS is case-insensitive by
    ///   default and silently maintains short aliases for long names.
    /// - macOS hosts (HFS+/APFS default case-insensitive) fold in
    ///   case-insensitive symlink comparison only.
    pub fn default_for_platform() -> Self {
        let base = Self::SANITIZE_FILENAMES | Self::PREVENT_SYMLINK_TRAVERSAL;
        if cfg!(target_os = "windows") {
            base | Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL
                | Self::SKIP_WINDOWS_SHORT_FILENAMES
        } else if cfg!(target_os = "macos") {
            base | Self::PREVENT_CASE_INSENSITIVE_SYMLINK_TRAVERSAL
        } else {
            base
        }
    }

    /// The union of every defined flag.
    pub fn maximum() -> Self {
        Self::all()
    }
}

impl Default for SecurityMode {
    fn default() -> Self {
        Self::default_for_platform()
    }
}
