//! Lexical path sanitization.
//!
//! Every function in this module is pure: no filesystem access, no
//! symlink resolution, no dependence on the host OS's actual path
//! semantics. `posix::sanitize` and `windows::sanitize` each implement
//! one platform's notion of "make this archive-supplied path safe to
//! join under a base directory" per the algorithms in the design doc;
//! neither calls the other, and callers pick the variant that matches
//! the filesystem they're extracting onto (not the one the archive
//! claims to have been made on).

pub mod posix;
pub mod shortname;
pub mod windows;

pub use shortname::has_short_filename;

/// Collapses `.`/`..`/duplicate-separator components of a path that is
/// known to start with a single leading `sep`, using the stack-based
/// algorithm `path.Clean` uses for rooted paths: a `..` at the root is
/// simply dropped (there is nothing above the root to climb to), which
/// is exactly the property that keeps traversal from escaping once the
/// leading separator has been synthetically prepended by the caller.
pub(crate) fn clean_rooted(path: &str, sep: char) -> String {
    let mut out: Vec<&str> = Vec::new();
    for component in path.split(sep) {
        match component {
            "" | "." => continue,
            ".." => {
                out.pop();
            }
            c => out.push(c),
        }
    }
    let mut result = String::with_capacity(path.len());
    result.push(sep);
    result.push_str(&out.join(&sep.to_string()));
    result
}
