//! Windows/NTFS-flavored path sanitization (spec §4.2).

use super::clean_rooted;

/// Sanitizes `input` for extraction under a Windows base directory.
///
/// Four passes, each neutralizing one class of attack:
///
/// 1. **Pre-substitution**: `:`, `/`, and `?` are all turned into `\`.
///    This collapses drive-letter prefixes (`C:`), Alternate Data
///    Stream markers (`file.txt:stream`), and the NT-prefix `?`
///    wildcard into ordinary path separators in one pass, rather than
///    special-casing each.
/// 2. **Double-clean**: rooting-then-stripping is applied *twice*.
///    The first pass can re-expose a leading separator run when the
///    input was something like `\\.\C:\x` (four backslashes' worth of
///    prefix collapse down to fewer than the cleaner expects in one
///    shot); the second pass finishes the job.
/// 3. **Reserved-name guard**: any path component whose name (ignoring
///    extension) collides with a Windows device name gets `-safe`
///    appended to the name, so `CON` becomes `CON-safe` and
///    `LPT1 .foo` becomes `LPT1 -safe.foo` (trailing spaces before the
///    extension are preserved verbatim; only their presence, not their
///    exact run length, participates in the reserved-name match).
/// 4. **Trailing-separator preservation**, identical to the POSIX
///    variant.
pub fn sanitize(input: &str) -> String {
    let substituted: String = input
        .chars()
        .map(|c| match c {
            ':' | '/' | '?' => '\\',
            other => other,
        })
        .collect();

    let pass1 = double_clean(&substituted);
    let guarded = guard_reserved_names(&pass1);

    let mut result = guarded;
    if (input.ends_with('/') || input.ends_with('\\')) && !result.is_empty() {
        result.push('\\');
    }
    result
}

fn double_clean(s: &str) -> String {
    let rooted = format!("\\{s}");
    let cleaned = clean_rooted(&rooted, '\\');
    let stripped = cleaned.trim_start_matches('\\');

    let rooted2 = format!("\\{stripped}");
    let cleaned2 = clean_rooted(&rooted2, '\\');
    cleaned2.trim_start_matches('\\').to_string()
}

/// Walks each backslash-separated component of an already-cleaned path
/// and appends `-safe` to any component whose base name collides with
/// a reserved Windows device name.
fn guard_reserved_names(path: &str) -> String {
    path.split('\\')
        .map(|component| {
            if component.is_empty() {
                return String::new();
            }
            let dot_idx = component.find('.');
            let (base, rest) = match dot_idx {
                Some(idx) => (&component[..idx], &component[idx..]),
                None => (component, ""),
            };
            if is_reserved_base(base.trim_end_matches(' ')) {
                format!("{base}-safe{rest}")
            } else {
                component.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\\")
}

/// Matches the Windows reserved device names, case-insensitively:
/// `CON`, `PRN`, `AUX`, `NUL`, `CONIN$`, `CONOUT$`, and `COM`/`LPT`
/// followed by a single ASCII digit 1-9 or one of the three Unicode
/// superscript digits (`¹`, `²`, `³`).
///
/// Deliberately does not look past the first `.` — `CON.txt.txt` is
/// not detected as reserved here, matching the source's own documented
/// gap (spec §9, second Open Question) rather than silently fixing it.
fn is_reserved_base(base: &str) -> bool {
    let upper = base.to_ascii_uppercase();
    if matches!(
        upper.as_str(),
        "CON" | "PRN" | "AUX" | "NUL" | "CONIN$" | "CONOUT$"
    ) {
        return true;
    }

    let mut chars = base.chars();
    let prefix: String = chars.by_ref().take(3).collect();
    let prefix = prefix.to_ascii_uppercase();
    if prefix != "COM" && prefix != "LPT" {
        return false;
    }

    let remainder: Vec<char> = chars.collect();
    match remainder.as_slice() {
        [c] if c.is_ascii_digit() && *c != '0' => true,
        [c] if matches!(c, '\u{00B9}' | '\u{00B2}' | '\u{00B3}') => true,
        _ => false,
    }
}
