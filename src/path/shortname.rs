//! Windows 8.3 short-filename detection (spec §4.3).

/// Returns true if any component of `path` looks like a legacy DOS 8.3
/// short name (`FOOOOO~1.JPG`, `ANDROI~2`, ...): a tilde followed by
/// one or more ASCII digits, optionally followed by a dot. Separators
/// are normalized (backslash treated as forward slash) before
/// splitting into components, matching the other sanitizers' treatment
/// of `\` as a path separator regardless of host platform.
pub fn has_short_filename(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    normalized.split('/').any(component_is_short_name)
}

fn component_is_short_name(component: &str) -> bool {
    let bytes = component.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'~' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + 1 {
                return true;
            }
        }
        i += 1;
    }
    false
}
