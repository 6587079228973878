//! POSIX-flavored path sanitization (spec §4.1).

use super::clean_rooted;

/// Sanitizes `input` for extraction under a POSIX base directory.
///
/// 1. Every backslash is treated as a forward slash (archives authored
///    on Windows commonly use `\` as a separator; POSIX treats `\` as
///    an ordinary filename character, so without this step a hostile
///    entry could hide a traversal inside what POSIX would otherwise
///    see as a single opaque component).
/// 2. The path is rooted (`/` prepended), lexically cleaned, and the
///    leading `/` stripped back off. Rooting first means any `..` the
///    cleaner encounters can only cancel a component that was
///    synthesized by the rooting, never escape above it.
/// 3. A trailing separator in the input is preserved on the output, so
///    directory entries remain distinguishable from files of the same
///    name after sanitization.
pub fn sanitize(input: &str) -> String {
    let slashed = input.replace('\\', "/");
    let rooted = format!("/{slashed}");
    let cleaned = clean_rooted(&rooted, '/');
    let mut result = cleaned.strip_prefix('/').unwrap_or(&cleaned).to_string();

    if (input.ends_with('/') || input.ends_with('\\')) && !result.is_empty() {
        result.push('/');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/some/thing", "some/thing")]
    #[case("C:\\some\\thing", "C:/some/thing")]
    #[case("\\\\FILESHARE\\stuff\\thing", "FILESHARE/stuff/thing")]
    #[case("\\\\.\\C:\\some\\path", "C:/some/path")]
    #[case("../../some/thing", "some/thing")]
    #[case("some/path/", "some/path/")]
    #[case("something.txt:alternate", "something.txt:alternate")]
    fn matches_spec_vectors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[test]
    fn never_absolute() {
        assert!(!sanitize("/etc/passwd").starts_with('/'));
        assert!(!sanitize("//etc/passwd").starts_with('/'));
    }

    #[test]
    fn never_contains_dotdot() {
        for input in [
            "../../../etc/passwd",
            "a/../../b",
            "a/b/../../../../c",
            "....//....//etc/passwd",
        ] {
            assert!(!sanitize(input).split('/').any(|c| c == ".."));
        }
    }

    #[test]
    fn idempotent() {
        for input in ["/some/thing", "a/b/../c/", "../../x", "a//b///c"] {
            let once = sanitize(input);
            let twice = sanitize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn trailing_slash_preserved_only_when_nonempty() {
        assert_eq!(sanitize("/"), "");
        assert_eq!(sanitize("./"), "");
        assert_eq!(sanitize("a/"), "a/");
    }
}
