//! End-to-end scenarios built over real `tar`/`zip` archive bytes,
//! covering the cases the unit tests in `src/` don't already exercise
//! at the pipeline level.

use std::io::{Cursor, Read, Write};

use archguard::tar::Reader as TarReader;
use archguard::zip::Reader as ZipReader;
use archguard::{PathStyle, SecurityMode};

fn build_tar(entries: &[(&str, ::tar::EntryType, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut builder = ::tar::Builder::new(Vec::new());
    for (name, ty, link, data) in entries {
        let mut header = ::tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_entry_type(*ty);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        if let Some(link) = link {
            header.set_link_name(link).unwrap();
        }
        builder.append(&header, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn build_zip(entries: &[(&str, u32, &[u8])]) -> Vec<u8> {
    let mut writer = ::zip::write::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, unix_mode, data) in entries {
        let options = ::zip::write::SimpleFileOptions::default().unix_permissions(*unix_mode);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn short_windows_filenames_are_dropped_from_a_tar_stream() {
    let bytes = build_tar(&[
        ("3D Objects/file.txt", ::tar::EntryType::Regular, None, b"a"),
        ("Androi~2/file.txt", ::tar::EntryType::Regular, None, b"b"),
        ("FOOOOO~1.JPG", ::tar::EntryType::Regular, None, b"c"),
    ]);

    let mut reader = TarReader::with_style(Cursor::new(bytes), PathStyle::Posix);
    reader.set_security_mode(SecurityMode::SKIP_WINDOWS_SHORT_FILENAMES);

    let names: Vec<String> = reader
        .entries()
        .unwrap()
        .map(|e| e.unwrap().metadata().name.clone())
        .collect();
    assert_eq!(names, vec!["3D Objects/file.txt"]);
}

#[test]
fn maximum_mode_combines_every_filter_over_a_tar_stream() {
    let bytes = build_tar(&[
        ("linktoroot", ::tar::EntryType::Symlink, Some("/"), b""),
        (
            "linktoroot/escape.txt",
            ::tar::EntryType::Regular,
            None,
            b"should be dropped",
        ),
        ("dev/null", ::tar::EntryType::Char, None, b""),
        ("../../etc/passwd", ::tar::EntryType::Regular, None, b"root:x:0:0"),
        ("normal/file.txt", ::tar::EntryType::Regular, None, b"fine"),
    ]);

    let mut reader = TarReader::with_style(Cursor::new(bytes), PathStyle::Posix);
    reader.set_security_mode(SecurityMode::maximum());

    let mut names = Vec::new();
    for entry in reader.entries().unwrap() {
        let entry = entry.unwrap();
        names.push(entry.metadata().name.clone());
    }
    assert_eq!(names, vec!["linktoroot", "etc/passwd", "normal/file.txt"]);
}

#[test]
fn io_errors_convert_into_archguard_error_transparently() {
    let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
    let err: archguard::Error = io_err.into();
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn zip_traversal_and_absolute_paths_are_sanitized_without_mutating_survivors() {
    const S_IFREG: u32 = 0o100000;
    let bytes = build_zip(&[
        ("../traverse/a.txt", S_IFREG | 0o644, b"a"),
        ("/absolute/b.txt", S_IFREG | 0o644, b"b"),
        ("normal/c.txt", S_IFREG | 0o644, b"c"),
    ]);

    let mut reader = ZipReader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
    reader.set_security_mode(SecurityMode::SANITIZE_FILENAMES).unwrap();

    let names: Vec<&str> = reader.entries().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["traverse/a.txt", "absolute/b.txt", "normal/c.txt"]);

    let mut first = reader.open_by_index(0).unwrap();
    let mut contents = String::new();
    first.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "a");
}

#[test]
fn zip_special_files_are_dropped_by_unix_mode_after_filename_sanitization() {
    const S_IFREG: u32 = 0o100000;
    const S_IFIFO: u32 = 0o010000;
    let bytes = build_zip(&[
        ("../pipes/data", S_IFIFO | 0o644, b""),
        ("normal/file.txt", S_IFREG | 0o644, b"fine"),
    ]);

    let mut reader = ZipReader::with_style(Cursor::new(bytes), PathStyle::Posix).unwrap();
    reader
        .set_security_mode(SecurityMode::SKIP_SPECIAL_FILES | SecurityMode::SANITIZE_FILENAMES)
        .unwrap();

    let names: Vec<&str> = reader.entries().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["normal/file.txt"]);
}
