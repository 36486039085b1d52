//! Runs the `fb2-info` binary against archives built on the fly.

use std::{fs::File, io::Write, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;
use zip::{write::FileOptions, ZipWriter};

fn fb2_info() -> Command {
    Command::cargo_bin("fb2-info").unwrap()
}

fn book(title_info: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
  <description><title-info>{title_info}</title-info></description>
  <body><p>Some <i>broken</p> markup</body>
</FictionBook>"#
    )
}

fn write_archive(path: &Path, entries: &[(&str, String)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());

    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }

    writer.finish().unwrap();
}

#[test]
fn lists_books_of_a_directory() {
    let dir = tempdir().unwrap();
    write_archive(
        &dir.path().join("library.zip"),
        &[
            (
                "foundation.fb2",
                book(
                    r#"<genre>sf</genre><genre>history</genre>
                    <author><first-name>Jane</first-name><last-name>Doe</last-name></author>
                    <book-title>T</book-title>
                    <sequence name="Foundation" number="3"/>"#,
                ),
            ),
            ("readme.txt", String::from("skip me")),
        ],
    );

    fb2_info()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing file: "))
        .stdout(predicate::str::contains("library.zip\n"))
        .stdout(predicate::str::contains(
            "  foundation.fb2: Doe Jane / Foundation-3 / T, genres: sf, history\n",
        ))
        .stdout(predicate::str::contains("readme.txt").not());
}

#[test]
fn no_paths_is_a_no_op() {
    fb2_info().assert().success().stdout("");
}

#[test]
fn fails_and_dumps_unparsable_book() {
    let dir = tempdir().unwrap();
    let dumps = tempdir().unwrap();
    let archive = dir.path().join("broken.zip");
    let broken = book("<author><nickname>Nick</nickname></author>");
    write_archive(&archive, &[("broken.fb2", broken.clone())]);

    fb2_info()
        .arg(&archive)
        .env("TMPDIR", dumps.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("While parsing "))
        .stderr(predicate::str::contains("book-title"));

    assert_eq!(
        std::fs::read_to_string(dumps.path().join("broken.fb2")).unwrap(),
        broken
    );
}

#[test]
fn fails_on_invalid_archive() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("fake.zip");
    std::fs::write(&archive, "not a zip").unwrap();

    fb2_info()
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open archive"));
}
