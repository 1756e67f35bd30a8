//! Fixture trees and a fake autotester for integration tests.
//!
//! The fake autotester copies its query file to the report path, so each
//! query file holds the exact XML report it should produce.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable shell script that plays the autotester.
#[cfg(unix)]
pub fn fake_autotester(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("autotester");
    fs::write(&path, "#!/bin/sh\ncat \"$2\" > \"$3\"\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Create `root/name` holding a source and one query file per report.
pub fn leaf_fixture(root: &Path, name: &str, reports: &[(&str, String)]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("prog.simple"), "procedure main { x = 1; }").unwrap();
    for (query, xml) in reports {
        fs::write(dir.join(query), xml).unwrap();
    }
    dir
}

/// A query element with the given verdict markers inside.
pub fn query(id: &str, name: &str, body: &str) -> String {
    format!(r#"<query><id comment="{name}">{id}</id>{body}</query>"#)
}

pub fn passed(id: &str, name: &str) -> String {
    query(id, name, "<correct>1</correct><passed/>")
}

pub fn failed(id: &str, name: &str) -> String {
    query(id, name, "<correct>1</correct><failed/>")
}

/// Wrap queries in a report document.
pub fn report(queries: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<test_results>\n<queries>\n{}\n</queries>\n</test_results>\n",
        queries.join("\n")
    )
}
