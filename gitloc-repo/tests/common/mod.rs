//! Shared fixtures for gitloc-repo integration tests

#![allow(dead_code)]

use gitloc_repo::test_utils::{build_zip, metadata_json, ZipItem};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("gitloc_repo=debug,info")
            .with_test_writer()
            .try_init();
    });
}

/// Zip archive shaped like a GitHub branch download: everything sits under
/// a `{repo}-{branch}/` root folder.
pub fn repo_archive(root: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let root_dir = format!("{}/", root);
    let paths: Vec<String> = files
        .iter()
        .map(|(path, _)| format!("{}/{}", root, path))
        .collect();

    let mut items = vec![ZipItem::dir(&root_dir)];
    items.extend(
        paths
            .iter()
            .zip(files)
            .map(|(path, (_, content))| ZipItem::file(path, content)),
    );
    build_zip(&items)
}

pub fn metadata(default_branch: &str, size: u64) -> Vec<u8> {
    metadata_json("r", default_branch, size)
}
