//! Path-based classification of archive entries
//!
//! The tables are plain data; extend them here without touching the analyzer.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Directory names whose contents are never counted: dependency caches,
/// version-control metadata and build output.
pub static EXCLUDED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "node_modules",
        "bower_components",
        "jspm_packages",
        "vendor",
        ".git",
        ".svn",
        ".hg",
        "dist",
        "build",
        "out",
        "target",
        "__pycache__",
        ".venv",
        "venv",
        ".tox",
        ".gradle",
        ".next",
        ".nuxt",
        ".cache",
        "coverage",
    ]
    .into_iter()
    .collect()
});

/// File name fragments marking minified or bundled output
pub static MINIFIED_MARKERS: &[&str] = &[".min.", "-min.", ".bundle.", ".chunk.", ".packed."];

/// Extensions of formats that are not source text
pub static BINARY_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // images
        "png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "webp", "ico", "svg", "psd", "heic",
        // audio
        "mp3", "wav", "ogg", "flac", "aac", "m4a",
        // video
        "mp4", "mov", "avi", "mkv", "webm", "wmv", "flv",
        // archives
        "zip", "gz", "tgz", "tar", "rar", "7z", "bz2", "xz", "zst",
        // documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods",
        // executables and objects
        "exe", "dll", "so", "dylib", "o", "a", "lib", "obj", "bin", "wasm", "pdb",
        "jar", "war", "ear", "class", "pyc", "pyd", "pyo",
        // fonts
        "ttf", "otf", "woff", "woff2", "eot",
        // databases and caches
        "db", "sqlite", "sqlite3", "mdb", "dat", "cache", "idx", "pack",
        // lockfiles and checksums
        "lock", "sum",
    ]
    .into_iter()
    .collect()
});

/// Lowercased extension of the entry's file name, if it has one
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() && !file_name[1..].contains('.') {
        // dotfile such as `.gitignore`
        return None;
    }
    Some(extension.to_lowercase())
}

/// True when the entry should be skipped without reading it
pub fn is_excluded_path(path: &str) -> bool {
    let lowered = path.to_lowercase();

    if lowered
        .split('/')
        .any(|segment| EXCLUDED_DIRS.contains(segment))
    {
        return true;
    }

    let file_name = lowered.rsplit('/').next().unwrap_or(&lowered);
    if MINIFIED_MARKERS
        .iter()
        .any(|marker| file_name.contains(marker))
    {
        return true;
    }

    extension_of(&lowered)
        .map(|extension| BINARY_EXTENSIONS.contains(extension.as_str()))
        .unwrap_or(false)
}
