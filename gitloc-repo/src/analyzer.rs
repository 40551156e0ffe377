//! Archive analyzer: classifies every entry of a zip payload and counts lines

use crate::filter::{extension_of, is_excluded_path};
use crate::languages::language_for_extension;
use gitloc_core::{AnalysisResult, ErrorContext, GitlocError, GitlocResult};
use std::io::{Cursor, Read};
use tracing::{debug, info, warn};

/// Why an entry was not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Denylisted directory, minified marker or binary extension
    ExcludedPath,
    /// Content is not valid UTF-8
    DecodeFailed,
    /// More than 1% NUL characters
    BinaryContent,
    /// The archive could not produce the entry's bytes
    UnreadableEntry,
}

/// Outcome for a single non-directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Counted { language: &'static str, lines: u64 },
    Skipped(SkipReason),
}

/// Number of `'\n'`-delimited segments. A trailing newline adds an empty
/// segment and empty text is one segment.
pub fn count_lines(text: &str) -> u64 {
    text.split('\n').count() as u64
}

/// True when NUL characters make up more than 1% of the text
pub fn is_binary_content(text: &str) -> bool {
    let nul_count = text.bytes().filter(|byte| *byte == 0).count();
    nul_count * 100 > text.len()
}

/// Classify one file given its path and raw bytes
pub fn classify_entry(path: &str, content: &[u8]) -> EntryOutcome {
    if is_excluded_path(path) {
        return EntryOutcome::Skipped(SkipReason::ExcludedPath);
    }

    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        Err(e) => {
            warn!("Could not read file {} as text, skipping: {}", path, e);
            return EntryOutcome::Skipped(SkipReason::DecodeFailed);
        }
    };

    if is_binary_content(text) {
        return EntryOutcome::Skipped(SkipReason::BinaryContent);
    }

    let extension = extension_of(path);
    EntryOutcome::Counted {
        language: language_for_extension(extension.as_deref()),
        lines: count_lines(text),
    }
}

/// Running totals while walking an archive
#[derive(Debug, Default)]
struct Tally {
    result: AnalysisResult,
}

impl Tally {
    fn record(&mut self, path: &str, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Counted { language, lines } => {
                self.result.total_lines += lines;
                self.result.file_count += 1;
                *self
                    .result
                    .language_stats
                    .entry(language.to_string())
                    .or_insert(0) += lines;
            }
            EntryOutcome::Skipped(reason) => {
                debug!(path = %path, reason = ?reason, "Skipping entry");
                self.result.skipped_files += 1;
            }
        }
    }
}

/// Decode `payload` as a zip archive and aggregate line counts.
///
/// Only a payload that is not a readable archive fails; every per-entry
/// problem becomes a skip.
pub fn analyze(payload: &[u8]) -> GitlocResult<AnalysisResult> {
    let mut archive = zip::ZipArchive::new(Cursor::new(payload)).map_err(|e| {
        GitlocError::ArchiveDecode {
            message: format!("payload of {} bytes is not a valid zip archive: {}", payload.len(), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("archive_analyzer")
                .with_operation("analyze")
                .with_suggestion("The download may have returned an HTML error page"),
        }
    })?;

    let mut tally = Tally::default();

    for index in 0..archive.len() {
        // directories never count, even when their local header is unreadable
        if archive
            .name_for_index(index)
            .is_some_and(|name| name.ends_with('/'))
        {
            continue;
        }

        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not open archive entry #{}, skipping: {}", index, e);
                tally.record(
                    &format!("#{}", index),
                    EntryOutcome::Skipped(SkipReason::UnreadableEntry),
                );
                continue;
            }
        };

        if entry.is_dir() {
            continue;
        }

        let path = entry.name().to_string();
        if is_excluded_path(&path) {
            tally.record(&path, EntryOutcome::Skipped(SkipReason::ExcludedPath));
            continue;
        }

        let mut content = Vec::new();
        if let Err(e) = entry.read_to_end(&mut content) {
            warn!("Could not read file {} from archive, skipping: {}", path, e);
            tally.record(&path, EntryOutcome::Skipped(SkipReason::UnreadableEntry));
            continue;
        }

        let outcome = classify_entry(&path, &content);
        tally.record(&path, outcome);
    }

    info!(
        total_lines = tally.result.total_lines,
        file_count = tally.result.file_count,
        skipped_files = tally.result.skipped_files,
        "Analyzed archive"
    );

    Ok(tally.result)
}
