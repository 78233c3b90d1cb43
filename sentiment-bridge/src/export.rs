use crate::manifest::{ExportManifest, ManifestLine};
use corpus_store::{DataLayout, Table};
use leanscope_core::{CoreError, StoreError};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Line written for a post without comments. Scores neutral in the tool.
pub const EMPTY_PLACEHOLDER: &str = "0";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    pub files: usize,
    pub lines: usize,
    pub empty_posts: usize,
    pub skipped: usize,
}

/// Lines to hand the tool for one comment table, with their source rows.
pub fn export_lines(table: &Table) -> Vec<ManifestLine> {
    let lines: Vec<ManifestLine> = table
        .first_column()
        .into_iter()
        .enumerate()
        .map(|(row, text)| ManifestLine {
            row: Some(row),
            text: text.replace(['\r', '\n'], " "),
        })
        .collect();

    if lines.is_empty() {
        return vec![ManifestLine {
            row: None,
            text: EMPTY_PLACEHOLDER.to_string(),
        }];
    }
    lines
}

fn write_lines(path: &Path, lines: &[ManifestLine]) -> Result<(), StoreError> {
    let mut contents = String::new();
    for line in lines {
        contents.push_str(&line.text);
        contents.push('\n');
    }
    fs::write(path, contents).map_err(|e| StoreError::io(path, e))
}

/// Dumps every comment CSV of `community` into its text folder and writes
/// the manifest next to them.
pub fn export_community(layout: &DataLayout, community: &str) -> Result<ExportSummary, CoreError> {
    let comments_dir = layout.comments_dir(community);
    if !comments_dir.is_dir() {
        return Err(StoreError::FileNotFound { path: comments_dir }.into());
    }

    let text_dir = layout.text_dir(community);
    fs::create_dir_all(&text_dir).map_err(|e| StoreError::io(&text_dir, e))?;

    let mut entries: Vec<_> = fs::read_dir(&comments_dir)
        .map_err(|e| StoreError::io(&comments_dir, e))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    entries.sort();

    let mut manifest = ExportManifest::default();
    let mut summary = ExportSummary::default();

    for path in entries {
        let Some(title) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!("Skipping file with unreadable name: {}", path.display());
            summary.skipped += 1;
            continue;
        };

        let table = match Table::read(&path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Could not read {}: {}, skipping", path.display(), e);
                summary.skipped += 1;
                continue;
            }
        };

        let lines = export_lines(&table);
        if table.is_empty() {
            summary.empty_posts += 1;
        }

        let text_path = layout.text_file(community, &title);
        if let Err(e) = write_lines(&text_path, &lines) {
            warn!("Could not write {}: {}, skipping", text_path.display(), e);
            summary.skipped += 1;
            continue;
        }

        debug!("Exported {} lines to {}", lines.len(), text_path.display());
        summary.files += 1;
        summary.lines += lines.len();
        manifest.insert(title, lines);
    }

    manifest.save(&text_dir)?;
    info!(
        "Exported {} comment files ({} lines) to {}",
        summary.files,
        summary.lines,
        text_dir.display()
    );
    Ok(summary)
}
