use crate::manifest::{ExportManifest, ManifestLine};
use crate::results::{read_results, ResultLine};
use corpus_store::{DataLayout, Table};
use leanscope_core::{
    CoreError, ErrorRecovery, ErrorReporter, RecoveryStrategy, SentimentError, StoreError,
};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const POSITIVE_COLUMN: &str = "positiveSentiment";
pub const NEGATIVE_COLUMN: &str = "negativeSentiment";

/// How tool output lines are matched to comment rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachMode {
    /// Through the export manifest, by echoed text.
    #[default]
    Keyed,
    /// By line order, truncating the comments when the tool returned fewer lines.
    Positional,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub result_suffix: String,
    pub mode: AttachMode,
    pub keep_text: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            result_suffix: leanscope_core::DEFAULT_RESULT_SUFFIX.to_string(),
            mode: AttachMode::Keyed,
            keep_text: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub files: usize,
    pub skipped: usize,
    pub unmatched_rows: usize,
    pub truncated_files: usize,
    pub text_dir_removed: bool,
}

/// Sentiment columns for one comment table.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub unmatched: usize,
}

/// Matches results to rows through the manifest. Identical texts are
/// consumed in order.
pub fn attach_keyed(rows: usize, lines: &[ManifestLine], results: &[ResultLine]) -> Attachment {
    let mut by_text: HashMap<&str, VecDeque<&ResultLine>> = HashMap::new();
    for result in results {
        by_text
            .entry(result.text.trim())
            .or_default()
            .push_back(result);
    }

    let mut positive = vec![String::new(); rows];
    let mut negative = vec![String::new(); rows];
    let mut matched = 0;

    for line in lines {
        let Some(row) = line.row.filter(|row| *row < rows) else {
            continue;
        };
        if let Some(result) = by_text
            .get_mut(line.text.trim())
            .and_then(VecDeque::pop_front)
        {
            positive[row] = result.pair.positive.to_string();
            negative[row] = result.pair.negative.to_string();
            matched += 1;
        }
    }

    Attachment {
        positive,
        negative,
        unmatched: rows - matched,
    }
}

/// Assigns results to rows in order. Returns the attachment and the row
/// count the table must be cut to.
pub fn attach_positional(rows: usize, results: &[ResultLine]) -> (Attachment, usize) {
    let kept = rows.min(results.len());
    let attachment = Attachment {
        positive: results[..kept]
            .iter()
            .map(|r| r.pair.positive.to_string())
            .collect(),
        negative: results[..kept]
            .iter()
            .map(|r| r.pair.negative.to_string())
            .collect(),
        unmatched: 0,
    };
    (attachment, kept)
}

fn apply(table: &mut Table, attachment: Attachment) -> Result<(), StoreError> {
    table.set_column(POSITIVE_COLUMN, attachment.positive)?;
    table.set_column(NEGATIVE_COLUMN, attachment.negative)
}

/// Swaps the tool's result file in for the exported text file.
fn take_result_file(dir: &Path, title: &str, suffix: &str) -> Result<std::path::PathBuf, CoreError> {
    let result_path = dir.join(format!("{}{}", title, suffix));
    let text_path = dir.join(format!("{}.txt", title));
    if !result_path.exists() {
        return Err(SentimentError::MissingResult {
            stem: title.to_string(),
            expected: result_path,
        }
        .into());
    }

    if text_path.exists() {
        fs::remove_file(&text_path).map_err(|e| StoreError::io(&text_path, e))?;
    }
    fs::rename(&result_path, &text_path).map_err(|e| StoreError::io(&result_path, e))?;
    Ok(text_path)
}

fn import_file(
    layout: &DataLayout,
    community: &str,
    title: &str,
    manifest_lines: Option<&[ManifestLine]>,
    options: &ImportOptions,
    summary: &mut ImportSummary,
) -> Result<(), CoreError> {
    let text_dir = layout.text_dir(community);
    let text_path = take_result_file(&text_dir, title, &options.result_suffix)?;
    let results = read_results(&text_path)?;

    let csv_path = layout.comments_csv(community, title);
    let mut table = Table::read(&csv_path)?;

    match (options.mode, manifest_lines) {
        (AttachMode::Keyed, Some(lines)) => {
            let attachment = attach_keyed(table.len(), lines, &results);
            if attachment.unmatched > 0 {
                warn!(
                    "{} of {} comments in {} have no sentiment result",
                    attachment.unmatched,
                    table.len(),
                    csv_path.display()
                );
                summary.unmatched_rows += attachment.unmatched;
            }
            apply(&mut table, attachment)?;
        }
        (AttachMode::Keyed, None) => {
            return Err(SentimentError::ManifestMissing { dir: text_dir }.into());
        }
        (AttachMode::Positional, _) => {
            let (attachment, kept) = attach_positional(table.len(), &results);
            if kept < table.len() {
                warn!("Tool returned fewer lines than comments, trimmed {}", csv_path.display());
                table.truncate(kept);
                summary.truncated_files += 1;
            }
            apply(&mut table, attachment)?;
        }
    }

    table.write(&csv_path)?;
    debug!("Attached {} sentiment results to {}", results.len(), csv_path.display());
    Ok(())
}

/// Reads the tool's results for `community` back into its comment CSVs.
pub fn import_community(
    layout: &DataLayout,
    community: &str,
    options: &ImportOptions,
) -> Result<ImportSummary, CoreError> {
    let text_dir = layout.text_dir(community);
    if !text_dir.is_dir() {
        return Err(SentimentError::ExportMissing { dir: text_dir }.into());
    }

    let manifest = match ExportManifest::load(&text_dir) {
        Ok(manifest) => Some(manifest),
        Err(e) if options.mode == AttachMode::Positional => {
            debug!("Positional import without manifest: {}", e);
            None
        }
        Err(e) => return Err(e),
    };

    let titles: Vec<String> = match &manifest {
        Some(manifest) => manifest.files.keys().cloned().collect(),
        None => result_titles(&text_dir, &options.result_suffix)?,
    };

    let mut summary = ImportSummary::default();
    for title in &titles {
        let lines = manifest.as_ref().and_then(|m| m.lines(title));
        match import_file(layout, community, title, lines, options, &mut summary) {
            Ok(()) => summary.files += 1,
            Err(e) => match ErrorRecovery::determine_strategy(&e, Duration::ZERO) {
                RecoveryStrategy::Skip => {
                    ErrorReporter::new().report_warning(&e);
                    warn!("Skipping sentiment for '{}'", title);
                    summary.skipped += 1;
                }
                _ => return Err(e),
            },
        }
    }

    if options.keep_text {
        info!("Keeping {}", text_dir.display());
    } else if summary.skipped > 0 {
        warn!(
            "{} files were not imported, keeping {}",
            summary.skipped,
            text_dir.display()
        );
    } else {
        fs::remove_dir_all(&text_dir).map_err(|e| StoreError::io(&text_dir, e))?;
        summary.text_dir_removed = true;
    }

    info!(
        "Imported sentiment for {} of {} posts in r/{}",
        summary.files,
        titles.len(),
        community
    );
    Ok(summary)
}

/// Titles of the result files in `dir`, for imports without a manifest.
fn result_titles(dir: &Path, suffix: &str) -> Result<Vec<String>, CoreError> {
    let mut titles: Vec<String> = fs::read_dir(dir)
        .map_err(|e| StoreError::io(dir, e))?
        .filter_map(Result::ok)
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| name.strip_suffix(suffix).map(str::to_string))
        .collect();
    titles.sort();
    Ok(titles)
}
