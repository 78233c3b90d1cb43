pub mod aggregate;
pub mod export;
pub mod import;
pub mod manifest;
pub mod results;

#[cfg(test)]
mod tests;

pub use aggregate::{acceptance, aggregate_community, comment_averages, AggregateSummary};
pub use export::{export_community, ExportSummary, EMPTY_PLACEHOLDER};
pub use import::{import_community, AttachMode, ImportOptions, ImportSummary};
pub use manifest::{ExportManifest, ManifestLine, MANIFEST_FILE};
pub use results::{parse_result_line, read_results, ResultLine};

use corpus_store::DataLayout;
use leanscope_core::CoreError;
use tracing::info;

/// Hands comment files to the external sentiment tool and folds its
/// ratings back into the corpus.
pub struct SentimentBridge {
    layout: DataLayout,
}

impl SentimentBridge {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn export(&self, community: &str) -> Result<ExportSummary, CoreError> {
        let summary = export_community(&self.layout, community)?;
        info!(
            "Run the sentiment tool on {} before importing",
            self.layout.text_dir(community).display()
        );
        Ok(summary)
    }

    pub fn import(&self, community: &str, options: &ImportOptions) -> Result<ImportSummary, CoreError> {
        import_community(&self.layout, community, options)
    }

    pub fn aggregate(&self, community: &str) -> Result<AggregateSummary, CoreError> {
        aggregate_community(&self.layout, community)
    }
}
