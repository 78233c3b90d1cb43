use leanscope_core::{CoreError, SentimentError, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One exported line. `row` is the comment CSV row it came from, or `None`
/// for the placeholder written for posts without comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestLine {
    pub row: Option<usize>,
    pub text: String,
}

/// Maps every exported text file (by title) to the lines it contains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub files: BTreeMap<String, Vec<ManifestLine>>,
}

impl ExportManifest {
    pub fn insert(&mut self, title: impl Into<String>, lines: Vec<ManifestLine>) {
        self.files.insert(title.into(), lines);
    }

    pub fn lines(&self, title: &str) -> Option<&[ManifestLine]> {
        self.files.get(title).map(Vec::as_slice)
    }

    pub fn save(&self, dir: &Path) -> Result<(), CoreError> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, CoreError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Err(SentimentError::ManifestMissing {
                dir: dir.to_path_buf(),
            }
            .into());
        }
        let json = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}
