use std::path::{Path, PathBuf};

/// Where each stage reads and writes its files under the data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<data>/<community>.csv`
    pub fn posts_csv(&self, community: &str) -> PathBuf {
        self.root.join(format!("{}.csv", community))
    }

    /// `<data>/<community>/`
    pub fn comments_dir(&self, community: &str) -> PathBuf {
        self.root.join(community)
    }

    pub fn comments_csv(&self, community: &str, title: &str) -> PathBuf {
        self.comments_dir(community).join(format!("{}.csv", title))
    }

    /// `<data>/<community>txt/`
    pub fn text_dir(&self, community: &str) -> PathBuf {
        self.root.join(format!("{}txt", community))
    }

    pub fn text_file(&self, community: &str, title: &str) -> PathBuf {
        self.text_dir(community).join(format!("{}.txt", title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = DataLayout::new("/data");
        assert_eq!(layout.posts_csv("politics"), PathBuf::from("/data/politics.csv"));
        assert_eq!(
            layout.comments_csv("politics", "A title"),
            PathBuf::from("/data/politics/A title.csv")
        );
        assert_eq!(
            layout.text_file("politics", "A title"),
            PathBuf::from("/data/politicstxt/A title.txt")
        );
    }
}
