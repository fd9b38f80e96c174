//! Plain-text document source backed by a directory tree.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::traits::DocumentSource;
use crate::types::Document;

const EXTENSIONS: &[&str] = &["txt", "md"];

pub struct DirectorySource {
    root: PathBuf,
    limit: Option<usize>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), limit: None }
    }

    /// Only read the first `limit` files (in sorted path order).
    pub fn limited(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn category_for(&self, file_path: &Path) -> String {
        let relative_path = file_path.strip_prefix(&self.root).unwrap_or(file_path);
        match relative_path.parent().and_then(|p| p.to_str()) {
            Some(parent) if !parent.is_empty() => parent.to_string(),
            _ => "misc".to_string(),
        }
    }

    fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| EXTENSIONS.contains(&ext)))
            .collect();
        files.sort();
        if let Some(limit) = self.limit {
            files.truncate(limit);
        }
        files
    }
}

impl DocumentSource for DirectorySource {
    fn documents(&self) -> Result<Vec<Document>> {
        let files = self.list_files();
        let mut documents = Vec::with_capacity(files.len());
        for file_path in &files {
            debug!(path = %file_path.display(), "reading document");
            let text = self.read_file_content(file_path)?;
            let file_name = file_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
            documents.push(
                Document::new(text)
                    .with_meta("file_name", file_name)
                    .with_meta("path", file_path.to_string_lossy())
                    .with_meta("category", self.category_for(file_path)),
            );
        }
        info!(root = %self.root.display(), count = documents.len(), "loaded documents");
        Ok(documents)
    }
}
