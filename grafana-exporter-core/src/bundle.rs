//! Generated artifact handling: a tabbed viewer model and the single ZIP
//! archive offered for download.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::contract::{GenerateResponse, GeneratedFile};
use crate::error::BundleError;

/// File name of the downloaded archive. Kept for compatibility with earlier exports.
pub const ARCHIVE_FILE_NAME: &str = "grafana-terraform-export.zip";

/// Placeholder shown when the backend generated nothing.
pub const EMPTY_RESULT_NAME: &str = "Result";
pub const EMPTY_RESULT_CONTENT: &str = "No resources were found";

/// Syntax used to display a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Json,
    Hcl,
    Yaml,
    Plaintext,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Json => "json",
            Language::Hcl => "hcl",
            Language::Yaml => "yaml",
            Language::Plaintext => "plaintext",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display syntax for a file, from the text after its last `.`.
pub fn language_for(file_name: &str) -> Language {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("json") => Language::Json,
        Some("tf") | Some("hcl") => Language::Hcl,
        Some("yml") | Some("yaml") => Language::Yaml,
        _ => Language::Plaintext,
    }
}

/// One viewer tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerTab<'a> {
    pub name: &'a str,
    pub content: &'a str,
    pub language: Language,
}

impl<'a> From<&'a GeneratedFile> for ViewerTab<'a> {
    fn from(file: &'a GeneratedFile) -> Self {
        ViewerTab {
            name: &file.name,
            content: &file.content,
            language: language_for(&file.name),
        }
    }
}

/// Holds the files of the last generate response.
#[derive(Debug, Clone, Default)]
pub struct ArtifactBundler {
    files: Vec<GeneratedFile>,
    warnings: Vec<String>,
    active: usize,
}

impl ArtifactBundler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a response. An empty file list becomes a single placeholder file
    /// so the viewer always has a tab to show.
    pub fn on_response(&mut self, response: GenerateResponse) {
        let GenerateResponse { files, warnings } = response;
        self.files = if files.is_empty() {
            info!("Backend generated no files, showing placeholder result");
            vec![GeneratedFile::new(EMPTY_RESULT_NAME, EMPTY_RESULT_CONTENT)]
        } else {
            files
        };
        self.warnings = warnings.unwrap_or_default();
        if !self.warnings.is_empty() {
            warn!(count = self.warnings.len(), "Generation finished with warnings");
        }
        self.active = 0;
        info!(files = self.files.len(), "Stored generated files");
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Warnings of the last response, until dismissed.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn dismiss_warnings(&mut self) {
        self.warnings.clear();
    }

    /// Forgets the stored response.
    pub fn clear(&mut self) {
        self.files.clear();
        self.warnings.clear();
        self.active = 0;
    }

    pub fn tabs(&self) -> Vec<ViewerTab<'_>> {
        self.files.iter().map(ViewerTab::from).collect()
    }

    pub fn active_tab(&self) -> Option<ViewerTab<'_>> {
        self.files.get(self.active).map(ViewerTab::from)
    }

    /// Makes tab `index` active. Out of range indices are ignored.
    pub fn select_tab(&mut self, index: usize) -> bool {
        if index < self.files.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Serialises all files into one ZIP archive. `None` when there is nothing to bundle.
    ///
    /// Entries keep the response order. A repeated name replaces the earlier
    /// entry's content in place. Timestamps are fixed, so the same files always
    /// produce the same bytes.
    pub fn build_archive(&self) -> Result<Option<Vec<u8>>, BundleError> {
        if self.files.is_empty() {
            debug!("No files to archive");
            return Ok(None);
        }
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in unique_entries(&self.files) {
            writer.start_file(name, entry_options())?;
            writer.write_all(content.as_bytes())?;
        }
        let bytes = writer.finish()?.into_inner();
        info!(bytes = bytes.len(), "Built export archive");
        Ok(Some(bytes))
    }

    /// Writes the archive into `dir` as [`ARCHIVE_FILE_NAME`].
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>, BundleError> {
        self.download_to(&dir.join(ARCHIVE_FILE_NAME))
    }

    /// Writes the archive to `path`, creating parent directories as needed.
    pub fn download_to(&self, path: &Path) -> Result<Option<PathBuf>, BundleError> {
        let Some(bytes) = self.build_archive()? else {
            return Ok(None);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Saved export archive");
        Ok(Some(path.to_path_buf()))
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn unique_entries(files: &[GeneratedFile]) -> Vec<(&str, &str)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<(&str, &str)> = Vec::with_capacity(files.len());
    for file in files {
        match positions.get(file.name.as_str()) {
            Some(&index) => {
                warn!(name = %file.name, "Duplicate file name in response, keeping the later content");
                entries[index].1 = file.content.as_str();
            }
            None => {
                positions.insert(file.name.as_str(), entries.len());
                entries.push((file.name.as_str(), file.content.as_str()));
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_mapping() {
        assert_eq!(language_for("foo.tf"), Language::Hcl);
        assert_eq!(language_for("foo.hcl"), Language::Hcl);
        assert_eq!(language_for("foo.yaml"), Language::Yaml);
        assert_eq!(language_for("foo.yml"), Language::Yaml);
        assert_eq!(language_for("provider.tf.json"), Language::Json);
        assert_eq!(language_for("foo.bin"), Language::Plaintext);
        assert_eq!(language_for("Result"), Language::Plaintext);
        assert_eq!(language_for(""), Language::Plaintext);
        assert_eq!(language_for("trailing."), Language::Plaintext);
    }

    #[test]
    fn duplicates_keep_first_position_and_last_content() {
        let files = vec![
            GeneratedFile::new("a.tf", "1"),
            GeneratedFile::new("b.tf", "2"),
            GeneratedFile::new("a.tf", "3"),
        ];
        assert_eq!(unique_entries(&files), vec![("a.tf", "3"), ("b.tf", "2")]);
    }

    #[test]
    fn tabs_follow_selection() {
        let mut bundler = ArtifactBundler::new();
        bundler.on_response(GenerateResponse {
            files: vec![
                GeneratedFile::new("main.tf", "x"),
                GeneratedFile::new("dash.json", "{}"),
            ],
            warnings: None,
        });
        assert_eq!(bundler.active_tab().unwrap().name, "main.tf");
        assert!(bundler.select_tab(1));
        assert_eq!(bundler.active_tab().unwrap().language, Language::Json);
        assert!(!bundler.select_tab(2));
        assert_eq!(bundler.active_tab().unwrap().name, "dash.json");
    }
}
