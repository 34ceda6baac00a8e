//! Source document discovery and text extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};

/// Extracts per-page text from one kind of source file.
pub trait SourceLoader: Send + Sync {
    /// Whether this loader handles the file.
    fn accepts(&self, path: &Path) -> bool;

    /// Text of each page, in page order.
    fn load_pages(&self, path: &Path) -> IngestResult<Vec<String>>;
}

/// PDF loader backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl SourceLoader for PdfLoader {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }

    fn load_pages(&self, path: &Path) -> IngestResult<Vec<String>> {
        let bytes = std::fs::read(path)?;
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| IngestError::SourceLoad {
            filename: file_name(path),
            message: e.to_string(),
        })
    }
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Zero-based page number.
    pub page: u32,
    /// Extracted text.
    pub text: String,
}

/// A successfully loaded source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Location of the file.
    pub path: PathBuf,
    /// Technical file name, e.g. `data_policy.pdf`.
    pub filename: String,
    /// Display name, e.g. `Data Policy`.
    pub source: String,
    /// Pages in order.
    pub pages: Vec<PageText>,
}

/// A file that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLoadFailure {
    /// File name.
    pub filename: String,
    /// Why loading failed.
    pub message: String,
}

/// Outcome of scanning the documents directory.
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Files the loader accepted.
    pub files_found: usize,
    /// Files loaded successfully, in file-name order.
    pub documents: Vec<SourceDocument>,
    /// Files skipped.
    pub failures: Vec<SourceLoadFailure>,
}

impl LoadSummary {
    /// Total pages across loaded documents.
    pub fn page_count(&self) -> usize {
        self.documents.iter().map(|d| d.pages.len()).sum()
    }
}

/// Load every file of `dir` accepted by `loader`, in file-name order.
///
/// Unreadable files are recorded in [`LoadSummary::failures`] and skipped.
pub async fn load_documents(
    dir: &Path,
    loader: Arc<dyn SourceLoader>,
) -> IngestResult<LoadSummary> {
    if !dir.is_dir() {
        return Err(IngestError::DocumentsDirMissing {
            path: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && loader.accepts(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    info!(dir = %dir.display(), files = paths.len(), "Discovered source documents");

    let mut summary = LoadSummary {
        files_found: paths.len(),
        ..LoadSummary::default()
    };

    for path in paths {
        let filename = file_name(&path);
        let task_loader = Arc::clone(&loader);
        let task_path = path.clone();
        let loaded = tokio::task::spawn_blocking(move || task_loader.load_pages(&task_path))
            .await
            .map_err(|e| IngestError::SourceLoad {
                filename: filename.clone(),
                message: format!("extraction aborted: {}", e),
            })
            .and_then(|r| r);

        match loaded {
            Ok(pages) => {
                debug!(file = %filename, pages = pages.len(), "Loaded document");
                summary.documents.push(SourceDocument {
                    source: display_name(&path),
                    filename,
                    pages: pages
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| PageText {
                            page: i as u32,
                            text,
                        })
                        .collect(),
                    path,
                });
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "Skipping unreadable document");
                summary.failures.push(SourceLoadFailure {
                    filename,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        loaded = summary.documents.len(),
        failed = summary.failures.len(),
        pages = summary.page_count(),
        "Document loading finished"
    );
    Ok(summary)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Display name for a source file: the stem with `_` as spaces, title-cased.
pub fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().replace('_', " "))
        .unwrap_or_default();

    let mut out = String::with_capacity(stem.len());
    let mut previous_alpha = false;
    for c in stem.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
        } else {
            out.push(c);
        }
        previous_alpha = c.is_alphabetic();
    }
    out
}
