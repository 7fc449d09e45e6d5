//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageFile};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the outputs scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
    /// Directory names that are never entered
    pub skip_dirs: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            extensions: None,
            skip_dirs: vec!["thumbnails".to_string()],
        }
    }
}

/// Scanner over an outputs `images/` tree
///
/// Symlinks are never followed. Symlinks, sockets and other non-regular
/// entries are skipped without error.
#[derive(Debug, Clone)]
pub struct OutputsScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl OutputsScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Start a walk below `root`
    pub fn files(&self, root: &Path) -> Result<ImageFiles, ScanError> {
        self.files_with_events(root, &null_sender())
    }

    /// Start a walk below `root`, reporting skipped entries as events
    pub fn files_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ImageFiles, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name();

        let include_hidden = self.config.include_hidden;
        let skip_dirs = self.config.skip_dirs.clone();

        let entries = walker.into_iter().filter_entry(move |entry| {
            // The root itself is always entered
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if !include_hidden && name.starts_with('.') {
                return false;
            }
            !skip_dirs.iter().any(|skip| skip == name.as_ref())
        });

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        Ok(ImageFiles {
            root: root.to_path_buf(),
            entries: Box::new(entries),
            filter: self.filter.clone(),
            events: events.clone(),
        })
    }
}

impl Default for OutputsScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Lazy sequence of image files produced by [`OutputsScanner::files`]
pub struct ImageFiles {
    root: PathBuf,
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    filter: ImageFilter,
    events: EventSender,
}

impl ImageFiles {
    fn report_skipped(&self, error: ScanError, path: PathBuf) {
        tracing::warn!(path = %path.display(), "skipping entry: {}", error);
        self.events.send(Event::Scan(ScanEvent::Skipped {
            path,
            message: error.to_string(),
        }));
    }
}

impl Iterator for ImageFiles {
    type Item = ImageFile;

    fn next(&mut self) -> Option<ImageFile> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };
                    self.report_skipped(error, path);
                    continue;
                }
            };

            // Symlinks report their own type here since links are not followed
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.filter.should_include(path) {
                continue;
            }

            match image_name(&self.root, path) {
                Some(image_name) => {
                    return Some(ImageFile {
                        path: path.to_path_buf(),
                        image_name,
                    });
                }
                None => {
                    tracing::warn!(path = %path.display(), "skipping file with a non UTF-8 name");
                }
            }
        }
    }
}

/// Catalog key for a file: its path below `root`, joined with `/`
fn image_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    let name = parts?.join("/");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
