use crate::error::{Error, Result};
use crate::route_path::MODULE_EXTENSION;
use log::debug;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File scanner for discovering controller modules.
///
/// The `FileScanner` recursively walks the controllers directory to find all controller
/// source files. Hidden entries (those whose name starts with `.`) are skipped, and
/// hidden directories are not descended into.
///
/// # Example
///
/// ```no_run
/// use barabara::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./controllers"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} controllers", result.controller_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Paths to all discovered controller files, in discovery order
    pub controller_files: Vec<PathBuf>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified controllers directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all controller files.
    ///
    /// Within each directory, subdirectories are visited before files and entries
    /// are otherwise ordered by name, so the contents of nested directories are
    /// listed before the files sitting next to them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the root does not exist, is not a directory,
    /// or any directory below it cannot be read. A failed scan yields no partial result.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut controller_files = Vec::new();

        let walker = WalkDir::new(&self.root_path)
            .follow_links(true)
            .sort_by(directories_first)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry?;

            if entry.depth() == 0 {
                if !entry.file_type().is_dir() {
                    return Err(Error::Discovery {
                        path: self.root_path.clone(),
                        message: "not a directory".to_string(),
                    });
                }
                continue;
            }

            let path = entry.path();
            if entry.file_type().is_file() && is_controller_file(path) {
                debug!("Discovered controller: {}", path.display());
                controller_files.push(path.to_path_buf());
            }
        }

        Ok(ScanResult { controller_files })
    }
}

/// Returns every controller file below `base_path`, nested directories' contents first.
pub fn find_controllers(base_path: &Path) -> Result<Vec<PathBuf>> {
    FileScanner::new(base_path.to_path_buf())
        .scan()
        .map(|result| result.controller_files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_controller_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(MODULE_EXTENSION)
}

fn directories_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}
