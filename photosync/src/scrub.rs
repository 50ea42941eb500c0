use std::{
    fs, io,
    path::{Path, PathBuf},
};

use photosync_core::types::PhotoId;
use regex::Regex;
use walkdir::WalkDir;

use crate::{retained::RetainedSet, util::is_empty_dir};

/// Names produced by the path planner: `YYYYMMDD-{photoId}-...`
pub const BACKUP_FILE_PATTERN: &str = r"^\d{8}-(\d+)-";
/// Day, month and year folders
const PRUNED_ANCESTORS: usize = 3;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrubReport {
    pub deleted: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub failures: Vec<PathBuf>,
}

/// Delete backup files which are not part of a retained set.
///
/// Any file named after the backup pattern is a candidate, whichever account
/// produced it: two configurations sharing a destination root will delete
/// each other's files.
///
/// Only photos claimed during the run are retained. A photo whose details
/// could not be fetched, or which fell outside the `time_window` of the run,
/// has no claim and its files are deleted.
pub struct Scrubber {
    root: PathBuf,
    pattern: Regex,
    remove_file: fn(&Path) -> io::Result<()>,
    remove_dir: fn(&Path) -> io::Result<()>,
}

impl Scrubber {
    pub fn new(root: &Path) -> Result<Self, regex::Error> {
        Ok(Self {
            root: root.to_path_buf(),
            pattern: Regex::new(BACKUP_FILE_PATTERN)?,
            remove_file: |path| fs::remove_file(path),
            remove_dir: |path| fs::remove_dir_all(path),
        })
    }

    pub fn photo_id(&self, file_name: &str) -> Option<PhotoId> {
        self.pattern
            .captures(file_name)
            .and_then(|captures| captures.get(1))
            .and_then(|id| id.as_str().parse::<u64>().ok())
            .map(PhotoId)
    }

    pub fn scrub(&self, retained: &RetainedSet) -> ScrubReport {
        let mut report = ScrubReport::default();
        if retained.is_empty() {
            log::info!("Nothing retained, skip scrubbing");
            return report;
        }

        log::info!("Scrub {}", self.root.display());
        for path in self.candidates(retained) {
            match (self.remove_file)(&path) {
                Ok(_) => {
                    log::info!("Deleted stale file {}", path.display());
                    self.prune(&path, &mut report);
                    report.deleted.push(path);
                }
                Err(error) => {
                    log::error!("Unable to delete {}: {}", path.display(), error);
                    report.failures.push(path);
                }
            }
        }

        report
    }

    fn candidates(&self, retained: &RetainedSet) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    log::warn!("Unable to walk into {}: {}", self.root.display(), error);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|file_name| self.photo_id(file_name))
                    .map(|photo_id| !retained.retains(photo_id, entry.path()))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    fn prune(&self, path: &Path, report: &mut ScrubReport) {
        for folder in path.ancestors().skip(1).take(PRUNED_ANCESTORS) {
            if folder == self.root || !folder.starts_with(&self.root) {
                break;
            }

            match is_empty_dir(folder) {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    log::warn!("Unable to read {}: {}", folder.display(), error);
                    break;
                }
            }

            if let Err(error) = (self.remove_dir)(folder) {
                log::error!("Unable to remove folder {}: {}", folder.display(), error);
                report.failures.push(folder.to_path_buf());
                break;
            }
            log::debug!("Removed empty folder {}", folder.display());
            report.pruned.push(folder.to_path_buf());
        }
    }
}
