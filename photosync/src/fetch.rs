use std::{
    fs,
    path::{Path, PathBuf},
};

use photosync_core::{
    client::PhotoService,
    photo::{RemotePhoto, Size},
    types::RenditionKind,
};

use crate::{
    change::needs_fetch,
    error::{PhotoError, RenditionError, SizeUnavailableError},
    path::PathPlanner,
};

#[derive(Debug)]
pub struct FetchOutcome {
    /// Change state of the photo, computed once from the probe rendition
    pub has_changed: bool,
    /// Paths claimed for this photo, whether transferred or not
    pub retained: Vec<PathBuf>,
    /// Renditions transferred by this call
    pub written: Vec<(RenditionKind, PathBuf)>,
    /// Renditions available on disk once this call returned
    pub present: Vec<(RenditionKind, PathBuf)>,
    pub failures: usize,
    /// Set when the photo could not be processed at all
    pub error: Option<PhotoError>,
}

impl FetchOutcome {
    fn new(has_changed: bool) -> Self {
        Self {
            has_changed,
            retained: vec![],
            written: vec![],
            present: vec![],
            failures: 0,
            error: None,
        }
    }

    pub fn is_written(&self, kind: RenditionKind) -> bool {
        self.written.iter().any(|(kind_, _)| *kind_ == kind)
    }

    fn keep(&mut self, kind: RenditionKind, path: PathBuf) {
        if path.exists() {
            self.present.push((kind, path.clone()));
        }
        self.retained.push(path);
    }
}

pub struct RenditionFetcher<'a> {
    service: &'a dyn PhotoService,
    kinds: Vec<RenditionKind>,
    force: bool,
}

impl<'a> RenditionFetcher<'a> {
    pub fn new(service: &'a dyn PhotoService, kinds: &[RenditionKind], force: bool) -> Self {
        let mut kinds = kinds.to_vec();
        kinds.sort();
        kinds.dedup();
        Self {
            service,
            kinds,
            force,
        }
    }

    /// Rendition whose local copy represents the whole photo for change
    /// detection: the original, or the first enabled one when originals are
    /// not backed up.
    pub fn probe(&self) -> Option<RenditionKind> {
        if self.kinds.contains(&RenditionKind::Original) {
            Some(RenditionKind::Original)
        } else {
            self.kinds.first().copied()
        }
    }

    pub fn process(&self, photo: &RemotePhoto, planner: &PathPlanner) -> FetchOutcome {
        let has_changed = match self.probe() {
            Some(probe) => needs_fetch(photo.last_update, &planner.rendition(probe), self.force),
            None => false,
        };
        let mut outcome = FetchOutcome::new(has_changed);

        if !has_changed {
            log::debug!("Photo {} is unchanged, skip its renditions", photo.id);
            for kind in &self.kinds {
                outcome.keep(*kind, planner.rendition(*kind));
            }
            return outcome;
        }

        let sizes = match self.service.get_sizes(photo.id) {
            Ok(sizes) => sizes,
            Err(error) => {
                // Previously fetched copies stay claimed
                for kind in &self.kinds {
                    let path = planner.rendition(*kind);
                    if path.exists() {
                        outcome.keep(*kind, path);
                    }
                }
                outcome.error = Some(PhotoError::Sizes(error));
                return outcome;
            }
        };

        for kind in &self.kinds {
            if let Err(error) = self.fetch(*kind, &sizes, planner, &mut outcome) {
                match error {
                    RenditionError::SizeUnavailable(_) => {
                        log::warn!("Photo {}: {}, skip it", photo.id, error)
                    }
                    _ => {
                        outcome.failures += 1;
                        log::error!("Photo {}: {} rendition failed: {}", photo.id, kind, error)
                    }
                }
            }
        }

        outcome
    }

    fn fetch(
        &self,
        kind: RenditionKind,
        sizes: &[Size],
        planner: &PathPlanner,
        outcome: &mut FetchOutcome,
    ) -> Result<(), RenditionError> {
        let size = sizes
            .iter()
            .find(|size| size.label == kind.size_label())
            .ok_or(SizeUnavailableError(kind))?;
        let path = planner.rendition(kind);
        outcome.retained.push(path.clone());

        let result = self.transfer(&size.source, &path);
        match &result {
            Ok(_) => {
                outcome.written.push((kind, path.clone()));
                outcome.present.push((kind, path));
            }
            Err(_) if path.exists() => outcome.present.push((kind, path)),
            Err(_) => {}
        }

        result
    }

    fn transfer(&self, source: &str, path: &Path) -> Result<(), RenditionError> {
        if let Some(folder) = path.parent() {
            fs::create_dir_all(folder)
                .map_err(|error| RenditionError::CreateFolder(folder.to_path_buf(), error))?;
        }

        log::info!("Fetch {} into {}", source, path.display());
        self.service.fetch_to_file(source, path)?;
        Ok(())
    }
}
