use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use photosync_core::client::{PhotoService, ServiceError};
use photosync_core::photo::{ListedPhoto, PhotoPage};
use photosync_core::types::{PhotoId, UserId};
use strum_macros::Display;

use crate::context::Context;
use crate::error::{BackupError, PhotoError};
use crate::fetch::RenditionFetcher;
use crate::hook::{Hook, Hooks};
use crate::metadata::embed::MetadataEmbedder;
use crate::metadata::{Materialized, MetadataMaterializer};
use crate::path::PathPlanner;
use crate::retained::RetainedSet;
use crate::sanitize::NameSanitizer;
use crate::scrub::{ScrubReport, Scrubber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunState {
    Idle,
    Listing,
    ProcessingPage(u32),
    Scrubbing,
    Done,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub photos: usize,
    pub failed_photos: usize,
    pub transferred: usize,
    pub sidecars_written: usize,
    pub cancelled: bool,
    pub scrub: Option<ScrubReport>,
}

#[derive(Debug, Default)]
struct PhotoReport {
    transferred: usize,
    sidecar_written: bool,
    failures: usize,
}

pub struct Backup {
    context: Context,
    service: Box<dyn PhotoService>,
    embedder: Option<Box<dyn MetadataEmbedder>>,
    hooks: Hooks,
    sanitizer: NameSanitizer,
    stop_signal: Arc<AtomicBool>,
    state: RunState,
}

impl Backup {
    pub fn new(context: Context, service: Box<dyn PhotoService>) -> Self {
        Self {
            context,
            service,
            embedder: None,
            hooks: Hooks::default(),
            sanitizer: NameSanitizer::new(),
            stop_signal: Arc::new(AtomicBool::new(false)),
            state: RunState::Idle,
        }
    }

    pub fn with_embedder(mut self, embedder: Box<dyn MetadataEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn register_hook(&mut self, hook: Hook) {
        self.hooks.register(hook)
    }

    pub fn cancel(&self) {
        log::info!("Cancel requested");
        self.stop_signal.store(true, Ordering::Relaxed)
    }

    /// Share the cancellation flag, for example with a signal handler thread
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.stop_signal.clone()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn is_cancelled(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    pub fn run_backup(&mut self) -> bool {
        match self.run() {
            Ok(report) => {
                log::info!(
                    "Backup finished: {} photos ({} failed), {} files transferred, {} sidecars written",
                    report.photos,
                    report.failed_photos,
                    report.transferred,
                    report.sidecars_written
                );
                !report.cancelled
            }
            Err(error) => {
                log::error!("Backup failed: {}", error);
                false
            }
        }
    }

    pub fn run(&mut self) -> Result<RunReport, BackupError> {
        let result = self.run_queue();
        if result.is_err() {
            self.state = RunState::Done;
        }
        result
    }

    fn run_queue(&mut self) -> Result<RunReport, BackupError> {
        self.state = RunState::Listing;
        let user_id = self
            .service
            .check_identity()
            .map_err(BackupError::Identity)?;
        let root = self.context.root()?.clone();
        let min_timestamp = self
            .context
            .time_window()?
            .map(|time_window| time_window.since(Utc::now()))
            .transpose()?;
        log::info!("Backup account {} into {}", user_id, root.display());

        let mut retained = RetainedSet::new();
        let mut report = RunReport::default();
        let mut page = 1;
        let mut pages = 1;

        'pages: loop {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let photo_page = self
                .list(&user_id, min_timestamp, page)
                .map_err(|error| BackupError::Listing(page, error))?;
            if page == 1 {
                // First page counters are authoritative for the whole run
                pages = photo_page.pages;
                self.hooks.queue_started(&photo_page);
            }
            self.state = RunState::ProcessingPage(page);
            log::info!("Process page {}/{}", page, pages);

            for listed in &photo_page.photos {
                if self.is_cancelled() {
                    report.cancelled = true;
                    break 'pages;
                }
                let success = self.process(listed, &root, &mut retained, &mut report);
                self.hooks.photo_finished(listed, success);
            }

            if page >= pages {
                break;
            }
            page += 1;
        }

        self.hooks.queue_finished();

        if report.cancelled {
            log::info!("Backup cancelled, scrubbing skipped");
            self.state = RunState::Cancelled;
            return Ok(report);
        }

        if self.context.scrub_backups {
            self.state = RunState::Scrubbing;
            report.scrub = Some(Scrubber::new(&root)?.scrub(&retained));
        }

        self.state = RunState::Done;
        Ok(report)
    }

    /// Backup one photo without scrubbing
    pub fn run_backup_for_photo(&mut self, photo_id: PhotoId, secret: &str) -> bool {
        let root = match self.context.root() {
            Ok(root) => root.clone(),
            Err(error) => {
                log::error!("Backup of photo {} failed: {}", photo_id, error);
                return false;
            }
        };

        let listed = ListedPhoto {
            id: photo_id,
            secret: secret.to_string(),
            title: "".to_string(),
        };
        let mut retained = RetainedSet::new();
        let mut report = RunReport::default();
        let success = self.process(&listed, &root, &mut retained, &mut report);
        self.hooks.photo_finished(&listed, success);
        success
    }

    fn list(
        &self,
        user_id: &UserId,
        min_timestamp: Option<i64>,
        page: u32,
    ) -> Result<PhotoPage, ServiceError> {
        match min_timestamp {
            Some(min_timestamp) => {
                log::debug!("List photos updated since {} (page {})", min_timestamp, page);
                self.service.recently_updated(min_timestamp, page)
            }
            None => {
                log::debug!("List photos of {} (page {})", user_id, page);
                self.service.search(user_id, page)
            }
        }
    }

    fn process(
        &mut self,
        listed: &ListedPhoto,
        root: &Path,
        retained: &mut RetainedSet,
        report: &mut RunReport,
    ) -> bool {
        self.hooks.photo_started(listed);
        report.photos += 1;

        match self.backup_photo(listed.id, &listed.secret, root, retained) {
            Ok(photo_report) => {
                report.transferred += photo_report.transferred;
                if photo_report.sidecar_written {
                    report.sidecars_written += 1;
                }
                if photo_report.failures > 0 {
                    report.failed_photos += 1;
                    return false;
                }
                true
            }
            Err(error) => {
                log::error!("Photo {} failed: {}", listed.id, error);
                report.failed_photos += 1;
                false
            }
        }
    }

    fn backup_photo(
        &mut self,
        photo_id: PhotoId,
        secret: &str,
        root: &Path,
        retained: &mut RetainedSet,
    ) -> Result<PhotoReport, PhotoError> {
        let photo = self
            .service
            .get_info(photo_id, secret)
            .map_err(PhotoError::Detail)?;
        let slug = self.sanitizer.slug(&photo.title);
        let planner = PathPlanner::new(root, photo.id, photo.taken.as_deref(), &slug)?;

        let fetcher = RenditionFetcher::new(
            self.service.as_ref(),
            &self.context.renditions,
            self.context.force,
        );
        let mut outcome = fetcher.process(&photo, &planner);
        retained.claim_all(photo.id, outcome.retained.iter().cloned());
        if let Some(error) = outcome.error.take() {
            self.keep_sidecar(photo.id, &planner, retained);
            return Err(error);
        }

        let materializer =
            MetadataMaterializer::new(root, self.context.dump_metadata, self.context.force)
                .with_uri_alias(self.context.uri_alias.as_deref())
                .with_embedder(self.embedder.as_deref());
        let materialized = match materializer.materialize(&photo, &planner, &outcome) {
            Ok(materialized) => materialized,
            Err(error) => {
                self.keep_sidecar(photo.id, &planner, retained);
                return Err(PhotoError::Metadata(error));
            }
        };
        if let Some(path) = materialized.path() {
            retained.claim(photo.id, path.to_path_buf());
        }

        Ok(PhotoReport {
            transferred: outcome.written.len(),
            sidecar_written: matches!(materialized, Materialized::Written(_)),
            failures: outcome.failures,
        })
    }

    /// A sidecar written by a previous run is not scrubbed because of a
    /// failure of the current one
    fn keep_sidecar(&self, photo_id: PhotoId, planner: &PathPlanner, retained: &mut RetainedSet) {
        let sidecar: PathBuf = planner.metadata();
        if self.context.dump_metadata && sidecar.exists() {
            retained.claim(photo_id, sidecar);
        }
    }
}
