use std::fmt;
use std::path::PathBuf;

use photosync_core::client::{Flickr, ServiceError};
use photosync_core::config::BackupConfig;
use photosync_core::types::RenditionKind;

use crate::error::BackupError;
use crate::window::TimeWindow;

#[derive(Clone)]
pub struct Context {
    pub api_key: String,
    pub api_secret: String,
    pub auth_token: String,
    pub per_page: u32,
    pub destination: Option<PathBuf>,
    pub renditions: Vec<RenditionKind>,
    pub dump_metadata: bool,
    pub embed_metadata: bool,
    pub scrub_backups: bool,
    pub force: bool,
    pub time_window: Option<String>,
    pub uri_alias: Option<String>,
}

impl Context {
    pub fn new(config: BackupConfig) -> Self {
        Self {
            api_key: config.api_key,
            api_secret: config.api_secret,
            auth_token: config.auth_token,
            per_page: config.per_page,
            destination: config.destination,
            renditions: config.renditions,
            dump_metadata: config.dump_metadata,
            embed_metadata: config.embed_metadata,
            scrub_backups: config.scrub_backups,
            force: config.force,
            time_window: config.time_window,
            uri_alias: config.uri_alias,
        }
    }

    pub fn client(&self) -> Result<Flickr, ServiceError> {
        Flickr::new(
            self.api_key.clone(),
            self.api_secret.clone(),
            self.auth_token.clone(),
            self.per_page,
        )
    }

    pub fn root(&self) -> Result<&PathBuf, BackupError> {
        self.destination
            .as_ref()
            .ok_or(BackupError::MissingDestination)
    }

    pub fn time_window(&self) -> Result<Option<TimeWindow>, BackupError> {
        Ok(self
            .time_window
            .as_deref()
            .map(str::parse::<TimeWindow>)
            .transpose()?)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("api_key", &self.api_key)
            .field("destination", &self.destination)
            .field("renditions", &self.renditions)
            .field("dump_metadata", &self.dump_metadata)
            .field("embed_metadata", &self.embed_metadata)
            .field("scrub_backups", &self.scrub_backups)
            .field("force", &self.force)
            .field("time_window", &self.time_window)
            .finish()
    }
}
