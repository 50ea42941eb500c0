use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{TimeZone, Utc};
use itertools::Itertools;
use photosync_core::{
    photo::{person_url, RemotePhoto},
    types::{license_uri, RenditionKind},
};
use reqwest::Url;
use tempfile::NamedTempFile;

use crate::{fetch::FetchOutcome, path::PathPlanner};

use self::{
    embed::{MetadataEmbedder, TextFields},
    rdf::*,
};

pub mod embed;
pub mod rdf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Metadata dump is disabled
    Disabled,
    /// Photo unchanged and its sidecar already on disk
    Unchanged(PathBuf),
    Written(PathBuf),
}

impl Materialized {
    /// Sidecar path to claim in the retained set
    pub fn path(&self) -> Option<&Path> {
        match self {
            Materialized::Disabled => None,
            Materialized::Unchanged(path) | Materialized::Written(path) => Some(path),
        }
    }
}

pub struct MetadataMaterializer<'a> {
    root: &'a Path,
    dump_metadata: bool,
    force: bool,
    uri_alias: Option<&'a str>,
    embedder: Option<&'a dyn MetadataEmbedder>,
    creator: String,
}

impl<'a> MetadataMaterializer<'a> {
    pub fn new(root: &'a Path, dump_metadata: bool, force: bool) -> Self {
        Self {
            root,
            dump_metadata,
            force,
            uri_alias: None,
            embedder: None,
            creator: format!("{}@{}", whoami::username(), whoami::hostname()),
        }
    }

    pub fn with_uri_alias(mut self, uri_alias: Option<&'a str>) -> Self {
        self.uri_alias = uri_alias;
        self
    }

    pub fn with_embedder(mut self, embedder: Option<&'a dyn MetadataEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_creator(mut self, creator: String) -> Self {
        self.creator = creator;
        self
    }

    pub fn materialize(
        &self,
        photo: &RemotePhoto,
        planner: &PathPlanner,
        outcome: &FetchOutcome,
    ) -> Result<Materialized> {
        self.embed(photo, outcome)?;

        if !self.dump_metadata {
            log::debug!("Metadata dump disabled for photo {}", photo.id);
            return Ok(Materialized::Disabled);
        }

        let path = planner.metadata();
        if !outcome.has_changed && !self.force && path.exists() {
            log::debug!("Sidecar of photo {} is up to date", photo.id);
            return Ok(Materialized::Unchanged(path));
        }

        let document = self.graph(photo, &outcome.present)?.serialize()?;
        write_atomically(&path, &document)?;
        log::info!("Wrote sidecar {}", path.display());
        Ok(Materialized::Written(path))
    }

    /// Only a freshly written original is embedded
    fn embed(&self, photo: &RemotePhoto, outcome: &FetchOutcome) -> Result<()> {
        let Some(embedder) = self.embedder else {
            return Ok(());
        };
        let original = outcome
            .written
            .iter()
            .find(|(kind, _)| *kind == RenditionKind::Original);
        if let Some((_, path)) = original {
            embedder
                .embed_text_fields(path, &TextFields::from_photo(photo))
                .context(format!("Unable to embed metadata into {}", path.display()))?;
        }
        Ok(())
    }

    pub fn graph(
        &self,
        photo: &RemotePhoto,
        renditions: &[(RenditionKind, PathBuf)],
    ) -> Result<Graph> {
        let mut graph = Graph::new();
        let subject = photo.page_url.as_str();

        graph.class(subject, PS_PHOTO_CLASS);
        graph.literal(subject, DC_IDENTIFIER, photo.id.to_string());
        graph.literal(subject, DC_TITLE, &photo.title);
        graph.literal(subject, DC_DESCRIPTION, &photo.description);
        graph.resource(subject, DC_CREATOR, person_url(&photo.owner));
        if let Some(taken) = &photo.taken {
            graph.literal(subject, DCTERMS_CREATED, taken);
        }
        if let Some(posted) = photo.posted.and_then(rfc3339) {
            graph.literal(subject, DCTERMS_ISSUED, posted);
        }
        if let Some(last_update) = photo.last_update.and_then(rfc3339) {
            graph.literal(subject, DCTERMS_MODIFIED, last_update);
        }
        graph.literal(subject, PS_VISIBILITY, photo.visibility.classification());
        if let Some(license) = &photo.license {
            graph.literal(subject, PS_LICENSE_ID, license);
            if let Some(uri) = license_uri(license) {
                graph.resource(subject, CC_LICENSE, uri);
            }
        }

        for tag in photo.tags.iter().unique_by(|tag| &tag.id) {
            let tag_subject = format!("{}#tag-{}", photo.page_url, tag.id);
            graph.resource(subject, PS_TAG, &tag_subject);
            graph.class(&tag_subject, PS_TAG_CLASS);
            graph.literal(&tag_subject, PS_RAW, &tag.raw);
            graph.literal(&tag_subject, PS_NORMALIZED, &tag.normalized);
            graph.resource(&tag_subject, DC_CREATOR, person_url(&tag.author));
        }

        for note in &photo.notes {
            let note_subject = format!("{}#note-{}", photo.page_url, note.id);
            graph.resource(subject, PS_NOTE, &note_subject);
            graph.class(&note_subject, PS_NOTE_CLASS);
            graph.literal(&note_subject, PS_X, note.x.to_string());
            graph.literal(&note_subject, PS_Y, note.y.to_string());
            graph.literal(&note_subject, PS_WIDTH, note.width.to_string());
            graph.literal(&note_subject, PS_HEIGHT, note.height.to_string());
            graph.literal(&note_subject, PS_BODY, &note.body);
            graph.resource(&note_subject, DC_CREATOR, person_url(&note.author));
        }

        let now = Utc::now().to_rfc3339();
        for (kind, path) in renditions {
            let file_subject = self.file_uri(path)?;
            graph.resource(subject, PS_RENDITION, &file_subject);
            graph.class(&file_subject, PS_RENDITION_CLASS);
            graph.resource(&file_subject, DCTERMS_SOURCE, subject);
            graph.literal(&file_subject, PS_SIZE, kind.to_string());
            graph.literal(&file_subject, DCTERMS_CREATED, &now);
            graph.literal(&file_subject, DC_CREATOR, &self.creator);
        }

        Ok(graph)
    }

    /// `file://` uri of given local path, or its alias based uri when an alias
    /// is configured for the destination root
    pub fn file_uri(&self, path: &Path) -> Result<String> {
        if let Some(alias) = self.uri_alias {
            if let Ok(relative_path) = path.strip_prefix(self.root) {
                let relative = relative_path
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .join("/");
                return Ok(format!("{}/{}", alias.trim_end_matches('/'), relative));
            }
        }

        Url::from_file_path(path)
            .map(|url| url.to_string())
            .map_err(|_| anyhow!("Unable to build file uri of {}", path.display()))
    }
}

fn rfc3339(timestamp: i64) -> Option<String> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|date| date.to_rfc3339())
}

/// Content becomes visible at `path` only once fully written. On failure the
/// temporary file is removed and a previous file is left untouched.
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let folder = path
        .parent()
        .context(format!("No parent folder for {}", path.display()))?;
    fs::create_dir_all(folder).context(format!("Unable to create folder {}", folder.display()))?;

    let mut temporary = NamedTempFile::new_in(folder)
        .context(format!("Unable to create temporary file in {}", folder.display()))?;
    temporary
        .write_all(content)
        .context(format!("Unable to write temporary file for {}", path.display()))?;
    temporary
        .as_file()
        .sync_all()
        .context(format!("Unable to flush temporary file for {}", path.display()))?;
    temporary
        .persist(path)
        .map_err(|error| error.error)
        .context(format!("Unable to move sidecar into {}", path.display()))?;

    Ok(())
}
