use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use photosync_core::types::{PhotoId, RenditionKind};

use crate::error::InvalidDateError;

pub const IMAGE_EXTENSION: &str = "jpg";
pub const METADATA_EXTENSION: &str = "xml";

/// `YYYY`, `MM`, `DD` parts of a capture date. Only the first ten characters
/// of the remote value are considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDate {
    year: String,
    month: String,
    day: String,
}

impl CaptureDate {
    pub fn parse(raw: Option<&str>) -> Result<Self, InvalidDateError> {
        let invalid = || InvalidDateError(raw.map(|raw| raw.to_string()));
        let raw_date = raw.and_then(|raw| raw.get(..10)).ok_or_else(invalid)?;

        let parts: Vec<&str> = raw_date.split('-').collect();
        let [year, month, day] = parts.as_slice() else {
            return Err(invalid());
        };
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }
        match (year.parse(), month.parse(), day.parse()) {
            (Ok(year_), Ok(month_), Ok(day_)) => {
                NaiveDate::from_ymd_opt(year_, month_, day_).ok_or_else(invalid)?
            }
            _ => return Err(invalid()),
        };

        Ok(Self {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
        })
    }

    pub fn compact(&self) -> String {
        format!("{}{}{}", self.year, self.month, self.day)
    }

    fn folder(&self, root: &Path) -> PathBuf {
        root.join(&self.year).join(&self.month).join(&self.day)
    }
}

/// `YYYYMMDD-{photoId}-{slug}`
pub fn stem(photo_id: PhotoId, date: &CaptureDate, slug: &str) -> String {
    format!("{}-{}-{}", date.compact(), photo_id, slug)
}

pub fn rendition_path(
    root: &Path,
    photo_id: PhotoId,
    capture_date: Option<&str>,
    slug: &str,
    kind: RenditionKind,
) -> Result<PathBuf, InvalidDateError> {
    Ok(PathPlanner::new(root, photo_id, capture_date, slug)?.rendition(kind))
}

pub fn metadata_path(
    root: &Path,
    photo_id: PhotoId,
    capture_date: Option<&str>,
    slug: &str,
) -> Result<PathBuf, InvalidDateError> {
    Ok(PathPlanner::new(root, photo_id, capture_date, slug)?.metadata())
}

/// Every local artifact path of one photo
#[derive(Debug, Clone)]
pub struct PathPlanner {
    root: PathBuf,
    photo_id: PhotoId,
    date: CaptureDate,
    slug: String,
}

impl PathPlanner {
    pub fn new(
        root: &Path,
        photo_id: PhotoId,
        capture_date: Option<&str>,
        slug: &str,
    ) -> Result<Self, InvalidDateError> {
        Ok(Self {
            root: root.to_path_buf(),
            photo_id,
            date: CaptureDate::parse(capture_date)?,
            slug: slug.to_string(),
        })
    }

    pub fn rendition(&self, kind: RenditionKind) -> PathBuf {
        self.date.folder(&self.root).join(format!(
            "{}{}.{}",
            stem(self.photo_id, &self.date, &self.slug),
            kind.suffix(),
            IMAGE_EXTENSION
        ))
    }

    pub fn metadata(&self) -> PathBuf {
        self.date.folder(&self.root).join(format!(
            "{}.{}",
            stem(self.photo_id, &self.date, &self.slug),
            METADATA_EXTENSION
        ))
    }
}
