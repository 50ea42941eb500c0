use serde_json::Value;

use crate::types::{PhotoId, UserId, Visibility};

/// Entry of an account listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPhoto {
    pub id: PhotoId,
    pub secret: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct PhotoPage {
    pub page: u32,
    pub pages: u32,
    pub photos: Vec<ListedPhoto>,
    /// Response document as returned by the remote
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub raw: String,
    pub normalized: String,
    pub author: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub author: UserId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemotePhoto {
    pub id: PhotoId,
    pub secret: String,
    pub title: String,
    pub description: String,
    pub owner: UserId,
    /// Capture date as given by the remote, `YYYY-MM-DD HH:MM:SS`
    pub taken: Option<String>,
    pub posted: Option<i64>,
    /// Change watermark, seconds since epoch
    pub last_update: Option<i64>,
    pub visibility: Visibility,
    pub license: Option<String>,
    pub tags: Vec<Tag>,
    pub notes: Vec<Note>,
    pub page_url: String,
}

impl RemotePhoto {
    pub fn new(id: PhotoId, secret: String, owner: UserId) -> Self {
        let page_url = photo_page_url(&owner, id);
        Self {
            id,
            secret,
            title: "".to_string(),
            description: "".to_string(),
            owner,
            taken: None,
            posted: None,
            last_update: None,
            visibility: Visibility::default(),
            license: None,
            tags: vec![],
            notes: vec![],
            page_url,
        }
    }
}

pub fn photo_page_url(owner: &UserId, id: PhotoId) -> String {
    format!("https://www.flickr.com/photos/{}/{}/", owner, id)
}

pub fn person_url(user: &UserId) -> String {
    format!("https://www.flickr.com/people/{}/", user)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size {
    pub label: String,
    pub source: String,
    pub width: u32,
    pub height: u32,
}
