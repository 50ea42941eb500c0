use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use mockall::predicate;
use photosync_core::client::{MockPhotoService, ServiceError};
use photosync_core::photo::{ListedPhoto, Note, PhotoPage, RemotePhoto, Size, Tag};
use photosync_core::types::{PhotoId, UserId};
use serde_json::json;
use testdir::testdir;
use uuid::Uuid;
use walkdir::WalkDir;

pub const OWNER: &str = "12345678@N00";

pub fn tmpdir() -> PathBuf {
    let path = testdir!().join(PathBuf::from(Uuid::new_v4().to_string()));
    fs::create_dir_all(&path).unwrap();
    path
}

pub fn write_file(path: &Path) {
    if let Some(folder) = path.parent() {
        fs::create_dir_all(folder)
            .context(format!("Create folder {}", folder.display()))
            .unwrap();
    }
    fs::write(path, b"content")
        .context(format!("Create file {}", path.display()))
        .unwrap();
}

pub fn set_modified(path: &Path, modified: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

pub fn modified(path: &Path) -> SystemTime {
    path.metadata().unwrap().modified().unwrap()
}

/// Relative paths of everything under given folder, sorted
pub fn disk_files(tmpdir: &Path) -> Vec<String> {
    let mut files = WalkDir::new(tmpdir)
        .into_iter()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .strip_prefix(tmpdir)
                .unwrap()
                .display()
                .to_string()
        })
        .filter(|p| !p.is_empty())
        .collect::<Vec<String>>();
    files.sort();
    files
}

pub fn owner() -> UserId {
    UserId(OWNER.to_string())
}

pub fn remote_photo(id: u64, title: &str, taken: &str, last_update: i64) -> RemotePhoto {
    let mut photo = RemotePhoto::new(PhotoId(id), format!("secret{}", id), owner());
    photo.title = title.to_string();
    photo.taken = Some(taken.to_string());
    photo.posted = Some(last_update);
    photo.last_update = Some(last_update);
    photo
}

pub fn detailed_photo(id: u64) -> RemotePhoto {
    let mut photo = remote_photo(id, "Café", "2006-03-04 10:00:00", 1141470000);
    photo.description = "Terrace at noon".to_string();
    photo.license = Some("1".to_string());
    photo.tags = vec![
        Tag {
            id: "t1".to_string(),
            raw: "Paris café".to_string(),
            normalized: "pariscafe".to_string(),
            author: owner(),
        },
        Tag {
            id: "t1".to_string(),
            raw: "Paris café".to_string(),
            normalized: "pariscafe".to_string(),
            author: owner(),
        },
    ];
    photo.notes = vec![Note {
        id: "n1".to_string(),
        author: UserId("friend".to_string()),
        x: 10.0,
        y: 20.0,
        width: 50.0,
        height: 40.0,
        body: "This is me".to_string(),
    }];
    photo
}

pub fn listed(id: u64) -> ListedPhoto {
    ListedPhoto {
        id: PhotoId(id),
        secret: format!("secret{}", id),
        title: format!("Photo {}", id),
    }
}

pub fn photo_page(page: u32, pages: u32, ids: &[u64]) -> PhotoPage {
    PhotoPage {
        page,
        pages,
        photos: ids.iter().map(|id| listed(*id)).collect(),
        raw: json!({"photos": {"page": page, "pages": pages}, "stat": "ok"}),
    }
}

pub fn source_url(id: u64, label: &str) -> String {
    format!("https://live.example.org/{}_{}.jpg", id, label.to_lowercase())
}

pub fn sizes(id: u64, labels: &[&str]) -> Vec<Size> {
    labels
        .iter()
        .map(|label| Size {
            label: label.to_string(),
            source: source_url(id, label),
            width: 100,
            height: 100,
        })
        .collect()
}

pub enum MockPhotoServiceCase {
    IdentityOk,
    IdentityErr,
    /// Page, total pages, photo ids, times
    SearchOk(u32, u32, Vec<u64>, usize),
    SearchErr(u32),
    RecentlyUpdatedOk(u32, u32, Vec<u64>),
    /// Photo, times
    InfoOk(RemotePhoto, usize),
    InfoErr(u64),
    SizesOk(u64, Vec<&'static str>),
    /// Size label, times
    FetchOk(&'static str, usize),
    FetchErr(&'static str),
}

impl MockPhotoServiceCase {
    pub fn apply_multiples(mock: &mut MockPhotoService, cases: Vec<Self>) {
        for case in cases {
            case.apply(mock)
        }
    }

    pub fn apply(self, mock: &mut MockPhotoService) {
        match self {
            MockPhotoServiceCase::IdentityOk => {
                mock.expect_check_identity()
                    .times(1..)
                    .returning(|| Ok(owner()));
            }
            MockPhotoServiceCase::IdentityErr => {
                mock.expect_check_identity()
                    .times(1)
                    .returning(|| Err(ServiceError::AuthenticationError));
            }
            MockPhotoServiceCase::SearchOk(page, pages, ids, times) => {
                mock.expect_search()
                    .with(predicate::eq(owner()), predicate::eq(page))
                    .times(times)
                    .returning(move |_, _| Ok(photo_page(page, pages, &ids)));
            }
            MockPhotoServiceCase::SearchErr(page) => {
                mock.expect_search()
                    .with(predicate::always(), predicate::eq(page))
                    .times(1)
                    .returning(|_, _| Err(ServiceError::ConnectionError));
            }
            MockPhotoServiceCase::RecentlyUpdatedOk(page, pages, ids) => {
                mock.expect_recently_updated()
                    .with(predicate::always(), predicate::eq(page))
                    .times(1)
                    .returning(move |_, _| Ok(photo_page(page, pages, &ids)));
            }
            MockPhotoServiceCase::InfoOk(photo, times) => {
                mock.expect_get_info()
                    .with(predicate::eq(photo.id), predicate::always())
                    .times(times)
                    .returning(move |_, _| Ok(photo.clone()));
            }
            MockPhotoServiceCase::InfoErr(id) => {
                mock.expect_get_info()
                    .with(predicate::eq(PhotoId(id)), predicate::always())
                    .times(1)
                    .returning(|_, _| Err(ServiceError::PhotoNotFound));
            }
            MockPhotoServiceCase::SizesOk(id, labels) => {
                mock.expect_get_sizes()
                    .with(predicate::eq(PhotoId(id)))
                    .times(1)
                    .returning(move |_| Ok(sizes(id, &labels)));
            }
            MockPhotoServiceCase::FetchOk(label, times) => {
                let suffix = format!("_{}.jpg", label.to_lowercase());
                mock.expect_fetch_to_file()
                    .with(
                        predicate::function(move |url: &str| url.ends_with(&suffix)),
                        predicate::always(),
                    )
                    .times(times)
                    .returning(|_, path| {
                        fs::write(path, b"jpeg").map_err(|error| {
                            ServiceError::Transfer(path.to_path_buf(), error.to_string())
                        })
                    });
            }
            MockPhotoServiceCase::FetchErr(label) => {
                let suffix = format!("_{}.jpg", label.to_lowercase());
                mock.expect_fetch_to_file()
                    .with(
                        predicate::function(move |url: &str| url.ends_with(&suffix)),
                        predicate::always(),
                    )
                    .times(1)
                    .returning(|_, path| {
                        Err(ServiceError::Transfer(
                            path.to_path_buf(),
                            "connection reset".to_string(),
                        ))
                    });
            }
        }
    }
}
