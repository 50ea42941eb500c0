use std::{collections::BTreeMap, io, path::Path, path::PathBuf, time::Duration};

use mockall::automock;
use reqwest::Method;
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{
    photo::{photo_page_url, ListedPhoto, Note, PhotoPage, RemotePhoto, Size, Tag},
    types::{PhotoId, UserId, Visibility},
};

pub const REST_ENDPOINT: &str = "https://api.flickr.com/services/rest/";
pub const DEFAULT_CLIENT_TIMEOUT: u64 = 30;
pub const DEFAULT_TRANSFER_TIMEOUT: u64 = 600;
pub const DEFAULT_PER_PAGE: u32 = 100;

pub const PHOTO_NOT_FOUND_ERR_CODE: u64 = 1;
pub const INVALID_AUTH_TOKEN_ERR_CODE: u64 = 98;
pub const INSUFFICIENT_PERMISSIONS_ERR_CODE: u64 = 99;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Photo not found")]
    PhotoNotFound,
    #[error("Authentication error")]
    AuthenticationError,
    #[error("Connection error")]
    ConnectionError,
    #[error("Timeout error")]
    TimeoutError,
    #[error("Api error {0}: `{1}`")]
    Api(u64, String),
    #[error("Invalid response: `{0}` (`{1}`)")]
    InvalidResponse(String, Value),
    #[error("Transfer into {0} failed: {1}")]
    Transfer(PathBuf, String),
    #[error("Unknown error: `{0}`")]
    Unknown(String),
}

impl ServiceError {
    fn from_failure(value: &Value) -> Self {
        let code = value["code"].as_u64().unwrap_or(0);
        let message = value["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        match code {
            PHOTO_NOT_FOUND_ERR_CODE => ServiceError::PhotoNotFound,
            INVALID_AUTH_TOKEN_ERR_CODE | INSUFFICIENT_PERMISSIONS_ERR_CODE => {
                ServiceError::AuthenticationError
            }
            _ => ServiceError::Api(code, message),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            return Self::ConnectionError;
        }

        if error.is_timeout() {
            return Self::TimeoutError;
        }

        Self::Unknown(error.to_string())
    }
}

/// Remote photo hosting account, as seen by the backup engine
#[automock]
pub trait PhotoService {
    fn check_identity(&self) -> Result<UserId, ServiceError>;
    fn search(&self, user_id: &UserId, page: u32) -> Result<PhotoPage, ServiceError>;
    fn recently_updated(&self, min_timestamp: i64, page: u32) -> Result<PhotoPage, ServiceError>;
    fn get_info(&self, photo_id: PhotoId, secret: &str) -> Result<RemotePhoto, ServiceError>;
    fn get_sizes(&self, photo_id: PhotoId) -> Result<Vec<Size>, ServiceError>;
    fn fetch_to_file(&self, source_url: &str, path: &Path) -> Result<(), ServiceError>;
}

pub struct Flickr {
    endpoint: String,
    api_key: String,
    api_secret: String,
    auth_token: String,
    per_page: u32,
    client: reqwest::blocking::Client,
    transfer_client: reqwest::blocking::Client,
}

impl Flickr {
    pub fn new(
        api_key: String,
        api_secret: String,
        auth_token: String,
        per_page: u32,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_CLIENT_TIMEOUT))
            .build()?;
        let transfer_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT))
            .build()?;
        Ok(Self {
            endpoint: REST_ENDPOINT.to_string(),
            api_key,
            api_secret,
            auth_token,
            per_page,
            client,
            transfer_client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn signed_parameters(
        &self,
        method: &str,
        parameters: &[(&'static str, String)],
    ) -> BTreeMap<&'static str, String> {
        let mut signed = BTreeMap::new();
        signed.insert("method", method.to_string());
        signed.insert("api_key", self.api_key.clone());
        signed.insert("auth_token", self.auth_token.clone());
        signed.insert("format", "json".to_string());
        signed.insert("nojsoncallback", "1".to_string());
        for (key, value) in parameters {
            signed.insert(*key, value.clone());
        }
        let api_sig = signature(&self.api_secret, &signed);
        signed.insert("api_sig", api_sig);
        signed
    }

    fn call(
        &self,
        method: &str,
        parameters: &[(&'static str, String)],
    ) -> Result<Value, ServiceError> {
        log::debug!("Call remote method {}", method);
        let response = self
            .client
            .request(Method::GET, &self.endpoint)
            .query(&self.signed_parameters(method, parameters))
            .send()?;

        let status_code = response.status().as_u16();
        if status_code != 200 {
            let text = response.text()?;
            return Err(ServiceError::Unknown(format!(
                "Unexpected response status {} for {} : '{}'",
                status_code, method, text
            )));
        }

        let value = response.json::<Value>()?;
        match value["stat"].as_str() {
            Some("ok") => Ok(value),
            Some("fail") => Err(ServiceError::from_failure(&value)),
            _ => Err(ServiceError::InvalidResponse(
                "Response stat is missing".to_string(),
                value.clone(),
            )),
        }
    }

    fn page_parameters(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("page", page.to_string()),
            ("per_page", self.per_page.to_string()),
            ("extras", "last_update".to_string()),
        ]
    }
}

impl PhotoService for Flickr {
    fn check_identity(&self) -> Result<UserId, ServiceError> {
        let value = self.call("flickr.test.login", &[])?;
        let user_id = value["user"]["id"]
            .as_str()
            .ok_or(ServiceError::InvalidResponse(
                "Response user id is not a string".to_string(),
                value["user"].clone(),
            ))?;
        Ok(UserId(user_id.to_string()))
    }

    fn search(&self, user_id: &UserId, page: u32) -> Result<PhotoPage, ServiceError> {
        let mut parameters = self.page_parameters(page);
        parameters.push(("user_id", user_id.0.clone()));
        parameters.push(("sort", "date-posted-asc".to_string()));
        parse_page(self.call("flickr.photos.search", &parameters)?)
    }

    fn recently_updated(&self, min_timestamp: i64, page: u32) -> Result<PhotoPage, ServiceError> {
        let mut parameters = self.page_parameters(page);
        parameters.push(("min_date", min_timestamp.to_string()));
        parse_page(self.call("flickr.photos.recentlyUpdated", &parameters)?)
    }

    fn get_info(&self, photo_id: PhotoId, secret: &str) -> Result<RemotePhoto, ServiceError> {
        let value = self.call(
            "flickr.photos.getInfo",
            &[
                ("photo_id", photo_id.to_string()),
                ("secret", secret.to_string()),
            ],
        )?;
        parse_info(&value["photo"])
    }

    fn get_sizes(&self, photo_id: PhotoId) -> Result<Vec<Size>, ServiceError> {
        let value = self.call(
            "flickr.photos.getSizes",
            &[("photo_id", photo_id.to_string())],
        )?;
        parse_sizes(&value)
    }

    fn fetch_to_file(&self, source_url: &str, path: &Path) -> Result<(), ServiceError> {
        let transfer_error =
            |error: &dyn std::fmt::Display| ServiceError::Transfer(path.to_path_buf(), error.to_string());

        let mut response = self.transfer_client.get(source_url).send()?;
        let status_code = response.status().as_u16();
        if status_code != 200 {
            return Err(ServiceError::Unknown(format!(
                "Unexpected response status {} when download {}",
                status_code, source_url
            )));
        }

        let folder = path
            .parent()
            .ok_or_else(|| transfer_error(&"no parent folder"))?;
        let mut out = NamedTempFile::new_in(folder).map_err(|error| transfer_error(&error))?;
        io::copy(&mut response, &mut out).map_err(|error| transfer_error(&error))?;
        out.persist(path)
            .map_err(|error| transfer_error(&error.error))?;

        Ok(())
    }
}

fn signature(api_secret: &str, parameters: &BTreeMap<&'static str, String>) -> String {
    let mut raw = api_secret.to_string();
    for (key, value) in parameters {
        raw.push_str(key);
        raw.push_str(value);
    }
    format!("{:x}", md5::compute(raw))
}

/// Read a value the remote encodes either as a JSON string or a JSON number
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i64> {
    text(value).and_then(|value| value.trim().parse().ok())
}

fn float(value: &Value) -> f64 {
    text(value)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0)
}

fn flag(value: &Value) -> bool {
    integer(value).unwrap_or(0) != 0
}

fn content(value: &Value) -> String {
    text(&value["_content"]).unwrap_or_default()
}

fn photo_id(value: &Value) -> Result<PhotoId, ServiceError> {
    text(value)
        .and_then(|raw| raw.parse().ok())
        .ok_or(ServiceError::InvalidResponse(
            "Photo id is not numeric".to_string(),
            value.clone(),
        ))
}

fn items<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value[key].as_array().into_iter().flatten()
}

pub fn parse_page(value: Value) -> Result<PhotoPage, ServiceError> {
    let photos_value = &value["photos"];
    if !photos_value.is_object() {
        return Err(ServiceError::InvalidResponse(
            "Response do not contains photos".to_string(),
            value.clone(),
        ));
    }

    let page = integer(&photos_value["page"]).unwrap_or(1) as u32;
    let pages = integer(&photos_value["pages"]).unwrap_or(0) as u32;
    let mut photos = vec![];
    for photo in items(photos_value, "photo") {
        photos.push(ListedPhoto {
            id: photo_id(&photo["id"])?,
            secret: text(&photo["secret"]).unwrap_or_default(),
            title: text(&photo["title"]).unwrap_or_default(),
        });
    }

    Ok(PhotoPage {
        page,
        pages,
        photos,
        raw: value,
    })
}

pub fn parse_info(value: &Value) -> Result<RemotePhoto, ServiceError> {
    if !value.is_object() {
        return Err(ServiceError::InvalidResponse(
            "Response photo is not an object".to_string(),
            value.clone(),
        ));
    }

    let id = photo_id(&value["id"])?;
    let owner = UserId(text(&value["owner"]["nsid"]).unwrap_or_default());
    let mut photo = RemotePhoto::new(id, text(&value["secret"]).unwrap_or_default(), owner);

    photo.title = content(&value["title"]);
    photo.description = content(&value["description"]);
    photo.taken = text(&value["dates"]["taken"]);
    photo.posted = integer(&value["dates"]["posted"]);
    photo.last_update = integer(&value["dates"]["lastupdate"]);
    photo.license = text(&value["license"]);
    photo.visibility = Visibility {
        is_public: flag(&value["visibility"]["ispublic"]),
        is_family: flag(&value["visibility"]["isfamily"]),
        is_friend: flag(&value["visibility"]["isfriend"]),
    };
    photo.tags = items(&value["tags"], "tag")
        .map(|tag| Tag {
            id: text(&tag["id"]).unwrap_or_default(),
            raw: text(&tag["raw"]).unwrap_or_default(),
            normalized: content(tag),
            author: UserId(text(&tag["author"]).unwrap_or_default()),
        })
        .collect();
    photo.notes = items(&value["notes"], "note")
        .map(|note| Note {
            id: text(&note["id"]).unwrap_or_default(),
            author: UserId(text(&note["author"]).unwrap_or_default()),
            x: float(&note["x"]),
            y: float(&note["y"]),
            width: float(&note["w"]),
            height: float(&note["h"]),
            body: content(note),
        })
        .collect();
    photo.page_url = items(&value["urls"], "url")
        .find(|url| url["type"].as_str() == Some("photopage"))
        .map(content)
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| photo_page_url(&photo.owner, id));

    Ok(photo)
}

pub fn parse_sizes(value: &Value) -> Result<Vec<Size>, ServiceError> {
    let sizes_value = &value["sizes"];
    if !sizes_value.is_object() {
        return Err(ServiceError::InvalidResponse(
            "Response do not contains sizes".to_string(),
            value.clone(),
        ));
    }

    Ok(items(sizes_value, "size")
        .filter_map(|size| {
            Some(Size {
                label: text(&size["label"])?,
                source: text(&size["source"])?,
                width: integer(&size["width"]).unwrap_or(0) as u32,
                height: integer(&size["height"]).unwrap_or(0) as u32,
            })
        })
        .collect())
}

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    /// Answer one request with given json body, return the endpoint to call
    fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/services/rest/", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![];
            let mut buffer = [0; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut buffer).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        endpoint
    }

    fn flickr(endpoint: String) -> Flickr {
        Flickr::new(
            "key".to_string(),
            "secret".to_string(),
            "token".to_string(),
            DEFAULT_PER_PAGE,
        )
        .unwrap()
        .with_endpoint(endpoint)
    }

    #[test]
    fn test_call_ok() {
        let endpoint = serve_once(r#"{"stat": "ok", "user": {"id": "12345678@N00"}}"#);

        let user_id = flickr(endpoint).check_identity().unwrap();

        assert_eq!(user_id, UserId("12345678@N00".to_string()));
    }

    #[rstest]
    #[case(
        r#"{"stat": "fail", "code": 98, "message": "Invalid auth token"}"#,
        "Authentication error"
    )]
    #[case(
        r#"{"stat": "fail", "code": 1, "message": "Photo not found"}"#,
        "Photo not found"
    )]
    #[case(
        r#"{"stat": "fail", "code": 105, "message": "Service currently unavailable"}"#,
        "Api error 105: `Service currently unavailable`"
    )]
    fn test_call_failure(#[case] body: &'static str, #[case] expected: &str) {
        let endpoint = serve_once(body);

        let error = flickr(endpoint).check_identity().unwrap_err();

        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_call_without_stat() {
        let endpoint = serve_once(r#"{"user": {"id": "12345678@N00"}}"#);

        let error = flickr(endpoint).check_identity().unwrap_err();

        assert!(matches!(error, ServiceError::InvalidResponse(_, _)));
    }

    #[test]
    fn test_signature_sorts_parameters() {
        let mut parameters = BTreeMap::new();
        parameters.insert("method", "flickr.test.login".to_string());
        parameters.insert("api_key", "key".to_string());

        assert_eq!(
            signature("secret", &parameters),
            format!(
                "{:x}",
                md5::compute("secretapi_keykeymethodflickr.test.login")
            )
        );
    }

    #[test]
    fn test_parse_page_with_string_counters() {
        let page = parse_page(json!({
            "photos": {
                "page": 2,
                "pages": "7",
                "photo": [
                    {"id": "30763528", "secret": "abc", "title": "Sunset"},
                    {"id": "30763529", "secret": "def", "title": ""},
                ]
            },
            "stat": "ok"
        }))
        .unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 7);
        assert_eq!(
            page.photos,
            vec![
                ListedPhoto {
                    id: PhotoId(30763528),
                    secret: "abc".to_string(),
                    title: "Sunset".to_string()
                },
                ListedPhoto {
                    id: PhotoId(30763529),
                    secret: "def".to_string(),
                    title: "".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_page_without_photos() {
        assert!(parse_page(json!({"stat": "ok"})).is_err())
    }

    #[test]
    fn test_parse_info() {
        let photo = parse_info(&json!({
            "id": "123",
            "secret": "s3cr3t",
            "license": "4",
            "owner": {"nsid": "12037949754@N01"},
            "title": {"_content": "Café"},
            "description": {"_content": "A description"},
            "visibility": {"ispublic": 0, "isfriend": 1, "isfamily": 0},
            "dates": {"posted": "1141466400", "taken": "2006-03-04 10:00:00", "lastupdate": "1141470000"},
            "tags": {"tag": [
                {"id": "1-123-1", "author": "12037949754@N01", "raw": "Mont Blanc", "_content": "montblanc"}
            ]},
            "notes": {"note": [
                {"id": "9", "author": "12037949754@N01", "x": "10", "y": "20", "w": "50", "h": "40", "_content": "Look"}
            ]},
            "urls": {"url": [{"type": "photopage", "_content": "https://www.flickr.com/photos/someone/123/"}]}
        }))
        .unwrap();

        assert_eq!(photo.id, PhotoId(123));
        assert_eq!(photo.title, "Café");
        assert_eq!(photo.taken, Some("2006-03-04 10:00:00".to_string()));
        assert_eq!(photo.posted, Some(1141466400));
        assert_eq!(photo.last_update, Some(1141470000));
        assert_eq!(photo.license, Some("4".to_string()));
        assert_eq!(
            photo.visibility,
            Visibility {
                is_public: false,
                is_family: false,
                is_friend: true,
            }
        );
        assert_eq!(photo.visibility.classification(), "friend");
        assert_eq!(photo.tags[0].normalized, "montblanc");
        assert_eq!(photo.tags[0].raw, "Mont Blanc");
        assert_eq!(photo.notes[0].width, 50.0);
        assert_eq!(photo.notes[0].body, "Look");
        assert_eq!(photo.page_url, "https://www.flickr.com/photos/someone/123/");
    }

    #[test]
    fn test_parse_info_builds_page_url_when_missing() {
        let photo = parse_info(&json!({"id": 5, "owner": {"nsid": "me"}})).unwrap();

        assert_eq!(photo.page_url, "https://www.flickr.com/photos/me/5/");
        assert_eq!(photo.last_update, None);
        assert!(photo.tags.is_empty());
    }

    #[test]
    fn test_parse_sizes() {
        let sizes = parse_sizes(&json!({
            "sizes": {"size": [
                {"label": "Square", "width": 75, "height": 75, "source": "https://live.example/1_s.jpg"},
                {"label": "Original", "width": "2048", "height": "1536", "source": "https://live.example/1_o.jpg"},
            ]},
            "stat": "ok"
        }))
        .unwrap();

        assert_eq!(
            sizes,
            vec![
                Size {
                    label: "Square".to_string(),
                    source: "https://live.example/1_s.jpg".to_string(),
                    width: 75,
                    height: 75
                },
                Size {
                    label: "Original".to_string(),
                    source: "https://live.example/1_o.jpg".to_string(),
                    width: 2048,
                    height: 1536
                },
            ]
        )
    }

    #[test]
    fn test_failure_codes() {
        assert!(matches!(
            ServiceError::from_failure(&json!({"stat": "fail", "code": 98, "message": "Invalid auth token"})),
            ServiceError::AuthenticationError
        ));
        assert!(matches!(
            ServiceError::from_failure(&json!({"stat": "fail", "code": 1, "message": "Photo not found"})),
            ServiceError::PhotoNotFound
        ));
        assert!(matches!(
            ServiceError::from_failure(&json!({"stat": "fail", "code": 105, "message": "Service unavailable"})),
            ServiceError::Api(105, _)
        ));
    }
}
