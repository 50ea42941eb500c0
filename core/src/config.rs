use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ini::Ini;
use strum::IntoEnumIterator;

use crate::{
    client::DEFAULT_PER_PAGE, security::get_token, types::RenditionKind, utils::strbool,
};

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub api_key: String,
    pub api_secret: String,
    pub auth_token: String,
    pub per_page: u32,
    pub destination: Option<PathBuf>,
    /// Enabled renditions, in declaration order
    pub renditions: Vec<RenditionKind>,
    pub dump_metadata: bool,
    pub embed_metadata: bool,
    pub scrub_backups: bool,
    pub force: bool,
    pub time_window: Option<String>,
    pub uri_alias: Option<String>,
}

impl BackupConfig {
    pub fn default_path() -> Result<PathBuf> {
        let user_home_folder_path = dirs::home_dir().context("Unable to determine home folder")?;
        Ok(if cfg!(target_os = "windows") {
            user_home_folder_path
                .join("AppData")
                .join("Local")
                .join("photosync.conf")
        } else {
            user_home_folder_path.join(".photosync.conf")
        })
    }

    pub fn from_file(config_file_path: &Path, allow_raw_token: bool) -> Result<Self> {
        let config_ini = Ini::load_from_file(config_file_path).context(format!(
            "Error when loading config file at '{}'",
            config_file_path.display()
        ))?;
        Self::from_ini(config_ini, allow_raw_token)
    }

    /// Api key only, readable before any token is stored
    pub fn read_api_key(config_file_path: &Path) -> Result<String> {
        let config_ini = Ini::load_from_file(config_file_path).context(format!(
            "Error when loading config file at '{}'",
            config_file_path.display()
        ))?;
        Ok(config_ini
            .section(Some("flickr"))
            .and_then(|flickr| flickr.get("api_key"))
            .context("Unable to read api_key config from flickr section")?
            .to_string())
    }

    pub fn from_ini(config_ini: Ini, allow_raw_token: bool) -> Result<Self> {
        Self::from_ini_with(config_ini, allow_raw_token, |api_key, username| {
            get_token(api_key, username).map_err(|error| anyhow::anyhow!("{}", error))
        })
    }

    /// Same as [`BackupConfig::from_ini`] but read the auth token from given source
    /// instead of the system keyring
    pub fn from_ini_with<F>(config_ini: Ini, allow_raw_token: bool, token_source: F) -> Result<Self>
    where
        F: Fn(&str, &str) -> Result<String>,
    {
        let os_username = whoami::username();
        let flickr = config_ini
            .section(Some("flickr"))
            .context("Missing \"flickr\" section in config")?;
        let api_key = flickr
            .get("api_key")
            .context("Unable to read api_key config from flickr section")?
            .to_string();
        let api_secret = flickr
            .get("api_secret")
            .context("Unable to read api_secret config from flickr section")?
            .to_string();
        let per_page = flickr
            .get("per_page")
            .map(|value| value.parse::<u32>())
            .transpose()
            .context("Unable to read per_page config from flickr section")?
            .unwrap_or(DEFAULT_PER_PAGE);

        let auth_token = match token_source(&api_key, &os_username) {
            Ok(token) => token,
            Err(error) => {
                if !allow_raw_token {
                    bail!(
                        "Unable to read token from keyring for api key '{}' and user '{}' : '{}'",
                        &api_key,
                        &os_username,
                        error
                    );
                }

                match flickr.get("auth_token") {
                    Some(token) => token.to_string(),
                    None => bail!(
                        "Unable to read token from keyring or config for api key '{}' and user '{}' : '{}'",
                        &api_key,
                        &os_username,
                        error
                    ),
                }
            }
        };

        let backup = config_ini.section(Some("backup"));
        let get = |key: &str| backup.and_then(|section| section.get(key));
        let enabled = |key: &str, default: bool| get(key).map(strbool).unwrap_or(default);
        let optional = |key: &str| {
            get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let renditions = RenditionKind::iter()
            .filter(|kind| enabled(kind.config_key(), kind.enabled_by_default()))
            .collect();

        Ok(Self {
            api_key,
            api_secret,
            auth_token,
            per_page,
            destination: optional("destination").map(PathBuf::from),
            renditions,
            dump_metadata: enabled("dump_metadata", true),
            embed_metadata: enabled("embed_metadata", false),
            scrub_backups: enabled("scrub_backups", false),
            force: enabled("force", false),
            time_window: optional("time_window"),
            uri_alias: optional("uri_alias"),
        })
    }
}
