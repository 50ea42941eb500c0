use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Result};
use env_logger::Env;
use photosync::context::Context;
use photosync::metadata::embed::ExifTool;
use photosync::run::Backup;
use photosync_core::config::BackupConfig;
use photosync_core::security::set_token;
use photosync_core::types::PhotoId;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "photosync")]
struct Opt {
    /// Config file, default to ~/.photosync.conf
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(long, parse(from_os_str))]
    destination: Option<PathBuf>,

    /// Fetch every rendition and sidecar, even unchanged ones
    #[structopt(long)]
    force: bool,

    /// Delete local backup files which are no more part of the account
    #[structopt(long)]
    scrub: bool,

    /// Only backup photos updated during this window, like `3d` or `2w`
    #[structopt(long)]
    time_window: Option<String>,

    /// Backup this photo only
    #[structopt(long, requires = "secret")]
    photo: Option<PhotoId>,

    #[structopt(long)]
    secret: Option<String>,

    /// Use `auth_token` of config file when the keyring has no token
    #[structopt(long)]
    allow_raw_token: bool,

    /// Prompt for an auth token and save it into the keyring, then exit
    #[structopt(long)]
    store_token: bool,
}

impl Opt {
    fn to_context(&self, config: BackupConfig) -> Context {
        let mut context = Context::new(config);
        if let Some(destination) = &self.destination {
            context.destination = Some(destination.clone());
        }
        if let Some(time_window) = &self.time_window {
            context.time_window = Some(time_window.clone());
        }
        context.force |= self.force;
        context.scrub_backups |= self.scrub;
        context
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();
    let config_path = match &opt.config {
        Some(config_path) => config_path.clone(),
        None => BackupConfig::default_path()?,
    };

    if opt.store_token {
        let api_key = BackupConfig::read_api_key(&config_path)?;
        let token = rpassword::prompt_password("Flickr auth token ? ")?;
        set_token(&api_key, &whoami::username(), &token)
            .map_err(|error| anyhow!("Unable to store token: {}", error))?;
        return Ok(());
    }

    let context = opt.to_context(BackupConfig::from_file(&config_path, opt.allow_raw_token)?);
    log::debug!("{:?}", &context);
    let client = context.client()?;
    let mut backup = Backup::new(context.clone(), Box::new(client));
    if context.embed_metadata {
        backup = backup.with_embedder(Box::new(ExifTool::new()));
    }

    let succeed = match (opt.photo, &opt.secret) {
        (Some(photo_id), Some(secret)) => backup.run_backup_for_photo(photo_id, secret),
        _ => backup.run_backup(),
    };

    log::info!("Exit application");
    if !succeed {
        process::exit(1);
    }
    Ok(())
}
