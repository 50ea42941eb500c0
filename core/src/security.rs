extern crate keyring;

use std::error::Error;

pub fn get_token(api_key: &str, username: &str) -> Result<String, Box<dyn Error>> {
    let service = format!("photosync::{}", api_key);
    let entry = keyring::Entry::new(&service, username);
    log::debug!(
        "Get token for service '{}' and user '{}'",
        &service,
        &username
    );
    Ok(entry.get_password()?)
}

pub fn set_token(api_key: &str, username: &str, token: &str) -> Result<(), Box<dyn Error>> {
    let service = format!("photosync::{}", api_key);
    let entry = keyring::Entry::new(&service, username);
    log::info!(
        "Store token for service '{}' and user '{}'",
        &service,
        &username
    );
    entry.set_password(token)?;
    Ok(())
}
