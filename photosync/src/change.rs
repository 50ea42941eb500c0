use std::path::Path;

use crate::util::last_modified_timestamp;

/// Decide if a local file must be (re)fetched given the remote change
/// watermark (seconds since epoch). An unknown watermark always fetches.
pub fn needs_fetch(remote_last_modified: Option<i64>, local_path: &Path, force: bool) -> bool {
    if force {
        return true;
    }

    let remote_last_modified = match remote_last_modified {
        Some(timestamp) if timestamp > 0 => timestamp,
        _ => {
            log::debug!(
                "Unknown remote watermark for {}, fetch it",
                local_path.display()
            );
            return true;
        }
    };

    if !local_path.exists() {
        return true;
    }

    match last_modified_timestamp(local_path) {
        Ok(local_last_modified) => (local_last_modified.as_secs() as i64) < remote_last_modified,
        Err(error) => {
            log::warn!(
                "Unable to read modification time of {}, fetch it : {:#}",
                local_path.display(),
                error
            );
            true
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        fs,
        time::{Duration, SystemTime, UNIX_EPOCH},
    };

    use super::*;
    use crate::tests::*;

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    #[test]
    fn test_force_always_fetch() {
        let tmpdir_ = tmpdir();
        let path = tmpdir_.join("a.jpg");
        fs::write(&path, b"x").unwrap();

        assert!(needs_fetch(Some(1), &path, true));
        assert!(needs_fetch(Some(now() + 3600), &path, true));
        assert!(needs_fetch(None, &path, true));
    }

    #[test]
    fn test_missing_file() {
        let tmpdir_ = tmpdir();

        assert!(needs_fetch(Some(1), &tmpdir_.join("absent.jpg"), false));
    }

    #[test]
    fn test_unknown_watermark() {
        let tmpdir_ = tmpdir();
        let path = tmpdir_.join("a.jpg");
        fs::write(&path, b"x").unwrap();

        assert!(needs_fetch(Some(0), &path, false));
        assert!(needs_fetch(None, &path, false));
    }

    #[test]
    fn test_local_newer_than_remote() {
        let tmpdir_ = tmpdir();
        let path = tmpdir_.join("a.jpg");
        fs::write(&path, b"x").unwrap();

        assert!(!needs_fetch(Some(now() - 3600), &path, false));
    }

    #[test]
    fn test_local_older_than_remote() {
        let tmpdir_ = tmpdir();
        let path = tmpdir_.join("a.jpg");
        fs::write(&path, b"x").unwrap();
        set_modified(&path, SystemTime::now() - Duration::from_secs(7200));

        assert!(needs_fetch(Some(now() - 3600), &path, false));
    }
}
