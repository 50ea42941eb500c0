use std::{
    path::Path,
    time::{Duration, UNIX_EPOCH},
};

use anyhow::Result as AnyHowResult;

pub fn last_modified_timestamp(path: &Path) -> AnyHowResult<Duration> {
    let metadata = path.metadata()?;
    let modified = metadata.modified()?;
    Ok(modified.duration_since(UNIX_EPOCH)?)
}

/// Directory has no entry. A missing directory is an error
pub fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(std::fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::*;

    #[test]
    fn test_is_empty_dir() {
        let tmpdir_ = tmpdir();
        assert!(is_empty_dir(&tmpdir_).unwrap());

        write_file(&tmpdir_.join("a.jpg"));
        assert!(!is_empty_dir(&tmpdir_).unwrap());
        assert!(is_empty_dir(&tmpdir_.join("missing")).is_err());
    }
}
