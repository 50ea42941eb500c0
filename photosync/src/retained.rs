use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use photosync_core::types::PhotoId;

/// Paths a run wrote or confirmed, per photo. Built from scratch on each run
/// and only handed to the scrubber once the run completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetainedSet {
    paths: HashMap<PhotoId, Vec<PathBuf>>,
}

impl RetainedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, photo_id: PhotoId, path: PathBuf) {
        let paths = self.paths.entry(photo_id).or_default();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    pub fn claim_all(&mut self, photo_id: PhotoId, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            self.claim(photo_id, path)
        }
    }

    pub fn retains(&self, photo_id: PhotoId, path: &Path) -> bool {
        self.paths
            .get(&photo_id)
            .map(|paths| paths.iter().any(|retained| retained == path))
            .unwrap_or(false)
    }

    pub fn paths(&self, photo_id: PhotoId) -> &[PathBuf] {
        self.paths
            .get(&photo_id)
            .map(|paths| paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_claim() {
        let mut retained = RetainedSet::new();
        retained.claim(PhotoId(1), PathBuf::from("/b/a.jpg"));
        retained.claim(PhotoId(1), PathBuf::from("/b/a.jpg"));
        retained.claim(PhotoId(1), PathBuf::from("/b/a.xml"));

        assert_eq!(retained.len(), 1);
        assert_eq!(retained.paths(PhotoId(1)).len(), 2);
        assert!(retained.retains(PhotoId(1), Path::new("/b/a.xml")));
        assert!(!retained.retains(PhotoId(2), Path::new("/b/a.xml")));
        assert!(retained.paths(PhotoId(2)).is_empty());
    }
}
