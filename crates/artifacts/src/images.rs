use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use storefront_core::ids::{normalize, ItemId};

use crate::error::ArtifactError;

const EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// Product images found under an images directory, keyed by item.
///
/// Images live in `<dir>/<first 3 id chars>/<id>.<ext>`. The directory is scanned
/// once so serving a card never touches the filesystem.
#[derive(Clone, Debug, Default)]
pub struct ImageIndex {
    paths: HashMap<ItemId, PathBuf>,
}

impl ImageIndex {
    /// Index every bucketed image under `images_dir`. A missing directory is an
    /// empty index. JPEG wins over PNG for the same item.
    pub fn scan(images_dir: &Path) -> Result<Self, ArtifactError> {
        let mut index = Self::default();
        let buckets = match fs::read_dir(images_dir) {
            Ok(buckets) => buckets,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(index),
            Err(source) => return Err(io_error(images_dir, source)),
        };

        for bucket in buckets {
            let bucket = bucket.map_err(|source| io_error(images_dir, source))?.path();
            if !bucket.is_dir() {
                continue;
            }
            let entries = fs::read_dir(&bucket).map_err(|source| io_error(&bucket, source))?;
            for entry in entries {
                let path = entry.map_err(|source| io_error(&bucket, source))?.path();
                index.insert(&bucket, path);
            }
        }
        Ok(index)
    }

    fn insert(&mut self, bucket: &Path, path: PathBuf) {
        let Some(rank) = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| EXTENSIONS.iter().position(|known| *known == extension))
        else {
            return;
        };
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else { return };

        let item = normalize(stem);
        if bucket.file_name().and_then(|name| name.to_str()) != Some(bucket_of(&item)) {
            return;
        }

        let keep_existing = self.paths.get(&item).is_some_and(|existing| {
            existing
                .extension()
                .and_then(|extension| extension.to_str())
                .and_then(|extension| EXTENSIONS.iter().position(|known| *known == extension))
                .is_some_and(|existing_rank| existing_rank <= rank)
        });
        if !keep_existing {
            self.paths.insert(item, path);
        }
    }

    pub fn get(&self, item: &ItemId) -> Option<&Path> {
        self.paths.get(item).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn bucket_of(item: &ItemId) -> &str {
    let id = item.as_str();
    id.char_indices().nth(3).map_or(id, |(end, _)| &id[..end])
}

fn io_error(path: &Path, source: io::Error) -> ArtifactError {
    ArtifactError::Io { path: path.to_path_buf(), source }
}
