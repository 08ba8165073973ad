use jwalk::WalkDir;
use log::debug;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Finds the image file an annotation refers to inside a batch image tree.
///
/// Annotation files either carry the sequence folder in `file_name`
/// (`seq_3/frame_00001.png`) or only the bare frame name. The first form is
/// joined directly, the second is looked up by file name in a sorted walk of
/// the tree. The walk happens at most once per resolver.
pub struct PathResolver {
    image_root: PathBuf,
    by_file_name: Option<HashMap<OsString, PathBuf>>,
}

impl PathResolver {
    pub fn new(image_root: impl Into<PathBuf>) -> Self {
        Self {
            image_root: image_root.into(),
            by_file_name: None,
        }
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    /// Returns `None` when neither layout yields an existing file.
    pub fn resolve(&mut self, declared: &str) -> Option<PathBuf> {
        let direct = self.image_root.join(declared);
        if direct.is_file() {
            return Some(direct);
        }

        let file_name = Path::new(declared).file_name()?;
        let root = &self.image_root;
        let index = self
            .by_file_name
            .get_or_insert_with(|| index_files_by_name(root));
        index.get(file_name).cloned()
    }
}

// First occurrence wins, in sorted depth-first order
fn index_files_by_name(root: &Path) -> HashMap<OsString, PathBuf> {
    let mut index = HashMap::new();
    for entry in WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        index
            .entry(entry.file_name().to_os_string())
            .or_insert_with(|| entry.path());
    }
    debug!("Indexed {} files under {}", index.len(), root.display());
    index
}
