use crate::error::{StudyError, StudyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Stem of the per-category reference image
pub const REFERENCE_STEM: &str = "groundtruth";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A directory of candidates sharing one reference image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub reference: PathBuf,
    pub pool: Vec<PathBuf>,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_reference(path: &Path) -> bool {
    path.file_stem().and_then(|s| s.to_str()) == Some(REFERENCE_STEM)
}

/// Lists candidate images in `dir`, skipping the reference image.
///
/// Sorted so that a seeded sampler draws the same trials every run.
pub fn load_pool(dir: &Path) -> StudyResult<Vec<PathBuf>> {
    let mut pool = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) && !is_reference(&path) {
            pool.push(path);
        }
    }

    pool.sort();
    tracing::debug!(dir = %dir.display(), candidates = pool.len(), "loaded pool");
    Ok(pool)
}

/// Finds the `groundtruth.<ext>` image in `dir`, extension in any case
pub fn find_reference(dir: &Path) -> StudyResult<PathBuf> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) && is_reference(&path) {
            found.push(path);
        }
    }

    found.sort();
    found
        .into_iter()
        .next()
        .ok_or_else(|| StudyError::MissingReference(dir.to_path_buf()))
}

/// Loads one category directory
pub fn load_category(dir: &Path) -> StudyResult<Category> {
    let reference = find_reference(dir)?;
    let pool = load_pool(dir)?;
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("category")
        .to_string();

    Ok(Category {
        name,
        reference,
        pool,
    })
}

/// Loads every configured category directory
pub fn load_categories(dirs: &[PathBuf]) -> StudyResult<Vec<Category>> {
    dirs.iter().map(|d| load_category(d)).collect()
}
