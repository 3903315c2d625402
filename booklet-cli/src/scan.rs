use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Clone, Serialize)]
pub struct PageImage {
    #[serde(skip)]
    pub path: PathBuf,
    pub file: String,
    /// Pixel size, when the image header could be read.
    pub size: Option<(u32, u32)>,
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| PAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lists the page images of one panel folder, sorted by file name.
pub fn scan_panel(dir: &Path) -> Result<Vec<PageImage>> {
    if !dir.is_dir() {
        bail!("panel folder {} does not exist", dir.display());
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_page_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let pages: Vec<PageImage> = paths
        .into_par_iter()
        .map(|path| {
            let size = match image::image_dimensions(&path) {
                Ok(size) => Some(size),
                Err(e) => {
                    warn!(path = %path.display(), "Could not read image size: {e}");
                    None
                }
            };
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            PageImage { path, file, size }
        })
        .collect();
    debug!(dir = %dir.display(), pages = pages.len(), "Scanned panel");
    Ok(pages)
}

/// Largest width and height over all readable pages.
pub fn fit_size<'a>(pages: impl IntoIterator<Item = &'a PageImage>) -> Option<(u32, u32)> {
    pages
        .into_iter()
        .filter_map(|p| p.size)
        .reduce(|(w, h), (pw, ph)| (w.max(pw), h.max(ph)))
}
