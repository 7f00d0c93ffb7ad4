// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image export — PNG encoding and atomic file writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use inkwell_core::error::{InkwellError, Result};
use tracing::{info, instrument};

use crate::render::RenderedPage;

/// Encode a page as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| InkwellError::ImageError(format!("PNG encoding failed: {}", err)))?;
    Ok(buffer)
}

/// Write `bytes` to a temporary file beside `path`, then rename it into
/// place. A failed write leaves any existing file at `path` untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| InkwellError::Io(err.error))?;
    Ok(())
}

/// Write each rendered page to `dir` as `{stem}-001.png`, `{stem}-002.png`,
/// and so on. Returns the paths written.
#[instrument(skip(pages), fields(pages = pages.len(), dir = %dir.as_ref().display()))]
pub fn export_pngs(pages: &[RenderedPage], dir: impl AsRef<Path>, stem: &str) -> Result<Vec<PathBuf>> {
    if pages.is_empty() {
        return Err(InkwellError::NothingToExport("no pages were rendered".into()));
    }
    std::fs::create_dir_all(dir.as_ref())?;

    // Encode everything first so a failure part-way writes nothing.
    let encoded = pages
        .iter()
        .map(|page| encode_png(&page.image))
        .collect::<Result<Vec<_>>>()?;

    let mut written = Vec::with_capacity(encoded.len());
    for (n, bytes) in encoded.iter().enumerate() {
        let path = dir.as_ref().join(format!("{stem}-{:03}.png", n + 1));
        write_atomic(&path, bytes)?;
        written.push(path);
    }
    info!(files = written.len(), "PNG pages written");
    Ok(written)
}
