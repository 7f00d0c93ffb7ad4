// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — one page per rendered image using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::RgbaImage;
use inkwell_core::PageSize;
use inkwell_core::error::{InkwellError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::export::write_atomic;

/// Points per inch; with this DPI an image's native size in points equals
/// its size in pixels.
const NATIVE_DPI: f32 = 72.0;

/// Packs rendered page images into a paginated PDF.
pub struct PdfWriter {
    /// Output page preset; every image is stretched to fill it.
    page_size: PageSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: "Inkwell Document".into(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.page_size.dimensions_mm();
        (Mm(w_mm), Mm(h_mm))
    }

    // -- Images to PDF --------------------------------------------------------

    /// Build a PDF with one page per image, each scaled to fill the page.
    #[instrument(skip(self, images), fields(pages = images.len(), page_size = ?self.page_size))]
    pub fn create_from_images(&self, images: &[RgbaImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(InkwellError::NothingToExport("no pages were rendered".into()));
        }
        let (page_w, page_h) = self.page_dimensions();
        let (page_w_pt, page_h_pt) = (page_w.into_pt().0, page_h.into_pt().0);
        info!(title = %self.title, "Creating image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(images.len());

        for image in images {
            let (width, height) = image.dimensions();
            if width == 0 || height == 0 {
                return Err(InkwellError::PdfError("cannot place an empty image".into()));
            }
            // printpdf takes RGB8; the rendered pages are opaque.
            let rgb: Vec<u8> = image
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let scale_x = page_w_pt / width as f32;
            let scale_y = page_h_pt / height as f32;
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    dpi: Some(NATIVE_DPI),
                    rotate: None,
                },
            }];
            debug!(width, height, scale_x, scale_y, "Image placed on page");
            pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");
        Ok(output)
    }

    // -- File output convenience ----------------------------------------------

    /// Build the PDF and write it to `path`. Nothing is written on failure.
    pub fn write_to_file(&self, images: &[RgbaImage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create_from_images(images)?;
        write_atomic(path.as_ref(), &bytes)?;
        info!("Wrote PDF to {}", path.as_ref().display());
        Ok(())
    }
}
