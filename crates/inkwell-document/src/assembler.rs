// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — captures immutable page snapshots and renders them in
// order. Rendering can be cancelled between pages; a cancelled render never
// returns partial output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use inkwell_core::config::{EffectConfig, StyleConfig};
use inkwell_core::document::PageContent;
use inkwell_core::error::{InkwellError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::markup::{Compiled, compile_with_diagnostics};
use crate::render::{PageRenderer, RenderedPage};

// -- Page ---------------------------------------------------------------------

/// An immutable snapshot of content and configuration, the unit of export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub content: PageContent,
    pub style: StyleConfig,
    pub effects: EffectConfig,
}

impl Page {
    /// Copy the given content and configuration into a new page.
    pub fn capture(content: PageContent, style: &StyleConfig, effects: &EffectConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            content,
            style: style.clone(),
            effects: effects.clone(),
        }
    }
}

// -- Live content -------------------------------------------------------------

/// Whatever is currently being edited. Snapshotted when a page is captured.
pub trait LiveContent: Sync {
    fn snapshot(&self) -> (PageContent, StyleConfig, EffectConfig);
}

/// Editable state: the three content regions plus the active configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditingSession {
    pub content: PageContent,
    pub style: StyleConfig,
    pub effects: EffectConfig,
}

impl EditingSession {
    pub fn new(style: StyleConfig, effects: EffectConfig) -> Self {
        Self {
            content: PageContent::default(),
            style,
            effects,
        }
    }

    /// Replace the main region with compiled markup. Returns the compiler's
    /// anomalies.
    pub fn set_markup(&mut self, text: &str) -> Compiled {
        let compiled = compile_with_diagnostics(text);
        self.content.main = compiled.tree.clone();
        compiled
    }

    pub fn set_header(&mut self, text: &str) -> Compiled {
        let compiled = compile_with_diagnostics(text);
        self.content.header = compiled.tree.clone();
        compiled
    }

    pub fn set_side_notes(&mut self, text: &str) -> Compiled {
        let compiled = compile_with_diagnostics(text);
        self.content.side_notes = compiled.tree.clone();
        compiled
    }
}

impl LiveContent for EditingSession {
    fn snapshot(&self) -> (PageContent, StyleConfig, EffectConfig) {
        (self.content.clone(), self.style.clone(), self.effects.clone())
    }
}

// -- Cancellation -------------------------------------------------------------

/// Shared flag checked between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// -- Assembler ----------------------------------------------------------------

/// The pages of the active document, in capture order.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    pages: Vec<Page>,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the live state as a new page at the end of the document.
    #[instrument(skip_all, fields(pages = self.pages.len()))]
    pub fn capture_page(&mut self, live: &dyn LiveContent) -> &Page {
        let (content, style, effects) = live.snapshot();
        self.push(Page::capture(content, &style, &effects))
    }

    /// Append an already captured page.
    pub fn push(&mut self, page: Page) -> &Page {
        info!(page = %page.id, index = self.pages.len(), "Page captured");
        self.pages.push(page);
        &self.pages[self.pages.len() - 1]
    }

    /// Drop every captured page.
    pub fn new_document(&mut self) {
        debug!(dropped = self.pages.len(), "New document");
        self.pages.clear();
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Capture the live state when the document has no pages yet.
    fn ensure_pages(&mut self, live: &dyn LiveContent) {
        if self.pages.is_empty() {
            info!("No captured pages, capturing live content");
            self.capture_page(live);
        }
    }

    /// Render every page in order. With no pages, the live state is
    /// captured first, so the result always holds at least one image.
    #[instrument(skip_all)]
    pub fn render_document(
        &mut self,
        live: &dyn LiveContent,
        renderer: &PageRenderer,
        cancel: &CancelToken,
    ) -> Result<Vec<RenderedPage>> {
        self.ensure_pages(live);
        let total = self.pages.len();
        let mut rendered = Vec::with_capacity(total);

        for (index, page) in self.pages.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed = index, total, "Render cancelled");
                return Err(InkwellError::Cancelled {
                    completed: index,
                    total,
                });
            }
            rendered.push(renderer.render(page, index)?);
        }

        info!(pages = total, "Document rendered");
        Ok(rendered)
    }

    /// Like `render_document`, with each page rendered on the blocking pool
    /// so the calling runtime stays responsive.
    #[instrument(skip_all)]
    pub async fn render_document_async(
        &mut self,
        live: &dyn LiveContent,
        renderer: &PageRenderer,
        cancel: &CancelToken,
    ) -> Result<Vec<RenderedPage>> {
        self.ensure_pages(live);
        let total = self.pages.len();
        let mut rendered = Vec::with_capacity(total);

        for (index, page) in self.pages.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed = index, total, "Render cancelled");
                return Err(InkwellError::Cancelled {
                    completed: index,
                    total,
                });
            }
            let renderer = renderer.clone();
            let page = page.clone();
            let result = tokio::task::spawn_blocking(move || renderer.render(&page, index))
                .await
                .map_err(|err| InkwellError::RenderTask(err.to_string()))?;
            rendered.push(result?);
        }

        info!(pages = total, "Document rendered");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_core::config::RenderConfig;

    fn session(markup: &str) -> EditingSession {
        let mut session = EditingSession::new(StyleConfig::default(), EffectConfig::disabled());
        session.set_markup(markup);
        session
    }

    fn renderer() -> PageRenderer {
        PageRenderer::builtin(RenderConfig {
            scale: 0.5,
            seed: Some(3),
            ..RenderConfig::default()
        })
    }

    #[test]
    fn captured_pages_do_not_follow_later_edits() {
        let mut live = session("first");
        let mut assembler = DocumentAssembler::new();
        let id = assembler.capture_page(&live).id;
        live.set_markup("second");
        live.style.font_size = 30.0;
        let page = &assembler.pages()[0];
        assert_eq!(page.id, id);
        assert_eq!(page.content.main.plain_text(), "first");
        assert_eq!(page.style.font_size, 16.0);
    }

    #[test]
    fn new_document_then_render_captures_live_content() {
        let live = session("still here");
        let mut assembler = DocumentAssembler::new();
        assembler.capture_page(&live);
        assembler.capture_page(&live);
        assembler.new_document();
        assert!(assembler.is_empty());

        let rendered = assembler
            .render_document(&live, &renderer(), &CancelToken::new())
            .expect("render");
        assert_eq!(rendered.len(), 1);
        assert_eq!(assembler.len(), 1);
    }

    #[test]
    fn pages_render_in_capture_order() {
        let mut assembler = DocumentAssembler::new();
        for text in ["one", "two", "three"] {
            assembler.capture_page(&session(text));
        }
        let rendered = assembler
            .render_document(&session(""), &renderer(), &CancelToken::new())
            .expect("render");
        let ids: Vec<Uuid> = assembler.pages().iter().map(|p| p.id).collect();
        let rendered_ids: Vec<Uuid> = rendered.iter().map(|r| r.page_id).collect();
        assert_eq!(ids, rendered_ids);
        assert_eq!(rendered[2].index, 2);
    }

    #[test]
    fn cancelled_render_is_an_error() {
        let mut assembler = DocumentAssembler::new();
        assembler.capture_page(&session("a"));
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = assembler
            .render_document(&session(""), &renderer(), &cancel)
            .expect_err("cancelled");
        assert!(matches!(err, InkwellError::Cancelled { completed: 0, total: 1 }));
    }

    #[tokio::test]
    async fn async_render_matches_sync_render() {
        let mut assembler = DocumentAssembler::new();
        assembler.capture_page(&session("async page"));
        assembler.capture_page(&session("another"));
        let cancel = CancelToken::new();
        let sync = assembler
            .render_document(&session(""), &renderer(), &cancel)
            .expect("sync");
        let asynchronous = assembler
            .render_document_async(&session(""), &renderer(), &cancel)
            .await
            .expect("async");
        assert_eq!(sync.len(), asynchronous.len());
        for (a, b) in sync.iter().zip(&asynchronous) {
            assert_eq!(a.image, b.image);
        }
    }
}
