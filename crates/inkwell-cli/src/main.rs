// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inkwell — handwritten page renderer.
//
// Entry point. Initialises logging, compiles each markup file into a page,
// renders the document, and writes PNG pages or a PDF.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use inkwell_core::config::InkwellConfig;
use inkwell_core::error::Result;
use inkwell_core::human_errors::humanize_error;
use inkwell_document::{
    BlockGlyphs, CancelToken, DocumentAssembler, EditingSession, FontGlyphs, GlyphRasterizer,
    PageRenderer, PdfWriter, SymbolTypesetter, export_pngs,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(version)]
#[command(about = "Render lightweight markup as handwritten, scanned-looking pages", long_about = None)]
struct Cli {
    /// Markup files; each becomes one page
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "out")]
    out: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "png")]
    format: Format,

    /// JSON configuration (style, effects, render)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Handwriting font (TTF/OTF); block glyphs are used without one
    #[arg(long, value_name = "FONT")]
    font: Option<PathBuf>,

    /// Bold face for the handwriting font
    #[arg(long, value_name = "FONT", requires = "font")]
    bold_font: Option<PathBuf>,

    /// Seed for reproducible jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Print each compiled document tree as JSON
    #[arg(long)]
    dump_tree: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Png,
    Pdf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            tracing::debug!(error = %err, "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => InkwellConfig::load(path)?,
        None => InkwellConfig::default(),
    };
    if cli.seed.is_some() {
        config.render.seed = cli.seed;
    }

    let glyphs = load_glyphs(&cli, &config)?;
    let renderer = PageRenderer::new(glyphs, Arc::new(SymbolTypesetter::default()), config.render.clone());

    let mut session = EditingSession::new(config.style.clone(), config.effects.clone());
    let mut assembler = DocumentAssembler::new();
    for path in &cli.files {
        let text = std::fs::read_to_string(path)?;
        let compiled = session.set_markup(&text);
        for anomaly in &compiled.anomalies {
            warn!(file = %path.display(), %anomaly, "Markup recovered");
        }
        if cli.dump_tree {
            println!("{}", compiled.tree.to_json()?);
        }
        assembler.capture_page(&session);
    }

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current page");
            on_interrupt.cancel();
        }
    });

    let rendered = assembler
        .render_document_async(&session, &renderer, &cancel)
        .await?;
    let warnings: usize = rendered.iter().map(|page| page.warnings.len()).sum();

    match cli.format {
        Format::Png => {
            let written = export_pngs(&rendered, &cli.out, "page")?;
            info!(files = written.len(), warnings, dir = %cli.out.display(), "Export complete");
        }
        Format::Pdf => {
            std::fs::create_dir_all(&cli.out)?;
            let path = cli.out.join("document.pdf");
            let images: Vec<_> = rendered.into_iter().map(|page| page.image).collect();
            PdfWriter::new(config.render.export_page_size)
                .with_title(config.render.title.clone())
                .write_to_file(&images, &path)?;
            info!(pages = images.len(), warnings, path = %path.display(), "Export complete");
        }
    }
    Ok(())
}

fn load_glyphs(cli: &Cli, config: &InkwellConfig) -> Result<Arc<dyn GlyphRasterizer>> {
    let Some(font) = &cli.font else {
        warn!("No --font given, drawing block glyphs");
        return Ok(Arc::new(BlockGlyphs::default()));
    };
    let mut glyphs = FontGlyphs::open(family_name(font, &config.style.font_family), font)?;
    if let Some(bold) = &cli.bold_font {
        glyphs = glyphs.with_bold(bold)?;
    }
    Ok(Arc::new(glyphs))
}

/// The configured family name, or the font file's stem when none is set.
fn family_name(path: &Path, configured: &str) -> String {
    if configured.is_empty() {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        configured.to_string()
    }
}
