// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document tree — the block/run model produced by the markup compiler (or an
// editor) and consumed by the layout engine.

use serde::{Deserialize, Serialize};

use crate::types::{Alignment, Color};

/// Vertical script position of a run. Superscript and subscript are exclusive,
/// so a run carries at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Superscript,
    Subscript,
}

/// An inline text leaf sharing one set of formatting flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strike: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub small: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub highlight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Script>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Run {
    /// An unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn superscript(&self) -> bool {
        self.script == Some(Script::Superscript)
    }

    pub fn subscript(&self) -> bool {
        self.script == Some(Script::Subscript)
    }
}

/// A LaTeX-like formula, either as its own block or inline inside a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathBlock {
    pub formula: String,
    pub inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
}

impl MathBlock {
    pub fn inline(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            inline: true,
            align: None,
            color: None,
            font_size: None,
        }
    }

    pub fn display(formula: impl Into<String>) -> Self {
        Self {
            inline: false,
            ..Self::inline(formula)
        }
    }
}

/// A child of a paragraph or heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inline {
    Text(Run),
    Math(MathBlock),
}

impl Inline {
    pub fn as_run(&self) -> Option<&Run> {
        match self {
            Self::Text(run) => Some(run),
            Self::Math(_) => None,
        }
    }
}

impl From<Run> for Inline {
    fn from(run: Run) -> Self {
        Self::Text(run)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<f32>,
    pub children: Vec<Inline>,
}

impl Paragraph {
    pub fn new(children: Vec<Inline>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// A paragraph holding one empty run.
    pub fn empty() -> Self {
        Self::new(vec![Inline::Text(Run::plain(""))])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    pub children: Vec<Inline>,
}

/// A top-level structural node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    Math(MathBlock),
}

impl Block {
    /// Inline children, or `None` for a math block.
    pub fn children(&self) -> Option<&[Inline]> {
        match self {
            Self::Paragraph(p) => Some(&p.children),
            Self::Heading(h) => Some(&h.children),
            Self::Math(_) => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Self::Paragraph(p) => Some(&mut p.children),
            Self::Heading(h) => Some(&mut h.children),
            Self::Math(_) => None,
        }
    }
}

/// An ordered, never-empty sequence of blocks.
///
/// Construction and deserialization both normalize: an empty tree becomes one
/// empty paragraph and a childless paragraph or heading gets one empty run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Block>", into = "Vec<Block>")]
pub struct DocumentTree {
    blocks: Vec<Block>,
}

impl DocumentTree {
    pub fn new(mut blocks: Vec<Block>) -> Self {
        for block in &mut blocks {
            if let Some(children) = block.children_mut() {
                if children.is_empty() {
                    children.push(Inline::Text(Run::plain("")));
                }
            }
        }
        if blocks.is_empty() {
            blocks.push(Block::Paragraph(Paragraph::empty()));
        }
        Self { blocks }
    }

    /// The normalized empty document: one empty paragraph.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// True when the tree holds no text and no formulas.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(|block| match block {
            Block::Math(m) => m.formula.trim().is_empty(),
            _ => block.children().unwrap_or_default().iter().all(|child| match child {
                Inline::Text(run) => run.text.trim().is_empty(),
                Inline::Math(m) => m.formula.trim().is_empty(),
            }),
        })
    }

    /// The text of each block, one line per block. Formulas contribute their source.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Math(m) => m.formula.clone(),
                _ => block
                    .children()
                    .unwrap_or_default()
                    .iter()
                    .map(|child| match child {
                        Inline::Text(run) => run.text.as_str(),
                        Inline::Math(m) => m.formula.as_str(),
                    })
                    .collect::<String>(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Block>> for DocumentTree {
    fn from(blocks: Vec<Block>) -> Self {
        Self::new(blocks)
    }
}

impl From<DocumentTree> for Vec<Block> {
    fn from(tree: DocumentTree) -> Self {
        tree.blocks
    }
}

/// The three writable regions of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageContent {
    pub main: DocumentTree,
    pub header: DocumentTree,
    pub side_notes: DocumentTree,
}

impl PageContent {
    /// Content with only a main region.
    pub fn main_only(main: DocumentTree) -> Self {
        Self {
            main,
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.main.is_blank() && self.header.is_blank() && self.side_notes.is_blank()
    }
}
