// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup compiler — a small recursive-descent parser over brace commands.
//
// A line is a sequence of plain-text spans and `{name: content, key: value}`
// commands. Commands nest; brace depth decides where content and parameters
// end, so formulas may carry their own braces. Compilation is total: anything
// that does not parse is kept as literal text and reported as an anomaly.

use inkwell_core::document::{Block, DocumentTree, Heading, Inline, MathBlock, Paragraph, Run, Script};
use inkwell_core::error::{AnomalyKind, RenderWarning};
use inkwell_core::types::{Alignment, Color, bounded_font_size};
use tracing::{debug, instrument, warn};

/// Indent applied to `margin:` paragraphs, in logical pixels.
pub const MARGIN_INDENT: f32 = 20.0;

/// Top margin used when `top:` carries no number.
pub const DEFAULT_TOP_MARGIN: f32 = 20.0;

/// Largest `top:` margin honoured, in logical pixels.
pub const MAX_TOP_MARGIN: f32 = 2000.0;

/// Deepest command nesting followed. Groups below this are kept as literal text.
pub const MAX_NESTING: usize = 64;

/// Parameter keys recognised after the content of a command. A top-level
/// comma followed by anything else stays part of the content.
const KNOWN_PARAMS: [&str; 2] = ["color", "font-size"];

/// The result of compiling markup with diagnostics.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub tree: DocumentTree,
    /// One `RenderWarning::MarkupAnomaly` per recovered fragment, in source order.
    pub anomalies: Vec<RenderWarning>,
}

/// Compile markup text into a document tree. Never fails.
pub fn compile(text: &str) -> DocumentTree {
    compile_with_diagnostics(text).tree
}

/// Compile markup text, also returning every anomaly the parser recovered from.
#[instrument(skip_all, fields(text_len = text.len()))]
pub fn compile_with_diagnostics(text: &str) -> Compiled {
    let mut anomalies = Vec::new();
    let mut blocks = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let mut parser = LineParser {
            line: index + 1,
            depth: 0,
            anomalies: &mut anomalies,
        };
        let nodes = parser.parse(line);
        if let Some(block) = assemble_block(nodes) {
            blocks.push(block);
        }
    }

    for anomaly in &anomalies {
        warn!(%anomaly, "Recovered from malformed markup");
    }
    debug!(
        blocks = blocks.len(),
        anomalies = anomalies.len(),
        "Markup compiled"
    );

    Compiled {
        tree: DocumentTree::new(blocks),
        anomalies,
    }
}

// -- Intermediate nodes -------------------------------------------------------

/// What a command produces before a line is folded into a block.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(Run),
    Math(MathBlock),
    Margin(Vec<Node>),
    Heading(HeadingNode),
    Center(Vec<Node>),
    Top(f32),
}

#[derive(Debug, Clone, PartialEq)]
struct HeadingNode {
    color: Option<Color>,
    font_size: Option<f32>,
    children: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Small,
    Highlight,
    Script(Script),
}

impl Mark {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "b" => Self::Bold,
            "i" => Self::Italic,
            "u" => Self::Underline,
            "strike" => Self::Strike,
            "small" => Self::Small,
            "mark" => Self::Highlight,
            "sup" => Self::Script(Script::Superscript),
            "sub" => Self::Script(Script::Subscript),
            _ => return None,
        })
    }
}

/// Formatting pushed down onto every leaf a command produced.
///
/// Settings already present on a leaf win, so the innermost command decides
/// exclusive properties such as color or script position.
#[derive(Debug, Clone, Copy, Default)]
struct Overlay {
    mark: Option<Mark>,
    color: Option<Color>,
    font_size: Option<f32>,
}

impl Overlay {
    fn apply(&self, nodes: &mut [Node]) {
        for node in nodes {
            match node {
                Node::Text(run) => self.apply_run(run),
                Node::Math(math) => {
                    math.color = math.color.or(self.color);
                    math.font_size = math.font_size.or(self.font_size);
                }
                Node::Margin(children) | Node::Center(children) => self.apply(children),
                Node::Heading(heading) => self.apply(&mut heading.children),
                Node::Top(_) => {}
            }
        }
    }

    fn apply_run(&self, run: &mut Run) {
        match self.mark {
            Some(Mark::Bold) => run.bold = true,
            Some(Mark::Italic) => run.italic = true,
            Some(Mark::Underline) => run.underline = true,
            Some(Mark::Strike) => run.strike = true,
            Some(Mark::Small) => run.small = true,
            Some(Mark::Highlight) => run.highlight = true,
            Some(Mark::Script(script)) => run.script = run.script.or(Some(script)),
            None => {}
        }
        run.color = run.color.or(self.color);
        run.font_size = run.font_size.or(self.font_size);
    }
}

// -- Cursor -------------------------------------------------------------------

/// A byte-position cursor over one line of markup.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest().len(), |(offset, _)| offset);
        self.pos += len;
        &self.src[start..self.pos]
    }

    /// Consume a balanced `{...}` group starting at the cursor and return its
    /// inner text. The cursor does not move when the group never closes.
    fn take_group(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let mut depth = 0usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset;
                        self.pos = end + 1;
                        return Some(&self.src[start + 1..end]);
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Consume up to (not including) the next `stop` at brace depth zero, or
    /// to the end of input.
    fn take_top_level_until(&mut self, stop: char) -> &'a str {
        let start = self.pos;
        let mut depth = 0usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                c if c == stop && depth == 0 => {
                    self.pos = start + offset;
                    return &self.src[start..self.pos];
                }
                _ => {}
            }
        }
        self.pos = self.src.len();
        &self.src[start..]
    }
}

// -- Line parser --------------------------------------------------------------

struct LineParser<'w> {
    line: usize,
    /// Commands currently open around the text being parsed.
    depth: usize,
    anomalies: &'w mut Vec<RenderWarning>,
}

impl LineParser<'_> {
    fn parse(&mut self, source: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut cursor = Cursor::new(source);

        while !cursor.is_eof() {
            if cursor.peek() == Some('{') {
                let start = cursor.pos;
                match cursor.take_group() {
                    Some(_) if self.depth >= MAX_NESTING => {
                        let raw = &source[start..cursor.pos];
                        self.anomaly(raw, AnomalyKind::TooDeeplyNested);
                        push_text(&mut nodes, raw);
                    }
                    Some(inner) => {
                        let raw = &source[start..cursor.pos];
                        self.depth += 1;
                        let produced = self.command(inner, raw);
                        self.depth -= 1;
                        for node in produced {
                            match node {
                                Node::Text(run) if is_plain(&run) => push_text(&mut nodes, &run.text),
                                other => nodes.push(other),
                            }
                        }
                    }
                    None => {
                        // Keep the brace itself and carry on: later groups may still close.
                        self.anomaly(cursor.rest(), AnomalyKind::UnclosedBrace);
                        cursor.eat('{');
                        push_text(&mut nodes, "{");
                    }
                }
            } else {
                let text = cursor.take_while(|c| c != '{');
                if text.contains('}') {
                    self.anomaly(text, AnomalyKind::StrayClosingBrace);
                }
                push_text(&mut nodes, text);
            }
        }

        nodes
    }

    fn command(&mut self, inner: &str, raw: &str) -> Vec<Node> {
        let mut cursor = Cursor::new(inner);
        cursor.eat('_');
        let name = cursor.take_top_level_until(':').trim().to_ascii_lowercase();
        cursor.eat(':');
        let args = split_arguments(cursor.rest());
        let overlay = Overlay {
            mark: None,
            color: args.color,
            font_size: args.font_size,
        };

        if let Some(mark) = Mark::from_name(&name) {
            if args.content.is_empty() {
                self.anomaly(raw, AnomalyKind::EmptyCommand);
                return Vec::new();
            }
            let mut children = self.parse(args.content);
            Overlay {
                mark: Some(mark),
                ..overlay
            }
            .apply(&mut children);
            return children;
        }

        match name.as_str() {
            "br" => vec![Node::Text(Run::plain("\n"))],
            "top" => vec![Node::Top(
                leading_number(args.content)
                    .filter(|margin| margin.is_finite())
                    .map_or(DEFAULT_TOP_MARGIN, |margin| margin.clamp(0.0, MAX_TOP_MARGIN)),
            )],
            "latex" | "margin" | "heading" | "center" | "text" if args.content.is_empty() => {
                self.anomaly(raw, AnomalyKind::EmptyCommand);
                Vec::new()
            }
            "latex" => vec![Node::Math(MathBlock {
                color: args.color,
                font_size: args.font_size,
                ..MathBlock::inline(args.content)
            })],
            "heading" => vec![Node::Heading(HeadingNode {
                color: args.color,
                font_size: args.font_size,
                children: self.parse(args.content),
            })],
            "margin" | "center" | "text" => {
                let mut children = self.parse(args.content);
                overlay.apply(&mut children);
                match name.as_str() {
                    "margin" => vec![Node::Margin(children)],
                    "center" => vec![Node::Center(children)],
                    _ => children,
                }
            }
            "" => {
                self.anomaly(raw, AnomalyKind::EmptyCommand);
                vec![Node::Text(Run::plain(raw))]
            }
            _ => {
                self.anomaly(raw, AnomalyKind::UnknownCommand);
                vec![Node::Text(Run::plain(raw))]
            }
        }
    }

    fn anomaly(&mut self, fragment: &str, kind: AnomalyKind) {
        self.anomalies.push(RenderWarning::MarkupAnomaly {
            line: self.line,
            fragment: fragment.to_string(),
            kind,
        });
    }
}

#[derive(Debug, Default)]
struct Arguments<'a> {
    content: &'a str,
    color: Option<Color>,
    font_size: Option<f32>,
}

/// Split `content, key: value, ...` at top-level commas.
fn split_arguments(source: &str) -> Arguments<'_> {
    let mut cursor = Cursor::new(source);
    let mut args = Arguments::default();
    let mut content_end = 0;
    let mut in_params = false;

    loop {
        let segment_start = cursor.pos;
        let segment = cursor.take_top_level_until(',');
        let param = if segment_start == 0 {
            None
        } else {
            parse_param(segment)
        };
        match param {
            Some(("color", value)) => {
                in_params = true;
                args.color = parse_color(value);
            }
            Some((_, value)) => {
                in_params = true;
                args.font_size = leading_number(value).and_then(bounded_font_size);
            }
            None if !in_params => content_end = cursor.pos,
            None => {}
        }
        if !cursor.eat(',') {
            break;
        }
    }

    args.content = source[..content_end].trim();
    args
}

fn parse_param(segment: &str) -> Option<(&'static str, &str)> {
    let (key, value) = segment.split_once(':')?;
    let key = key.trim();
    KNOWN_PARAMS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(key))
        .map(|known| (*known, value.trim()))
}

/// Hex colors plus a handful of common ink names.
fn parse_color(value: &str) -> Option<Color> {
    let named = match value.to_ascii_lowercase().as_str() {
        "black" => Some(Color::BLACK),
        "white" => Some(Color::WHITE),
        "red" => Some(Color::rgb(0xcc, 0x00, 0x00)),
        "green" => Some(Color::rgb(0x00, 0x80, 0x00)),
        "blue" => Some(Color::rgb(0x00, 0x33, 0xcc)),
        "navy" => Some(Color::rgb(0x00, 0x00, 0x80)),
        "purple" => Some(Color::rgb(0x80, 0x00, 0x80)),
        "brown" => Some(Color::rgb(0x8b, 0x45, 0x13)),
        "gray" | "grey" => Some(Color::rgb(0x80, 0x80, 0x80)),
        _ => None,
    };
    named.or_else(|| Color::from_hex(value))
}

/// Parse the numeric prefix of a value such as `30` or `18px`.
fn leading_number(value: &str) -> Option<f32> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse().ok()
}

fn is_plain(run: &Run) -> bool {
    *run == Run::plain(run.text.as_str())
}

/// Append plain text, merging with a preceding plain run.
fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        if is_plain(prev) {
            prev.text.push_str(text);
            return;
        }
    }
    nodes.push(Node::Text(Run::plain(text)));
}

// -- Block assembly -----------------------------------------------------------

/// Fold one line's nodes into a block. Lines that produced nothing are dropped.
fn assemble_block(mut nodes: Vec<Node>) -> Option<Block> {
    if matches!(nodes.as_slice(), [Node::Math(_)]) {
        if let Some(Node::Math(math)) = nodes.pop() {
            return Some(Block::Math(math));
        }
    }

    let mut nodes = nodes.into_iter();
    let first = nodes.next()?;
    let mut children = Vec::new();
    let mut paragraph = Paragraph::default();

    match first {
        Node::Heading(heading) => {
            flatten(heading.children, &mut children, &mut paragraph);
            flatten(nodes, &mut children, &mut paragraph);
            Some(Block::Heading(Heading {
                color: heading.color,
                font_size: heading.font_size,
                children,
            }))
        }
        first => {
            flatten(std::iter::once(first).chain(nodes), &mut children, &mut paragraph);
            paragraph.children = children;
            Some(Block::Paragraph(paragraph))
        }
    }
}

fn flatten(nodes: impl IntoIterator<Item = Node>, out: &mut Vec<Inline>, paragraph: &mut Paragraph) {
    for node in nodes {
        match node {
            Node::Text(run) => out.push(Inline::Text(run)),
            Node::Math(math) => out.push(Inline::Math(math)),
            Node::Top(margin) => paragraph.margin_top = Some(margin),
            Node::Center(children) => {
                paragraph.alignment = Some(Alignment::Center);
                flatten(children, out, paragraph);
            }
            Node::Margin(children) => {
                paragraph.margin_left = Some(MARGIN_INDENT);
                let start = out.len();
                flatten(children, out, paragraph);
                let prefix = out[start..].iter_mut().find_map(|child| match child {
                    Inline::Text(run) => Some(run),
                    Inline::Math(_) => None,
                });
                if let Some(prefix) = prefix {
                    if !prefix.text.ends_with(char::is_whitespace) {
                        prefix.text.push(' ');
                    }
                }
            }
            Node::Heading(heading) => flatten(heading.children, out, paragraph),
        }
    }
}
