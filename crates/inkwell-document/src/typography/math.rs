// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Math typesetting — turns LaTeX-like formula source into positioned glyphs.
//
// `SymbolTypesetter` covers the everyday subset people write in notes:
// groups, super/subscripts, fractions (set inline as a/b), square roots,
// Greek letters, and the common operators and relations. Anything else is a
// `TypesetError`, which callers answer by drawing the raw source instead.

use thiserror::Error;

use super::FontSpec;

/// Why a formula could not be typeset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypesetError {
    #[error("unknown command \\{0}")]
    UnknownCommand(String),

    #[error("unbalanced braces")]
    UnbalancedBraces,

    #[error("`{0}` is missing its argument")]
    MissingArgument(String),

    #[error("groups nest deeper than {0} levels")]
    TooDeep(usize),
}

/// Deepest group and argument nesting a formula may use.
pub const MAX_MATH_DEPTH: usize = 64;

/// One positioned character of a typeset formula.
///
/// `x` is measured from the formula's left edge, `rise` upward from its
/// baseline; both are in the same units as the requested size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathGlyph {
    pub ch: char,
    pub x: f32,
    pub rise: f32,
    pub size: f32,
    pub italic: bool,
    pub bold: bool,
}

impl MathGlyph {
    pub fn font(&self) -> FontSpec {
        FontSpec {
            size: self.size,
            bold: self.bold,
            italic: self.italic,
        }
    }
}

/// A formula laid out on a single baseline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypesetFormula {
    pub glyphs: Vec<MathGlyph>,
    pub width: f32,
    /// Extent above the baseline.
    pub ascent: f32,
    /// Extent below the baseline.
    pub descent: f32,
}

impl TypesetFormula {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Every coordinate multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            glyphs: self
                .glyphs
                .iter()
                .map(|g| MathGlyph {
                    x: g.x * factor,
                    rise: g.rise * factor,
                    size: g.size * factor,
                    ..*g
                })
                .collect(),
            width: self.width * factor,
            ascent: self.ascent * factor,
            descent: self.descent * factor,
        }
    }
}

/// A formula typesetting service.
///
/// `advance` reports the width of a character in a given face so formulas
/// are spaced with the same metrics as the surrounding text.
pub trait MathTypesetter: Send + Sync {
    fn typeset(
        &self,
        formula: &str,
        display: bool,
        size: f32,
        advance: &dyn Fn(char, &FontSpec) -> f32,
    ) -> Result<TypesetFormula, TypesetError>;
}

/// Built-in typesetter mapping TeX commands onto Unicode symbols.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolTypesetter {
    /// Size factor for each level of super/subscript.
    pub script_scale: f32,
    /// Size factor for display (non-inline) formulas.
    pub display_scale: f32,
}

impl Default for SymbolTypesetter {
    fn default() -> Self {
        Self {
            script_scale: 0.7,
            display_scale: 1.2,
        }
    }
}

impl MathTypesetter for SymbolTypesetter {
    fn typeset(
        &self,
        formula: &str,
        display: bool,
        size: f32,
        advance: &dyn Fn(char, &FontSpec) -> f32,
    ) -> Result<TypesetFormula, TypesetError> {
        let size = if display { size * self.display_scale } else { size };
        let mut builder = Builder {
            chars: formula.chars().collect(),
            pos: 0,
            depth: 0,
            x: 0.0,
            glyphs: Vec::new(),
            advance,
            script_scale: self.script_scale,
        };
        let style = Style {
            size,
            rise: 0.0,
            upright: false,
            bold: false,
        };
        builder.sequence(style, false)?;

        let ascent = builder
            .glyphs
            .iter()
            .map(|g| g.rise + g.size * 0.8)
            .fold(size * 0.8, f32::max);
        let descent = builder
            .glyphs
            .iter()
            .map(|g| g.size * 0.2 - g.rise)
            .fold(size * 0.2, f32::max);

        Ok(TypesetFormula {
            width: builder.x,
            glyphs: builder.glyphs,
            ascent,
            descent,
        })
    }
}

// -- Symbol tables ------------------------------------------------------------

const GREEK: &[(&str, char)] = &[
    ("alpha", 'α'),
    ("beta", 'β'),
    ("gamma", 'γ'),
    ("delta", 'δ'),
    ("epsilon", 'ε'),
    ("varepsilon", 'ε'),
    ("zeta", 'ζ'),
    ("eta", 'η'),
    ("theta", 'θ'),
    ("vartheta", 'ϑ'),
    ("iota", 'ι'),
    ("kappa", 'κ'),
    ("lambda", 'λ'),
    ("mu", 'μ'),
    ("nu", 'ν'),
    ("xi", 'ξ'),
    ("pi", 'π'),
    ("rho", 'ρ'),
    ("sigma", 'σ'),
    ("tau", 'τ'),
    ("upsilon", 'υ'),
    ("phi", 'φ'),
    ("varphi", 'φ'),
    ("chi", 'χ'),
    ("psi", 'ψ'),
    ("omega", 'ω'),
    ("Gamma", 'Γ'),
    ("Delta", 'Δ'),
    ("Theta", 'Θ'),
    ("Lambda", 'Λ'),
    ("Xi", 'Ξ'),
    ("Pi", 'Π'),
    ("Sigma", 'Σ'),
    ("Upsilon", 'Υ'),
    ("Phi", 'Φ'),
    ("Psi", 'Ψ'),
    ("Omega", 'Ω'),
];

/// Symbols set with space on either side.
const OPERATORS: &[(&str, char)] = &[
    ("times", '×'),
    ("cdot", '·'),
    ("div", '÷'),
    ("pm", '±'),
    ("mp", '∓'),
    ("leq", '≤'),
    ("le", '≤'),
    ("geq", '≥'),
    ("ge", '≥'),
    ("neq", '≠'),
    ("ne", '≠'),
    ("approx", '≈'),
    ("equiv", '≡'),
    ("sim", '∼'),
    ("propto", '∝'),
    ("to", '→'),
    ("rightarrow", '→'),
    ("leftarrow", '←'),
    ("Rightarrow", '⇒'),
    ("Leftrightarrow", '⇔'),
    ("implies", '⇒'),
    ("in", '∈'),
    ("notin", '∉'),
    ("subset", '⊂'),
    ("subseteq", '⊆'),
    ("cup", '∪'),
    ("cap", '∩'),
    ("circ", '∘'),
];

/// Symbols set tight.
const ORDINARY: &[(&str, char)] = &[
    ("infty", '∞'),
    ("partial", '∂'),
    ("nabla", '∇'),
    ("sum", '∑'),
    ("prod", '∏'),
    ("int", '∫'),
    ("oint", '∮'),
    ("forall", '∀'),
    ("exists", '∃'),
    ("emptyset", '∅'),
    ("ldots", '…'),
    ("dots", '…'),
    ("cdots", '⋯'),
    ("prime", '′'),
    ("degree", '°'),
    ("angle", '∠'),
    ("hbar", 'ℏ'),
    ("ell", 'ℓ'),
];

const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "log", "ln", "exp", "lim", "max", "min", "det",
    "gcd", "arcsin", "arccos", "arctan", "sinh", "cosh", "tanh",
];

fn lookup(table: &[(&str, char)], name: &str) -> Option<char> {
    table
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, ch)| *ch)
}

fn is_spaced(ch: char) -> bool {
    matches!(ch, '+' | '-' | '=' | '<' | '>')
}

// -- Builder ------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Style {
    size: f32,
    rise: f32,
    upright: bool,
    bold: bool,
}

struct Builder<'f> {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    x: f32,
    glyphs: Vec<MathGlyph>,
    advance: &'f dyn Fn(char, &FontSpec) -> f32,
    script_scale: f32,
}

impl Builder<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Run `f` one nesting level deeper, refusing past [`MAX_MATH_DEPTH`].
    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), TypesetError>,
    ) -> Result<(), TypesetError> {
        if self.depth >= MAX_MATH_DEPTH {
            return Err(TypesetError::TooDeep(MAX_MATH_DEPTH));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Typeset until end of input, or until the matching `}` when `closing`.
    fn sequence(&mut self, style: Style, closing: bool) -> Result<(), TypesetError> {
        loop {
            match self.bump() {
                None if closing => return Err(TypesetError::UnbalancedBraces),
                None => return Ok(()),
                Some('}') if closing => return Ok(()),
                Some('}') => return Err(TypesetError::UnbalancedBraces),
                Some('{') => self.nested(|b| b.sequence(style, true))?,
                Some(marker @ ('^' | '_')) => self.script(marker, style)?,
                Some('\\') => self.command(style)?,
                Some(ch) if ch.is_whitespace() => {}
                Some(ch) => self.symbol(ch, style),
            }
        }
    }

    /// A single argument: a group, a command, or one character.
    fn atom(&mut self, style: Style, owner: &str) -> Result<(), TypesetError> {
        self.nested(|b| {
            b.skip_space();
            match b.bump() {
                None | Some('^' | '_') => Err(TypesetError::MissingArgument(owner.to_string())),
                Some('{') => b.sequence(style, true),
                Some('}') => Err(TypesetError::UnbalancedBraces),
                Some('\\') => b.command(style),
                Some(ch) => {
                    b.symbol(ch, style);
                    Ok(())
                }
            }
        })
    }

    fn script(&mut self, marker: char, style: Style) -> Result<(), TypesetError> {
        let rise = if marker == '^' {
            style.rise + style.size * 0.4
        } else {
            style.rise - style.size * 0.2
        };
        let inner = Style {
            size: style.size * self.script_scale,
            rise,
            ..style
        };
        self.atom(inner, &marker.to_string())
    }

    fn command(&mut self, style: Style) -> Result<(), TypesetError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if name.is_empty() {
            let em = match self.bump() {
                Some(',') => 0.17,
                Some(':' | ';' | ' ') => 0.25,
                Some('!') => -0.17,
                Some('\\') => 1.0,
                Some(ch @ ('{' | '}' | '%' | '$' | '#' | '&' | '_')) => {
                    self.push(ch, style, false);
                    return Ok(());
                }
                Some(other) => return Err(TypesetError::UnknownCommand(other.to_string())),
                None => return Err(TypesetError::UnknownCommand(String::new())),
            };
            self.space(style, em);
            return Ok(());
        }

        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                self.atom(style, "\\frac")?;
                self.push('/', style, false);
                self.atom(style, "\\frac")
            }
            "sqrt" => {
                self.push('√', style, false);
                self.atom(style, "\\sqrt")
            }
            "text" | "textrm" | "mathrm" | "operatorname" => self.atom(
                Style {
                    upright: true,
                    ..style
                },
                "\\text",
            ),
            "mathbf" | "textbf" | "boldsymbol" => self.atom(
                Style {
                    bold: true,
                    ..style
                },
                "\\mathbf",
            ),
            "mathit" | "textit" => self.atom(
                Style {
                    upright: false,
                    ..style
                },
                "\\mathit",
            ),
            "left" | "right" | "big" | "Big" | "bigl" | "bigr" | "Bigl" | "Bigr" => {
                self.skip_space();
                if self.peek() == Some('.') {
                    self.pos += 1;
                }
                Ok(())
            }
            "quad" | "qquad" => {
                self.space(style, if name == "quad" { 1.0 } else { 2.0 });
                Ok(())
            }
            name if FUNCTIONS.contains(&name) => {
                for ch in name.chars() {
                    self.push(ch, style, false);
                }
                self.space(style, 0.17);
                Ok(())
            }
            name => {
                if let Some(ch) = lookup(OPERATORS, name) {
                    self.operator(ch, style);
                } else if let Some(ch) = lookup(GREEK, name).or_else(|| lookup(ORDINARY, name)) {
                    self.push(ch, style, false);
                } else {
                    return Err(TypesetError::UnknownCommand(name.to_string()));
                }
                Ok(())
            }
        }
    }

    fn symbol(&mut self, ch: char, style: Style) {
        if is_spaced(ch) {
            self.operator(ch, style);
        } else {
            let italic = !style.upright && ch.is_ascii_alphabetic();
            self.push(ch, style, italic);
        }
    }

    fn operator(&mut self, ch: char, style: Style) {
        let pad = style.size * 0.2;
        self.x += pad;
        self.push(ch, style, false);
        self.x += pad;
    }

    fn space(&mut self, style: Style, em: f32) {
        self.x += style.size * em;
    }

    fn push(&mut self, ch: char, style: Style, italic: bool) {
        let glyph = MathGlyph {
            ch,
            x: self.x,
            rise: style.rise,
            size: style.size,
            italic,
            bold: style.bold,
        };
        self.x += (self.advance)(ch, &glyph.font());
        self.glyphs.push(glyph);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_em(_: char, font: &FontSpec) -> f32 {
        font.size * 0.5
    }

    fn typeset(formula: &str) -> Result<TypesetFormula, TypesetError> {
        SymbolTypesetter::default().typeset(formula, false, 10.0, &half_em)
    }

    fn text_of(formula: &TypesetFormula) -> String {
        formula.glyphs.iter().map(|g| g.ch).collect()
    }

    #[test]
    fn superscript_is_smaller_and_raised() {
        let out = typeset("x^2").expect("typeset");
        assert_eq!(out.glyphs.len(), 2);
        let (x, two) = (out.glyphs[0], out.glyphs[1]);
        assert!(x.italic);
        assert!((two.size - 7.0).abs() < 1e-5);
        assert!((two.rise - 4.0).abs() < 1e-5);
        assert!((two.x - 5.0).abs() < 1e-5);
        assert!((out.width - 8.5).abs() < 1e-5);
        assert!(out.ascent > 8.0);
    }

    #[test]
    fn subscript_drops_below_baseline() {
        let out = typeset("a_{ij}").expect("typeset");
        assert!(out.glyphs[1].rise < 0.0);
        assert_eq!(out.glyphs[1].rise, out.glyphs[2].rise);
        assert!(out.descent > 2.0);
    }

    #[test]
    fn fraction_is_set_inline() {
        let out = typeset(r"\frac{a}{b}").expect("typeset");
        assert_eq!(text_of(&out), "a/b");
    }

    #[test]
    fn greek_and_operators_map_to_unicode() {
        let out = typeset(r"\alpha \leq \pi \times r").expect("typeset");
        assert_eq!(text_of(&out), "α≤π×r");
    }

    #[test]
    fn relations_get_surrounding_space() {
        let tight = typeset("ab").expect("typeset");
        let spaced = typeset("a=b").expect("typeset");
        assert!((spaced.width - (tight.width + 5.0 + 4.0)).abs() < 1e-5);
    }

    #[test]
    fn text_groups_are_upright() {
        let out = typeset(r"\text{if } x").expect("typeset");
        assert!(!out.glyphs[0].italic);
        assert!(out.glyphs.last().is_some_and(|g| g.italic));
    }

    #[test]
    fn display_mode_enlarges() {
        let out = SymbolTypesetter::default()
            .typeset("x", true, 10.0, &half_em)
            .expect("typeset");
        assert!((out.glyphs[0].size - 12.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert_eq!(
            typeset(r"\foo x"),
            Err(TypesetError::UnknownCommand("foo".into()))
        );
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        assert_eq!(typeset("{x"), Err(TypesetError::UnbalancedBraces));
        assert_eq!(typeset("x}"), Err(TypesetError::UnbalancedBraces));
    }

    #[test]
    fn runaway_nesting_is_an_error() {
        let groups = format!("{}x{}", "{".repeat(10_000), "}".repeat(10_000));
        assert_eq!(typeset(&groups), Err(TypesetError::TooDeep(MAX_MATH_DEPTH)));
        let scripts = format!("{}x{}", "x^{".repeat(5_000), "}".repeat(5_000));
        assert_eq!(typeset(&scripts), Err(TypesetError::TooDeep(MAX_MATH_DEPTH)));
        assert_eq!(
            typeset(&r"\sqrt".repeat(5_000)),
            Err(TypesetError::TooDeep(MAX_MATH_DEPTH))
        );
    }

    #[test]
    fn moderate_nesting_typesets() {
        let formula = format!("{}x{}", "{".repeat(20), "}".repeat(20));
        assert_eq!(text_of(&typeset(&formula).expect("typeset")), "x");
    }

    #[test]
    fn dangling_script_is_an_error() {
        assert!(matches!(
            typeset("x^"),
            Err(TypesetError::MissingArgument(_))
        ));
    }

    #[test]
    fn scaled_multiplies_every_coordinate() {
        let out = typeset("x^2").expect("typeset").scaled(2.0);
        assert!((out.width - 17.0).abs() < 1e-5);
        assert!((out.glyphs[1].size - 14.0).abs() < 1e-5);
    }
}
