// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup module — compiles the brace-command markup language into a document tree.

pub mod parser;

pub use parser::{Compiled, compile, compile_with_diagnostics};
