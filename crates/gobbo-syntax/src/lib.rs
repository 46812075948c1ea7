//! # Gobbo Syntax
//!
//! Lexer, parser, and concrete syntax tree definitions for the gobbo markup
//! language.
//!
//! ## Overview
//!
//! - **Lexer**: classifies every character of a source for display purposes
//!   (highlighting, rainbow brackets). It never fails.
//! - **Parser**: strict recursive descent producing [`PreContent`], the
//!   unresolved syntax tree, or the first [`ParseError`].
//! - **Error Handling**: positions and structured diagnostics; rendering
//!   them is left to the presentation layer.
//!
//! ## Architecture
//!
//! ```text
//! Source Text ──tokenize──> Vec<Token>      (display only)
//!     │
//!     └────────parse─────> PreContent       (handed to the reifier)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gobbo_syntax::{LineElement, parse};
//!
//! let content = parse("<val who world>\nhello [val who]").expect("valid source");
//!
//! assert_eq!(content.preamble.len(), 1);
//! assert_eq!(content.lines.len(), 1);
//! assert!(matches!(content.lines[0][1], LineElement::Node(_)));
//! ```
//!
//! ## Grammar Overview
//!
//! ```text
//! PreContent:  PreambleElement* Line*
//! Preamble:    <val name value>  <con name [PreContent]>
//!              <cla .class paths* .class* {properties}?>
//!              <def paths* .class* {properties}?>
//!              (any element may start with `?` to mark a fallback)
//! Line:        (text | `escaped` | Node | _[ignored node])*
//! Node:        [<preamble...> content]      [val name]     [con name <preamble>*]
//!              [text .class* {props}? text] [read {props}] [include {props} <preamble>*]
//!              [type\child .class* {props}? PreContent]
//!              [\child .class* {props}? PreContent]
//! Properties:  { =main? name=value | name | !name ... }
//! Value:       literal | `escaped` | <val name>
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use gobbo_syntax::{Concept, Expected, parse};
//!
//! let err = parse("[foo").unwrap_err();
//!
//! assert_eq!(err.expected, vec![Expected::Char(']')]);
//! assert_eq!(err.parsing, Some(Concept::Node));
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use error::{Concept, Expected, Got, ParseError, Position};
pub use lexer::{Keyword, Token, TokenKind, to_lines, tokenize};
pub use parser::{ParseResult, parse};
