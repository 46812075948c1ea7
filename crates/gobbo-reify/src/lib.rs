//! # Gobbo Reify
//!
//! Semantic resolution for the gobbo markup language: turns the
//! [`PreContent`](gobbo_syntax::PreContent) produced by the parser into a
//! tree of typed [`Node`]s.
//!
//! ## Overview
//!
//! - **Registry**: the node types an embedder declares ([`ListDecl`],
//!   [`MapDecl`], [`PreMacroDecl`], [`PostMacroDecl`]) plus the built-in
//!   `text`, `paragraph`, `include` and `read`.
//! - **Environment**: a persistent value holding bindings, class bundles and
//!   default properties. Preambles extend it; nothing mutates it in place.
//! - **Reifier**: resolves type paths, cascades properties, expands macros,
//!   follows includes, groups paragraphs and fills map slots.
//!
//! ## Example
//!
//! ```rust
//! use gobbo_reify::{ListDecl, NullRead, create_environment, reify};
//!
//! let env = create_environment(
//!     NullRead,
//!     "/doc.gob",
//!     [("note", ListDecl::new().contains_paragraphs())],
//! )
//! .expect("valid registry");
//!
//! let content = gobbo_syntax::parse("<val who world>\n[note hello [val who]]").unwrap();
//! let lines = reify(&env, &content, true).unwrap();
//!
//! let note = lines[0][0].as_list().unwrap();
//! assert_eq!(env.registry().qualified_name(note.node_type), "note");
//! ```
//!
//! ## Error Handling
//!
//! Every call returns the first [`Error`] it hits: a [`ReifyError`] for
//! semantic problems, a [`ReadError`] from the read collaborator, or the
//! [`ParseError`](gobbo_syntax::ParseError) of an included file.

pub mod config;
pub mod context;
pub mod error;
pub mod node;
mod properties;
pub mod read;
mod reifier;
pub mod types;

pub use config::Config;
pub use context::{Environment, create_environment};
pub use error::{Error, ReifyError, ReifyErrorKind};
pub use node::{Line, ListNode, MacroNode, MapNode, Node, Properties, Slot, TextNode};
pub use read::{MemoryRead, NullRead, Read, ReadError, ReadInfo};
pub use reifier::reify;
pub use types::{
    ListDecl, ListType, MainSlot, MapDecl, MapType, NodeType, PostMacroDecl, PreMacroDecl,
    Registry, RegistryBuilder, RegistryError, SlotMode, TypeDecl, TypeId, TypeKind,
};
