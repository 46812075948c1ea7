pub use gobbo_reify::{
    Config, Environment, Error, Line, ListDecl, MapDecl, MemoryRead, Node, NullRead,
    PostMacroDecl, PreMacroDecl, Read, ReadError, ReadInfo, Registry, ReifyError, ReifyErrorKind,
    SlotMode, TypeDecl, TypeId, create_environment, reify,
};
pub use gobbo_syntax::{ParseError, Position, PreContent, Token, TokenKind, parse, tokenize};
pub use gobbo_reify;
pub use gobbo_syntax;

/// Parses `source` and reifies it as a top-level document, with implicit
/// paragraphs.
///
/// A parse failure is reported against the environment's current file path.
pub fn reify_source(env: &Environment, source: &str) -> Result<Vec<Line>, Error> {
    let content = parse(source).map_err(|error| Error::Parse {
        path: env.current_file_path().to_string(),
        position: error.position,
        error,
    })?;

    tracing::debug!(path = %env.current_file_path(), "reifying document");
    reify(env, &content, true)
}

pub mod prelude {
    pub use crate::{create_environment, parse, reify, reify_source, tokenize};
    pub use crate::{Environment, Error, ListDecl, MapDecl, Node, SlotMode};
}
