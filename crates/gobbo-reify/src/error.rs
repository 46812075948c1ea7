//! Diagnostics raised while reifying pre-content.
//!
//! [`Error`] is the union of the three failure kinds a reify call can surface:
//! a parse failure inside an included file, a failure of the read
//! collaborator, or a semantic [`ReifyError`]. The core only produces
//! structured data; wording for end users is up to the presentation layer,
//! though every type implements `Display` for logs and tests.

use crate::context::Environment;
use crate::read::ReadError;
use gobbo_syntax::{ParseError, Position};
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    /// A file pulled in by `include` failed to parse. `position` is the
    /// include node; `error.position` lies inside `path`.
    Parse {
        path: String,
        position: Position,
        error: ParseError,
    },
    /// The read collaborator failed; `position` is the triggering node.
    Read { position: Position, error: ReadError },
    Reify(ReifyError),
}

impl Error {
    /// Every source position the diagnostic implicates, outermost first.
    pub fn positions(&self) -> SmallVec<[Position; 2]> {
        match self {
            Error::Parse { position, .. } | Error::Read { position, .. } => {
                SmallVec::from_slice(&[*position])
            }
            Error::Reify(err) => err.positions.clone(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "parse",
            Error::Read { .. } => "read",
            Error::Reify(_) => "reify",
        }
    }

    pub fn as_reify(&self) -> Option<&ReifyError> {
        match self {
            Error::Reify(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse { path, error, .. } => write!(f, "in {}: {}", path, error),
            Error::Read { position, error } => write!(f, "{} at {}", error, position),
            Error::Reify(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse { error, .. } => Some(error),
            Error::Read { error, .. } => Some(error),
            Error::Reify(_) => None,
        }
    }
}

impl From<ReifyError> for Error {
    fn from(err: ReifyError) -> Self {
        Error::Reify(err)
    }
}

/// A semantic failure, with the environment that was current when it
/// happened so messages can mention bindings, classes or the enclosing type.
#[derive(Debug, Clone)]
pub struct ReifyError {
    pub kind: ReifyErrorKind,
    pub positions: SmallVec<[Position; 2]>,
    pub environment: Environment,
}

impl ReifyError {
    pub fn new(
        kind: ReifyErrorKind,
        positions: impl IntoIterator<Item = Position>,
        environment: &Environment,
    ) -> Self {
        Self {
            kind,
            positions: positions.into_iter().collect(),
            environment: environment.clone(),
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.positions.first().copied()
    }
}

impl fmt::Display for ReifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(position) = self.position() {
            write!(f, " at {}", position)?;
        }

        if !self.environment.current_file_path().is_empty() {
            write!(f, " in {}", self.environment.current_file_path())?;
        }

        Ok(())
    }
}

impl std::error::Error for ReifyError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReifyErrorKind {
    UnboundValue { name: String },
    UnboundContent { name: String },
    UnknownType { name: String },
    RelativePathOutsideNode,
    NoSuchClass { class: String, node_type: String },
    DuplicateProperty { name: String },
    /// A main value was given to a type without a main property name.
    NoMainProperty { node_type: String },
    DuplicateMainProperty { name: String, node_type: String },
    /// Implicit content inside a map type without a main slot.
    NoMainSlot { node_type: String },
    NotInParagraph { node_type: String },
    MissingPath,
    IncludeCycle { path: String },
    IncludeDepthExceeded { limit: usize },
    UnexpectedNodeType { node_type: String },
    Macro { message: String },
}

impl fmt::Display for ReifyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReifyErrorKind::UnboundValue { name } => write!(f, "no value named '{}'", name),
            ReifyErrorKind::UnboundContent { name } => write!(f, "no content named '{}'", name),
            ReifyErrorKind::UnknownType { name } => write!(f, "no type named '{}'", name),
            ReifyErrorKind::RelativePathOutsideNode => {
                write!(f, "relative type path used outside of a typed node")
            }
            ReifyErrorKind::NoSuchClass { class, node_type } => {
                write!(f, "no class '{}' for type '{}'", class, node_type)
            }
            ReifyErrorKind::DuplicateProperty { name } => {
                write!(f, "property '{}' is set more than once", name)
            }
            ReifyErrorKind::NoMainProperty { node_type } => {
                write!(f, "type '{}' has no main property", node_type)
            }
            ReifyErrorKind::DuplicateMainProperty { name, node_type } => write!(
                f,
                "main property '{}' of type '{}' is set more than once",
                name, node_type
            ),
            ReifyErrorKind::NoMainSlot { node_type } => write!(
                f,
                "type '{}' has no main slot for content of other types",
                node_type
            ),
            ReifyErrorKind::NotInParagraph { node_type } => {
                write!(f, "type '{}' cannot appear in a paragraph", node_type)
            }
            ReifyErrorKind::MissingPath => write!(f, "include requires a path"),
            ReifyErrorKind::IncludeCycle { path } => {
                write!(f, "'{}' includes itself", path)
            }
            ReifyErrorKind::IncludeDepthExceeded { limit } => {
                write!(f, "includes nested deeper than {}", limit)
            }
            ReifyErrorKind::UnexpectedNodeType { node_type } => {
                write!(f, "type '{}' cannot be used as a node", node_type)
            }
            ReifyErrorKind::Macro { message } => write!(f, "macro failed: {}", message),
        }
    }
}

/// Return early with a [`ReifyError`] at one or more positions.
///
/// # Usage
/// ```ignore
/// bail_at!(env, ReifyErrorKind::MissingPath, start);
/// bail_at!(env, ReifyErrorKind::DuplicateProperty { name }, first, second);
/// ```
#[macro_export]
macro_rules! bail_at {
    ($env:expr, $kind:expr, $($pos:expr),+ $(,)?) => {
        return Err($crate::error::Error::Reify($crate::error::ReifyError::new(
            $kind,
            [$($pos),+],
            $env,
        )))
    };
}

/// Converts an error returned by a macro callback.
///
/// Diagnostics produced by nested reification pass through untouched so the
/// caller sees the innermost failure.
pub(crate) fn from_macro_error(
    err: anyhow::Error,
    position: Position,
    environment: &Environment,
) -> Error {
    match err.downcast::<Error>() {
        Ok(err) => err,
        Err(err) => Error::Reify(ReifyError::new(
            ReifyErrorKind::Macro {
                message: format!("{:#}", err),
            },
            [position],
            environment,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::NullRead;
    use crate::types::Registry;
    use std::sync::Arc;

    fn env() -> Environment {
        Environment::new(Arc::new(NullRead), "/doc.gob", Arc::new(Registry::empty()))
    }

    fn fails(env: &Environment) -> Result<(), Error> {
        bail_at!(
            env,
            ReifyErrorKind::DuplicateProperty { name: "a".into() },
            Position::new(1, 2, 1),
            Position::new(1, 6, 5),
        );
    }

    #[test]
    fn bail_at_collects_positions() {
        let err = fails(&env()).unwrap_err();
        let reify = err.as_reify().unwrap();

        assert_eq!(reify.positions.len(), 2);
        assert_eq!(reify.position(), Some(Position::new(1, 2, 1)));
        assert_eq!(err.kind_name(), "reify");
    }

    #[test]
    fn reify_error_display_mentions_file() {
        let err = fails(&env()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "property 'a' is set more than once at 1:2 in /doc.gob"
        );
    }

    #[test]
    fn read_error_keeps_position() {
        let err = Error::Read {
            position: Position::new(3, 1, 20),
            error: ReadError::new("/x", "gone"),
        };

        assert_eq!(err.positions().as_slice(), &[Position::new(3, 1, 20)]);
        assert_eq!(err.to_string(), "cannot read '/x': gone at 3:1");
    }

    #[test]
    fn macro_errors_pass_through_diagnostics() {
        let env = env();
        let inner = fails(&env).unwrap_err();

        let err = from_macro_error(anyhow::Error::new(inner), Position::start(), &env);
        assert!(matches!(
            err.as_reify().map(|e| &e.kind),
            Some(ReifyErrorKind::DuplicateProperty { .. })
        ));

        let err = from_macro_error(anyhow::anyhow!("boom"), Position::start(), &env);
        assert!(matches!(
            err.as_reify().map(|e| &e.kind),
            Some(ReifyErrorKind::Macro { message }) if message == "boom"
        ));
    }
}
