//! The persistent resolution environment.
//!
//! An [`Environment`] is a value: every `with_*`/`extend_*` call returns a
//! new environment and leaves the receiver untouched, so an environment
//! captured by a sibling branch never observes what another branch did.
//!
//! Value and content bindings are chains of [`Arc`] frames: a new binding
//! adds one frame on top and shares everything below it. Class bundles and
//! defaults are per-type tables behind [`Arc`]s; extending one copies the
//! vector of table handles and the touched table, nothing else.

use crate::config::Config;
use crate::error::{Error, ReifyError, ReifyErrorKind};
use crate::node::{Node, Properties, TextNode};
use crate::read::Read;
use crate::types::{Registry, RegistryError, TypeDecl, TypeId};
use gobbo_syntax::{Position, PreContent};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type ClassTable = FxHashMap<String, Arc<Properties>>;

#[derive(Clone)]
pub struct Environment {
    read: Arc<dyn Read + Send + Sync>,
    current_file_path: String,
    values: Bindings<String>,
    contents: Bindings<PreContent>,
    registry: Arc<Registry>,
    /// Indexed by `TypeId`.
    classes: Arc<Vec<Arc<ClassTable>>>,
    /// Indexed by `TypeId`.
    defaults: Arc<Vec<Arc<Properties>>>,
    current_node_type: Option<TypeId>,
    includes: Option<Arc<IncludeFrame>>,
    config: Arc<Config>,
}

/// One binding; newer frames shadow older ones with the same name.
struct Binding<T> {
    name: String,
    value: T,
    parent: Bindings<T>,
}

type Bindings<T> = Option<Arc<Binding<T>>>;

fn bind<T>(parent: &Bindings<T>, name: String, value: T) -> Bindings<T> {
    Some(Arc::new(Binding {
        name,
        value,
        parent: parent.clone(),
    }))
}

fn lookup<'a, T>(bindings: &'a Bindings<T>, name: &str) -> Option<&'a T> {
    visible(bindings).find(|(bound, _)| *bound == name).map(|(_, value)| value)
}

/// Every binding from newest to oldest, shadowed ones included.
fn visible<T>(bindings: &Bindings<T>) -> impl Iterator<Item = (&str, &T)> {
    std::iter::successors(bindings.as_deref(), |frame| frame.parent.as_deref())
        .map(|frame| (frame.name.as_str(), &frame.value))
}

/// One `include` on the way to the current file.
#[derive(Debug)]
struct IncludeFrame {
    /// The file that contained the `include` node.
    path: String,
    depth: usize,
    parent: Option<Arc<IncludeFrame>>,
}

/// Builds the registry from `globals` and an environment starting at
/// `current_file_path` with empty bindings, classes and defaults.
pub fn create_environment<R, I, N, D>(
    read: R,
    current_file_path: impl Into<String>,
    globals: I,
) -> Result<Environment, RegistryError>
where
    R: Read + Send + Sync + 'static,
    I: IntoIterator<Item = (N, D)>,
    N: Into<String>,
    D: Into<TypeDecl>,
{
    let registry = Registry::build(globals)?;
    Ok(Environment::new(
        Arc::new(read),
        current_file_path,
        Arc::new(registry),
    ))
}

impl Environment {
    pub fn new(
        read: Arc<dyn Read + Send + Sync>,
        current_file_path: impl Into<String>,
        registry: Arc<Registry>,
    ) -> Self {
        let count = registry.len();

        Self {
            read,
            current_file_path: current_file_path.into(),
            values: None,
            contents: None,
            classes: Arc::new(vec![Arc::default(); count]),
            defaults: Arc::new(vec![Arc::default(); count]),
            registry,
            current_node_type: None,
            includes: None,
            config: Arc::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reader(&self) -> &(dyn Read + Send + Sync) {
        self.read.as_ref()
    }

    pub fn current_file_path(&self) -> &str {
        &self.current_file_path
    }

    /// The list or map type whose content is being reified, if any.
    pub fn current_node_type(&self) -> Option<TypeId> {
        self.current_node_type
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        lookup(&self.values, name).map(String::as_str)
    }

    pub fn content(&self, name: &str) -> Option<&PreContent> {
        lookup(&self.contents, name)
    }

    pub fn class(&self, node_type: TypeId, class: &str) -> Option<&Properties> {
        self.classes[node_type.index()]
            .get(class)
            .map(|props| props.as_ref())
    }

    pub fn defaults(&self, node_type: TypeId) -> &Properties {
        &self.defaults[node_type.index()]
    }

    /// How many includes lead to the current file.
    pub fn include_depth(&self) -> usize {
        self.includes.as_ref().map_or(0, |frame| frame.depth)
    }

    pub fn with_value(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut env = self.clone();
        env.values = bind(&self.values, name.into(), value.into());
        env
    }

    pub fn with_content(&self, name: impl Into<String>, content: PreContent) -> Self {
        let mut env = self.clone();
        env.contents = bind(&self.contents, name.into(), content);
        env
    }

    pub fn with_current_node_type(&self, node_type: TypeId) -> Self {
        let mut env = self.clone();
        env.current_node_type = Some(node_type);
        env
    }

    pub fn with_current_file_path(&self, path: impl Into<String>) -> Self {
        let mut env = self.clone();
        env.current_file_path = path.into();
        env
    }

    pub fn with_config(&self, config: Config) -> Self {
        let mut env = self.clone();
        env.config = Arc::new(config);
        env
    }

    /// Merges `properties` into class `class` of `node_type`, creating the
    /// class if needed.
    pub(crate) fn extend_class(&self, node_type: TypeId, class: &str, properties: Properties) -> Self {
        let mut env = self.clone();
        let classes = Arc::make_mut(&mut env.classes);
        let table = Arc::make_mut(&mut classes[node_type.index()]);
        let bundle = table.entry(class.to_string()).or_default();
        Arc::make_mut(bundle).extend(properties);
        env
    }

    pub(crate) fn extend_defaults(&self, node_type: TypeId, properties: Properties) -> Self {
        if properties.is_empty() {
            return self.clone();
        }

        let mut env = self.clone();
        let defaults = Arc::make_mut(&mut env.defaults);
        Arc::make_mut(&mut defaults[node_type.index()]).extend(properties);
        env
    }

    /// The environment for content read from `absolute_path` by an include
    /// at `position`.
    pub(crate) fn enter_include(&self, absolute_path: &str, position: Position) -> Result<Self, Error> {
        let depth = self.include_depth();

        if depth >= self.config.max_include_depth {
            return Err(Error::Reify(ReifyError::new(
                ReifyErrorKind::IncludeDepthExceeded {
                    limit: self.config.max_include_depth,
                },
                [position],
                self,
            )));
        }

        if self.config.detect_include_cycles && self.is_being_included(absolute_path) {
            return Err(Error::Reify(ReifyError::new(
                ReifyErrorKind::IncludeCycle {
                    path: absolute_path.to_string(),
                },
                [position],
                self,
            )));
        }

        let mut env = self.with_current_file_path(absolute_path);
        env.includes = Some(Arc::new(IncludeFrame {
            path: self.current_file_path.clone(),
            depth: depth + 1,
            parent: self.includes.clone(),
        }));
        Ok(env)
    }

    fn is_being_included(&self, absolute_path: &str) -> bool {
        // Readers without paths report "" for everything.
        if absolute_path.is_empty() {
            return false;
        }

        if self.current_file_path == absolute_path {
            return true;
        }

        let mut frame = self.includes.as_deref();
        while let Some(current) = frame {
            if current.path == absolute_path {
                return true;
            }
            frame = current.parent.as_deref();
        }

        false
    }

    /// A copy of the default properties of `node_type`.
    pub fn apply_defaults(&self, node_type: TypeId) -> Properties {
        self.defaults(node_type).clone()
    }

    /// A `text` node carrying the ambient text defaults.
    pub fn text_node(&self, content: impl Into<String>) -> Node {
        let node_type = self.registry.text();
        Node::Text(TextNode {
            node_type,
            properties: self.apply_defaults(node_type),
            content: content.into(),
        })
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = BTreeMap::new();
        for (name, value) in visible(&self.values) {
            values.entry(name).or_insert(value);
        }

        let mut contents: Vec<&str> = visible(&self.contents).map(|(name, _)| name).collect();
        contents.sort_unstable();
        contents.dedup();

        f.debug_struct("Environment")
            .field("current_file_path", &self.current_file_path)
            .field("values", &values)
            .field("contents", &contents)
            .field(
                "current_node_type",
                &self.current_node_type.map(|id| self.registry.qualified_name(id)),
            )
            .field("include_depth", &self.include_depth())
            .finish_non_exhaustive()
    }
}
