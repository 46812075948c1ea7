//! Node types and the registry that owns them.
//!
//! Embedders describe their node shapes with [`TypeDecl`] values (lists,
//! maps and macros, each possibly carrying named child types) and hand them
//! to [`Registry::build`]. The registry flattens every declared type into an
//! arena and stamps each child with a link to its parent. Reified nodes refer
//! to their type by [`TypeId`], so two same-named child types under different
//! parents never compare equal.
//!
//! Four built-in types are always present: `text`, `paragraph`, `include`
//! and `read`.

use crate::context::Environment;
use crate::node::{Line, MacroNode};
use gobbo_syntax::PreContent;
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

pub const TEXT: &str = "text";
pub const PARAGRAPH: &str = "paragraph";
pub const INCLUDE: &str = "include";
pub const READ: &str = "read";

const BUILTIN_NAMES: [&str; 4] = [TEXT, PARAGRAPH, INCLUDE, READ];

/// Expands a pre macro into markup that is reified in the caller's
/// environment.
pub type PreExpand =
    Arc<dyn Fn(&Environment, &MacroNode) -> anyhow::Result<PreContent> + Send + Sync>;

/// Expands a post macro straight into reified lines.
pub type PostExpand =
    Arc<dyn Fn(&Environment, &MacroNode) -> anyhow::Result<Vec<Line>> + Send + Sync>;

/// Handle of a type inside its [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct NodeType {
    pub name: String,
    pub parent: Option<TypeId>,
    /// Receives the unlabeled `{=value}` of a property block.
    pub main_property_name: Option<String>,
    pub kind: TypeKind,
}

impl NodeType {
    /// Whether nodes of this type are swept into implicit paragraphs.
    pub fn in_paragraph(&self) -> bool {
        match &self.kind {
            TypeKind::Text => true,
            TypeKind::List(list) => list.in_paragraph,
            TypeKind::Map(map) => map.in_paragraph,
            TypeKind::PreMacro(_) | TypeKind::PostMacro(_) | TypeKind::Misc => false,
        }
    }

    pub fn children(&self) -> Option<&FxHashMap<String, TypeId>> {
        match &self.kind {
            TypeKind::List(list) => Some(&list.children),
            TypeKind::Map(map) => Some(&map.children),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListType> {
        match &self.kind {
            TypeKind::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapType> {
        match &self.kind {
            TypeKind::Map(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub enum TypeKind {
    Text,
    List(ListType),
    Map(MapType),
    PreMacro(PreExpand),
    PostMacro(PostExpand),
    /// `include` and `read`: carry properties only.
    Misc,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Text => write!(f, "Text"),
            TypeKind::List(list) => f.debug_tuple("List").field(list).finish(),
            TypeKind::Map(map) => f.debug_tuple("Map").field(map).finish(),
            TypeKind::PreMacro(_) => write!(f, "PreMacro(..)"),
            TypeKind::PostMacro(_) => write!(f, "PostMacro(..)"),
            TypeKind::Misc => write!(f, "Misc"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListType {
    pub contains_paragraphs: bool,
    pub in_paragraph: bool,
    pub children: FxHashMap<String, TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct MapType {
    pub in_paragraph: bool,
    pub children: FxHashMap<String, TypeId>,
    /// Child types that receive explicitly typed content, in slot order.
    pub mapped: Vec<TypeId>,
    pub main_slot: Option<MainSlot>,
}

impl MapType {
    pub fn is_mapped(&self, id: TypeId) -> bool {
        self.mapped.contains(&id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainSlot {
    pub child: TypeId,
    pub mode: SlotMode,
}

/// How implicit content of a map node is distributed into its main slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    /// All leftover content becomes a single node.
    WholeBlock,
    /// Leftover content of each source line becomes its own node.
    PerLine,
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum TypeDecl {
    List(ListDecl),
    Map(MapDecl),
    PreMacro(PreMacroDecl),
    PostMacro(PostMacroDecl),
}

impl From<ListDecl> for TypeDecl {
    fn from(decl: ListDecl) -> Self {
        TypeDecl::List(decl)
    }
}

impl From<MapDecl> for TypeDecl {
    fn from(decl: MapDecl) -> Self {
        TypeDecl::Map(decl)
    }
}

impl From<PreMacroDecl> for TypeDecl {
    fn from(decl: PreMacroDecl) -> Self {
        TypeDecl::PreMacro(decl)
    }
}

impl From<PostMacroDecl> for TypeDecl {
    fn from(decl: PostMacroDecl) -> Self {
        TypeDecl::PostMacro(decl)
    }
}

#[derive(Clone, Default)]
pub struct ListDecl {
    contains_paragraphs: bool,
    in_paragraph: bool,
    main_property_name: Option<String>,
    children: Vec<(String, TypeDecl)>,
}

impl ListDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_paragraphs(mut self) -> Self {
        self.contains_paragraphs = true;
        self
    }

    pub fn in_paragraph(mut self) -> Self {
        self.in_paragraph = true;
        self
    }

    pub fn main_property(mut self, name: impl Into<String>) -> Self {
        self.main_property_name = Some(name.into());
        self
    }

    pub fn child(mut self, name: impl Into<String>, decl: impl Into<TypeDecl>) -> Self {
        self.children.push((name.into(), decl.into()));
        self
    }
}

#[derive(Clone, Default)]
pub struct MapDecl {
    in_paragraph: bool,
    main_property_name: Option<String>,
    children: Vec<(String, TypeDecl)>,
    mapped: Vec<String>,
    main_slot: Option<(String, SlotMode)>,
}

impl MapDecl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_paragraph(mut self) -> Self {
        self.in_paragraph = true;
        self
    }

    pub fn main_property(mut self, name: impl Into<String>) -> Self {
        self.main_property_name = Some(name.into());
        self
    }

    pub fn child(mut self, name: impl Into<String>, decl: impl Into<TypeDecl>) -> Self {
        self.children.push((name.into(), decl.into()));
        self
    }

    /// Declares the slots, in order. Each must name a child type.
    pub fn mapped<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mapped.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn main_slot(mut self, name: impl Into<String>, mode: SlotMode) -> Self {
        self.main_slot = Some((name.into(), mode));
        self
    }
}

#[derive(Clone)]
pub struct PreMacroDecl {
    expand: PreExpand,
    main_property_name: Option<String>,
}

impl PreMacroDecl {
    pub fn new<F>(expand: F) -> Self
    where
        F: Fn(&Environment, &MacroNode) -> anyhow::Result<PreContent> + Send + Sync + 'static,
    {
        Self {
            expand: Arc::new(expand),
            main_property_name: None,
        }
    }

    pub fn main_property(mut self, name: impl Into<String>) -> Self {
        self.main_property_name = Some(name.into());
        self
    }
}

#[derive(Clone)]
pub struct PostMacroDecl {
    expand: PostExpand,
    main_property_name: Option<String>,
}

impl PostMacroDecl {
    pub fn new<F>(expand: F) -> Self
    where
        F: Fn(&Environment, &MacroNode) -> anyhow::Result<Vec<Line>> + Send + Sync + 'static,
    {
        Self {
            expand: Arc::new(expand),
            main_property_name: None,
        }
    }

    pub fn main_property(mut self, name: impl Into<String>) -> Self {
        self.main_property_name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    ReservedName { name: String },
    DuplicateGlobal { name: String },
    DuplicateChild { parent: String, child: String },
    UnknownMappedSlot { map: String, slot: String },
    /// The main slot is not a mapped, list-kinded child.
    InvalidMainSlot { map: String, slot: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::ReservedName { name } => {
                write!(f, "'{}' is the name of a built-in type", name)
            }
            RegistryError::DuplicateGlobal { name } => {
                write!(f, "global type '{}' is declared twice", name)
            }
            RegistryError::DuplicateChild { parent, child } => {
                write!(f, "type '{}' declares child '{}' twice", parent, child)
            }
            RegistryError::UnknownMappedSlot { map, slot } => {
                write!(f, "mapped slot '{}' of '{}' is not a child type", slot, map)
            }
            RegistryError::InvalidMainSlot { map, slot } => write!(
                f,
                "main slot '{}' of '{}' must be a mapped list type",
                slot, map
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Immutable arena of every known node type.
#[derive(Debug, Clone)]
pub struct Registry {
    types: Vec<NodeType>,
    globals: FxHashMap<String, TypeId>,
    text: TypeId,
    paragraph: TypeId,
    include: TypeId,
    read: TypeId,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds a registry from `(name, declaration)` pairs, keeping their
    /// order.
    pub fn build<I, N, D>(globals: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<TypeDecl>,
    {
        let mut builder = Self::builder();
        for (name, decl) in globals {
            builder = builder.global(name, decl);
        }
        builder.build()
    }

    /// A registry holding only the built-in types.
    pub fn empty() -> Self {
        let mut alloc = Allocator::default();
        let (text, paragraph, include, read) = alloc.builtins();
        let globals = alloc.globals;

        Self {
            types: alloc.types,
            globals,
            text,
            paragraph,
            include,
            read,
        }
    }

    pub fn get(&self, id: TypeId) -> &NodeType {
        &self.types[id.index()]
    }

    pub fn global(&self, name: &str) -> Option<TypeId> {
        self.globals.get(name).copied()
    }

    pub fn child(&self, parent: TypeId, name: &str) -> Option<TypeId> {
        self.get(parent)
            .children()
            .and_then(|children| children.get(name).copied())
    }

    /// Every type, user declarations first (depth-first), built-ins last.
    pub fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len()).map(|idx| TypeId(idx as u32))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `parent\child` path of a type, as it would be written in markup.
    pub fn qualified_name(&self, id: TypeId) -> String {
        let mut segments = vec![self.get(id).name.as_str()];
        let mut parent = self.get(id).parent;

        while let Some(p) = parent {
            segments.push(self.get(p).name.as_str());
            parent = self.get(p).parent;
        }

        segments.reverse();
        segments.join("\\")
    }

    pub fn text(&self) -> TypeId {
        self.text
    }

    pub fn paragraph(&self) -> TypeId {
        self.paragraph
    }

    pub fn include(&self) -> TypeId {
        self.include
    }

    pub fn read(&self) -> TypeId {
        self.read
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Index<TypeId> for Registry {
    type Output = NodeType;

    fn index(&self, id: TypeId) -> &NodeType {
        self.get(id)
    }
}

#[derive(Clone, Default)]
pub struct RegistryBuilder {
    globals: Vec<(String, TypeDecl)>,
}

impl RegistryBuilder {
    pub fn global(mut self, name: impl Into<String>, decl: impl Into<TypeDecl>) -> Self {
        self.globals.push((name.into(), decl.into()));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut alloc = Allocator::default();

        for (name, decl) in self.globals {
            if BUILTIN_NAMES.contains(&name.as_str()) {
                return Err(RegistryError::ReservedName { name });
            }
            if alloc.globals.contains_key(&name) {
                return Err(RegistryError::DuplicateGlobal { name });
            }

            let id = alloc.declare(name.clone(), None, decl)?;
            alloc.globals.insert(name, id);
        }

        let (text, paragraph, include, read) = alloc.builtins();

        tracing::debug!(types = alloc.types.len(), "built type registry");

        Ok(Registry {
            types: alloc.types,
            globals: alloc.globals,
            text,
            paragraph,
            include,
            read,
        })
    }
}

#[derive(Default)]
struct Allocator {
    types: Vec<NodeType>,
    globals: FxHashMap<String, TypeId>,
}

impl Allocator {
    fn push(&mut self, node_type: NodeType) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(node_type);
        id
    }

    fn builtins(&mut self) -> (TypeId, TypeId, TypeId, TypeId) {
        let mut builtin = |name: &str, main: Option<&str>, kind: TypeKind| {
            let id = self.push(NodeType {
                name: name.to_string(),
                parent: None,
                main_property_name: main.map(str::to_string),
                kind,
            });
            self.globals.insert(name.to_string(), id);
            id
        };

        let text = builtin(TEXT, None, TypeKind::Text);
        let paragraph = builtin(PARAGRAPH, None, TypeKind::List(ListType::default()));
        let include = builtin(INCLUDE, Some("path"), TypeKind::Misc);
        let read = builtin(READ, Some("path"), TypeKind::Misc);

        (text, paragraph, include, read)
    }

    fn qualified_name(&self, id: TypeId) -> String {
        let node_type = &self.types[id.index()];
        match node_type.parent {
            Some(parent) => format!("{}\\{}", self.qualified_name(parent), node_type.name),
            None => node_type.name.clone(),
        }
    }

    /// Allocates `decl` and, depth-first, all of its children.
    fn declare(
        &mut self,
        name: String,
        parent: Option<TypeId>,
        decl: TypeDecl,
    ) -> Result<TypeId, RegistryError> {
        let id = self.push(NodeType {
            name,
            parent,
            main_property_name: None,
            kind: TypeKind::Misc,
        });

        let (main_property_name, kind) = match decl {
            TypeDecl::List(list) => {
                let children = self.declare_children(id, list.children)?;
                (
                    list.main_property_name,
                    TypeKind::List(ListType {
                        contains_paragraphs: list.contains_paragraphs,
                        in_paragraph: list.in_paragraph,
                        children,
                    }),
                )
            }
            TypeDecl::Map(map) => {
                let children = self.declare_children(id, map.children)?;
                let map_type = self.map_type(id, map.in_paragraph, children, map.mapped, map.main_slot)?;
                (map.main_property_name, TypeKind::Map(map_type))
            }
            TypeDecl::PreMacro(mac) => (mac.main_property_name, TypeKind::PreMacro(mac.expand)),
            TypeDecl::PostMacro(mac) => (mac.main_property_name, TypeKind::PostMacro(mac.expand)),
        };

        let node_type = &mut self.types[id.index()];
        node_type.main_property_name = main_property_name;
        node_type.kind = kind;

        Ok(id)
    }

    fn declare_children(
        &mut self,
        parent: TypeId,
        children: Vec<(String, TypeDecl)>,
    ) -> Result<FxHashMap<String, TypeId>, RegistryError> {
        let mut ids = FxHashMap::default();

        for (name, decl) in children {
            if ids.contains_key(&name) {
                return Err(RegistryError::DuplicateChild {
                    parent: self.qualified_name(parent),
                    child: name,
                });
            }

            let id = self.declare(name.clone(), Some(parent), decl)?;
            ids.insert(name, id);
        }

        Ok(ids)
    }

    fn map_type(
        &self,
        id: TypeId,
        in_paragraph: bool,
        children: FxHashMap<String, TypeId>,
        mapped: Vec<String>,
        main_slot: Option<(String, SlotMode)>,
    ) -> Result<MapType, RegistryError> {
        let mut slots = Vec::with_capacity(mapped.len());

        for slot in mapped {
            match children.get(&slot) {
                Some(child) if !slots.contains(child) => slots.push(*child),
                Some(_) => {}
                None => {
                    return Err(RegistryError::UnknownMappedSlot {
                        map: self.qualified_name(id),
                        slot,
                    });
                }
            }
        }

        let main_slot = match main_slot {
            Some((slot, mode)) => {
                let child = children
                    .get(&slot)
                    .copied()
                    .filter(|child| slots.contains(child))
                    .filter(|child| self.types[child.index()].as_list().is_some());

                match child {
                    Some(child) => Some(MainSlot { child, mode }),
                    None => {
                        return Err(RegistryError::InvalidMainSlot {
                            map: self.qualified_name(id),
                            slot,
                        });
                    }
                }
            }
            None => None,
        };

        Ok(MapType {
            in_paragraph,
            children,
            mapped: slots,
            main_slot,
        })
    }
}
