//! Property values, type paths, and the class/default cascade.

use crate::bail_at;
use crate::context::Environment;
use crate::error::{Error, ReifyErrorKind};
use crate::node::Properties;
use crate::types::TypeId;
use gobbo_syntax::{self as syntax, Class, Position, PreambleElement, PreambleElementKind, PropertySetting, PropertyValue, TypePath};
use rustc_hash::FxHashMap;
use tracing::trace;

pub(crate) fn resolve_value(env: &Environment, value: &PropertyValue) -> Result<String, Error> {
    match value {
        PropertyValue::Literal(word) => Ok(word.content.clone()),
        PropertyValue::Escaped(escaped) => Ok(escaped.text.content.clone()),
        PropertyValue::Bound { name, .. } => match env.value(&name.content) {
            Some(value) => Ok(value.to_string()),
            None => bail_at!(
                env,
                ReifyErrorKind::UnboundValue {
                    name: name.content.clone()
                },
                name.start
            ),
        },
    }
}

pub(crate) fn resolve_type_path(env: &Environment, path: &TypePath) -> Result<TypeId, Error> {
    let registry = env.registry();

    let mut id = match path {
        TypePath::Absolute { global, .. } => match registry.global(&global.content) {
            Some(id) => id,
            None => bail_at!(
                env,
                ReifyErrorKind::UnknownType {
                    name: global.content.clone()
                },
                global.start
            ),
        },
        TypePath::Relative { .. } => match env.current_node_type() {
            Some(id) => id,
            None => bail_at!(env, ReifyErrorKind::RelativePathOutsideNode, path.start()),
        },
    };

    for child in path.children() {
        id = match registry.child(id, &child.name.content) {
            Some(id) => id,
            None => bail_at!(
                env,
                ReifyErrorKind::UnknownType {
                    name: format!("{}\\{}", registry.qualified_name(id), child.name.content)
                },
                child.start
            ),
        };
    }

    trace!(path = %registry.qualified_name(id), "resolved type path");
    Ok(id)
}

/// A property block with its values resolved.
struct Settings {
    main: Option<(String, Position)>,
    /// `(name, value, position of name)` in source order.
    other: Vec<(String, String, Position)>,
}

impl Settings {
    fn names_main(&self, main_property_name: &str) -> Option<Position> {
        self.other
            .iter()
            .find(|(name, _, _)| name == main_property_name)
            .map(|(_, _, pos)| *pos)
    }
}

fn resolve_settings(env: &Environment, block: &syntax::Properties) -> Result<Settings, Error> {
    let main = match &block.main {
        Some(value) => Some((resolve_value(env, value)?, value.start())),
        None => None,
    };

    let mut seen: FxHashMap<&str, Position> = FxHashMap::default();
    let mut other = Vec::with_capacity(block.other.len());

    for setting in &block.other {
        let name = setting.name();

        if let Some(previous) = seen.insert(&name.content, name.start) {
            bail_at!(
                env,
                ReifyErrorKind::DuplicateProperty {
                    name: name.content.clone()
                },
                previous,
                name.start
            );
        }

        let value = match setting {
            PropertySetting::Pair { value, .. } => resolve_value(env, value)?,
            PropertySetting::True { .. } => "true".to_string(),
            PropertySetting::False { .. } => "false".to_string(),
        };

        other.push((name.content.clone(), value, name.start));
    }

    Ok(Settings { main, other })
}

/// Final properties of a node: defaults, then each class in order, then the
/// node's own block.
pub(crate) fn node_properties(
    env: &Environment,
    node_type: TypeId,
    classes: &[Class],
    local: Option<&syntax::Properties>,
) -> Result<Properties, Error> {
    let registry = env.registry();
    let mut properties = env.apply_defaults(node_type);

    for class in classes {
        match env.class(node_type, &class.name.content) {
            Some(bundle) => properties.extend(bundle.iter().map(|(k, v)| (k.clone(), v.clone()))),
            None => bail_at!(
                env,
                ReifyErrorKind::NoSuchClass {
                    class: class.name.content.clone(),
                    node_type: registry.qualified_name(node_type),
                },
                class.name.start
            ),
        }
    }

    let Some(block) = local else {
        return Ok(properties);
    };

    let settings = resolve_settings(env, block)?;
    let main_property_name = registry[node_type].main_property_name.as_deref();

    if let Some((value, main_start)) = settings.main.clone() {
        let Some(main_name) = main_property_name else {
            bail_at!(
                env,
                ReifyErrorKind::NoMainProperty {
                    node_type: registry.qualified_name(node_type)
                },
                main_start
            );
        };

        if let Some(setting_start) = settings.names_main(main_name) {
            bail_at!(
                env,
                ReifyErrorKind::DuplicateMainProperty {
                    name: main_name.to_string(),
                    node_type: registry.qualified_name(node_type),
                },
                main_start,
                setting_start
            );
        }

        properties.insert(main_name.to_string(), value);
    }

    properties.extend(settings.other.into_iter().map(|(name, value, _)| (name, value)));
    Ok(properties)
}

/// Where a `cla` or `def` declaration writes its properties.
#[derive(Clone, Copy)]
enum Target<'a> {
    Class(&'a str),
    Default,
}

impl Target<'_> {
    fn write(self, env: &Environment, node_type: TypeId, properties: Properties) -> Environment {
        match self {
            Target::Class(class) => env.extend_class(node_type, class, properties),
            Target::Default => env.extend_defaults(node_type, properties),
        }
    }
}

/// Folds a preamble into a single new environment. Later elements see the
/// effects of earlier ones.
pub(crate) fn apply_preamble(env: &Environment, preamble: &[PreambleElement]) -> Result<Environment, Error> {
    let mut env = env.clone();

    for element in preamble {
        env = apply_element(&env, element)?;
    }

    Ok(env)
}

fn apply_element(env: &Environment, element: &PreambleElement) -> Result<Environment, Error> {
    let fallback = element.fallback.is_some();

    match &element.kind {
        PreambleElementKind::Value { name, value } => {
            if fallback && env.value(&name.content).is_some() {
                trace!(name = %name.content, "value already bound, fallback skipped");
                return Ok(env.clone());
            }

            let value = resolve_value(env, value)?;
            trace!(name = %name.content, value = %value, "bound value");
            Ok(env.with_value(name.content.clone(), value))
        }
        PreambleElementKind::Content { name, content } => {
            if fallback && env.content(&name.content).is_some() {
                trace!(name = %name.content, "content already bound, fallback skipped");
                return Ok(env.clone());
            }

            trace!(name = %name.content, "bound content");
            Ok(env.with_content(name.content.clone(), content.clone()))
        }
        PreambleElementKind::Class {
            class,
            type_paths,
            classes,
            properties,
        } => {
            trace!(class = %class.name.content, targets = type_paths.len(), "class declaration");
            declare(
                env,
                Target::Class(&class.name.content),
                type_paths,
                classes,
                properties.as_ref(),
            )
        }
        PreambleElementKind::Default {
            type_paths,
            classes,
            properties,
        } => {
            trace!(targets = type_paths.len(), "default declaration");
            declare(env, Target::Default, type_paths, classes, properties.as_ref())
        }
    }
}

fn declare(
    env: &Environment,
    target: Target<'_>,
    type_paths: &[TypePath],
    classes: &[Class],
    block: Option<&syntax::Properties>,
) -> Result<Environment, Error> {
    if type_paths.is_empty() {
        declare_for_all(env, target, classes, block)
    } else {
        declare_for_paths(env, target, type_paths, classes, block)
    }
}

fn declare_for_paths(
    env: &Environment,
    target: Target<'_>,
    type_paths: &[TypePath],
    classes: &[Class],
    block: Option<&syntax::Properties>,
) -> Result<Environment, Error> {
    let registry = env.registry();
    let settings = match block {
        Some(block) => Some(resolve_settings(env, block)?),
        None => None,
    };

    let mut next = env.clone();

    for path in type_paths {
        let node_type = resolve_type_path(env, path)?;
        let mut properties = Properties::default();

        for class in classes {
            match next.class(node_type, &class.name.content) {
                Some(bundle) => properties.extend(bundle.iter().map(|(k, v)| (k.clone(), v.clone()))),
                None => bail_at!(
                    env,
                    ReifyErrorKind::NoSuchClass {
                        class: class.name.content.clone(),
                        node_type: registry.qualified_name(node_type),
                    },
                    class.name.start
                ),
            }
        }

        if let Some(settings) = &settings {
            let main_property_name = registry[node_type].main_property_name.as_deref();

            if let Some((value, main_start)) = &settings.main {
                let Some(main_name) = main_property_name else {
                    bail_at!(
                        env,
                        ReifyErrorKind::NoMainProperty {
                            node_type: registry.qualified_name(node_type)
                        },
                        path.start(),
                        *main_start
                    );
                };

                if let Some(setting_start) = settings.names_main(main_name) {
                    bail_at!(
                        env,
                        ReifyErrorKind::DuplicateMainProperty {
                            name: main_name.to_string(),
                            node_type: registry.qualified_name(node_type),
                        },
                        path.start(),
                        *main_start,
                        setting_start
                    );
                }

                properties.insert(main_name.to_string(), value.clone());
            }

            properties.extend(
                settings
                    .other
                    .iter()
                    .map(|(name, value, _)| (name.clone(), value.clone())),
            );
        }

        next = target.write(&next, node_type, properties);
    }

    Ok(next)
}

/// Applies a declaration without type paths to every type that has all the
/// listed classes and, when a main value is given, a main property that the
/// block does not also set by name. Other types are skipped.
fn declare_for_all(
    env: &Environment,
    target: Target<'_>,
    classes: &[Class],
    block: Option<&syntax::Properties>,
) -> Result<Environment, Error> {
    let registry = env.registry();
    let mut settings: Option<Settings> = None;
    let mut next = env.clone();
    let mut applied = 0usize;

    'types: for node_type in registry.ids() {
        let mut properties = Properties::default();

        for class in classes {
            match env.class(node_type, &class.name.content) {
                Some(bundle) => properties.extend(bundle.iter().map(|(k, v)| (k.clone(), v.clone()))),
                None => continue 'types,
            }
        }

        let main_property_name = registry[node_type].main_property_name.as_deref();

        if let Some(block) = block {
            if block.main.is_some() {
                let Some(main_name) = main_property_name else {
                    continue 'types;
                };
                if block.other.iter().any(|s| s.name().content == main_name) {
                    continue 'types;
                }
            }

            if settings.is_none() {
                settings = Some(resolve_settings(env, block)?);
            }

            if let Some(settings) = &settings {
                if let (Some((value, _)), Some(main_name)) = (&settings.main, main_property_name) {
                    properties.insert(main_name.to_string(), value.clone());
                }

                properties.extend(
                    settings
                        .other
                        .iter()
                        .map(|(name, value, _)| (name.clone(), value.clone())),
                );
            }
        }

        next = target.write(&next, node_type, properties);
        applied += 1;
    }

    trace!(applied, "declaration applied to all eligible types");
    Ok(next)
}
