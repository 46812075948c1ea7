use gobbo_reify::*;
use gobbo_syntax::{LineElement, Position, PreContent, Text, parse};

fn basic_types() -> Vec<(&'static str, TypeDecl)> {
    vec![
        (
            "section",
            MapDecl::new()
                .child("title", ListDecl::new())
                .child("body", ListDecl::new().contains_paragraphs())
                .mapped(["title", "body"])
                .main_slot("body", SlotMode::WholeBlock)
                .into(),
        ),
        (
            "code",
            ListDecl::new().in_paragraph().main_property("language").into(),
        ),
        (
            "code-block",
            MapDecl::new()
                .main_property("language")
                .child("title", ListDecl::new())
                .child("code", ListDecl::new())
                .mapped(["title", "code"])
                .main_slot("code", SlotMode::WholeBlock)
                .into(),
        ),
        (
            "list",
            MapDecl::new()
                .child("item", ListDecl::new().contains_paragraphs())
                .mapped(["item"])
                .main_slot("item", SlotMode::PerLine)
                .into(),
        ),
        (
            "pair",
            MapDecl::new()
                .child("left", ListDecl::new())
                .child("right", ListDecl::new())
                .mapped(["left", "right"])
                .into(),
        ),
        ("note", ListDecl::new().contains_paragraphs().into()),
    ]
}

fn files() -> MemoryRead {
    MemoryRead::new()
        .with_file("/test.gobbo", "test")
        .with_file("/data/sub/test2.gobbo", "test2")
        .with_file("/data/sub/include-absolute.gobbo", "[read {=`/test.gobbo`}]\n")
        .with_file("/data/sub/include-relative.gobbo", "[read {=test2.gobbo}]\n")
        .with_file("/data/broken.gobbo", "[oops")
}

fn basic_env() -> Environment {
    create_environment(files(), "/data/reify_test.gobbo", basic_types()).unwrap()
}

fn reify_with(env: &Environment, source: &str) -> Result<Vec<Node>, Error> {
    let content = parse(source).unwrap();
    Ok(reify(env, &content, true)?.into_iter().flatten().collect())
}

fn nodes(source: &str) -> Vec<Node> {
    reify_with(&basic_env(), source).unwrap()
}

fn error(source: &str) -> Error {
    reify_with(&basic_env(), source).unwrap_err()
}

fn reify_kind(err: &Error) -> &ReifyErrorKind {
    &err.as_reify().expect("reify error").kind
}

fn type_name(env: &Environment, node: &Node) -> String {
    env.registry().qualified_name(node.node_type())
}

fn first_child(node: &Node) -> &Node {
    &node.as_list().unwrap().content[0]
}

fn text(node: &Node) -> &str {
    &node.as_text().unwrap().content
}

#[test]
fn top_level_content_gets_implicit_paragraphs() {
    let env = basic_env();
    let nodes = reify_with(&env, "foo").unwrap();

    assert_eq!(type_name(&env, &nodes[0]), "paragraph");
    assert_eq!(text(first_child(&nodes[0])), "foo");
}

#[test]
fn paragraphs_can_be_turned_off() {
    let env = basic_env();
    let lines = reify(&env, &parse("foo").unwrap(), false).unwrap();

    assert_eq!(type_name(&env, &lines[0][0]), "text");
}

#[test]
fn empty_lines_are_kept_without_paragraphs() {
    let env = basic_env();
    let content = parse("_[gone]\nfoo\n[<val x y>]").unwrap();
    let lines = reify(&env, &content, false).unwrap();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].is_empty());
    assert_eq!(text(&lines[1][0]), "foo");
    assert!(lines[2].is_empty());
}

#[test]
fn empty_lines_vanish_in_paragraphs() {
    let env = basic_env();
    let lines = reify(&env, &parse("_[gone]\nfoo").unwrap(), true).unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(type_name(&env, &lines[0][0]), "paragraph");
}

#[test]
fn value_binding_is_substituted() {
    let nodes = nodes("<val x y>\n[val x]");
    assert_eq!(text(first_child(&nodes[0])), "y");
}

#[test]
fn unbound_value_names_identifier() {
    let err = error("[val x]");

    assert_eq!(reify_kind(&err), &ReifyErrorKind::UnboundValue { name: "x".into() });
    assert_eq!(err.positions().as_slice(), &[Position::new(1, 6, 5)]);
}

#[test]
fn content_use_applies_its_own_preamble() {
    let nodes = nodes("<con x [[val x]]> [con x <val x 456>]");
    assert_eq!(text(first_child(&nodes[0])), "456");
}

#[test]
fn unbound_content_names_identifier() {
    let err = error("[con nope]");
    assert_eq!(reify_kind(&err), &ReifyErrorKind::UnboundContent { name: "nope".into() });
}

#[test]
fn fallback_content_keeps_first_binding() {
    let nodes = nodes("<con x [a]>\n<?con x [b]>\n[con x]");
    assert_eq!(text(first_child(&nodes[0])), "a");
}

#[test]
fn bindings_are_block_scoped() {
    let err = error("[<val x 1> a] [val x]");
    assert_eq!(reify_kind(&err), &ReifyErrorKind::UnboundValue { name: "x".into() });
}

#[test]
fn default_properties_on_implicit_text() {
    let nodes = nodes("<def text {a=b c !d}> foo");
    let paragraph = &nodes[0];
    let foo = first_child(paragraph);

    assert_eq!(paragraph.property("a"), None);
    assert_eq!(text(foo), "foo");
    assert_eq!(foo.property("a"), Some("b"));
    assert_eq!(foo.property("c"), Some("true"));
    assert_eq!(foo.property("d"), Some("false"));
}

#[test]
fn default_properties_on_explicit_and_bound_text() {
    let nodes = nodes("<def text {a}> [text foo]");
    assert_eq!(first_child(&nodes[0]).property("a"), Some("true"));

    let nodes = self::nodes("<def text {a}> <val x y> [val x]");
    assert_eq!(first_child(&nodes[0]).property("a"), Some("true"));
}

#[test]
fn default_properties_for_several_paths() {
    let nodes = nodes("<def paragraph text {a}> foo");

    assert_eq!(nodes[0].property("a"), Some("true"));
    assert_eq!(first_child(&nodes[0]).property("a"), Some("true"));
}

#[test]
fn default_properties_without_paths() {
    let nodes = nodes("<def {a}> foo");

    assert_eq!(nodes[0].property("a"), Some("true"));
    assert_eq!(first_child(&nodes[0]).property("a"), Some("true"));
}

#[test]
fn default_main_property() {
    let nodes = nodes("<def code {=gobbo}> [code]");
    assert_eq!(first_child(&nodes[0]).property("language"), Some("gobbo"));

    let nodes = self::nodes("<def code {language=gobbo}> [code]");
    assert_eq!(first_child(&nodes[0]).property("language"), Some("gobbo"));
}

#[test]
fn default_main_property_errors() {
    assert!(matches!(
        reify_kind(&error("<def text {=foo}>")),
        ReifyErrorKind::NoMainProperty { .. }
    ));
    assert!(matches!(
        reify_kind(&error("<def code {=gobbo language=gobbo}> [code]")),
        ReifyErrorKind::DuplicateMainProperty { .. }
    ));

    // Without paths, ineligible types are skipped.
    assert!(nodes("<def {=foo}>").is_empty());
}

#[test]
fn untargeted_defaults_skip_types_without_main_property() {
    let nodes = nodes("<def {=foo bar}> [code a]");
    let paragraph = &nodes[0];
    let code = first_child(paragraph);

    assert_eq!(paragraph.property("bar"), None);
    assert_eq!(code.property("language"), Some("foo"));
    assert_eq!(code.property("bar"), Some("true"));
    assert_eq!(first_child(code).property("bar"), None);
}

#[test]
fn in_paragraph_types_join_implicit_paragraphs() {
    let env = basic_env();
    let nodes = reify_with(&env, "[code a]").unwrap();
    let code = first_child(&nodes[0]);

    assert_eq!(type_name(&env, code), "code");
    assert_eq!(type_name(&env, first_child(code)), "text");
    assert_eq!(text(first_child(code)), "a");
}

#[test]
fn contains_paragraphs_wraps_each_line() {
    let env = basic_env();

    let lines = reify(&env, &parse("foo\nbar").unwrap(), true).unwrap();
    assert_eq!(lines.len(), 2);
    for (line, expected) in lines.iter().zip(["foo", "bar"]) {
        assert_eq!(line.len(), 1);
        assert_eq!(type_name(&env, &line[0]), "paragraph");
        assert_eq!(line[0].as_list().unwrap().content.len(), 1);
        assert_eq!(text(first_child(&line[0])), expected);
    }

    let nodes = reify_with(&env, "[note foo\nbar]").unwrap();
    let note = nodes[0].as_list().unwrap();
    assert_eq!(note.content.len(), 2);
    assert_eq!(text(first_child(&note.content[0])), "foo");
    assert_eq!(text(first_child(&note.content[1])), "bar");
}

#[test]
fn section_body_gets_paragraphs() {
    let env = basic_env();
    let nodes = reify_with(&env, "[section bar]").unwrap();
    let section = nodes[0].as_map().unwrap();

    let names: Vec<&str> = section.slots.iter().map(|slot| slot.name.as_str()).collect();
    assert_eq!(names, vec!["title", "body"]);

    let body = &section.slot("body").unwrap()[0];
    assert_eq!(type_name(&env, first_child(body)), "paragraph");
}

#[test]
fn explicit_paragraph() {
    let env = basic_env();
    let nodes = reify_with(&env, "<def paragraph {a}> [paragraph foo] bar").unwrap();

    assert_eq!(nodes[0].node_type(), nodes[1].node_type());
    assert_eq!(nodes[0].property("a"), Some("true"));

    let nodes = reify_with(&env, "[paragraph [code foo]]").unwrap();
    assert_eq!(type_name(&env, first_child(&nodes[0])), "code");
}

#[test]
fn explicit_paragraph_rejects_blocks() {
    assert_eq!(
        reify_kind(&error("[paragraph [section foo]]")),
        &ReifyErrorKind::NotInParagraph {
            node_type: "section".into()
        }
    );
}

#[test]
fn blocks_sit_between_implicit_paragraphs() {
    let env = basic_env();
    let nodes = reify_with(&env, "foo [section] baz").unwrap();

    assert_eq!(nodes.len(), 3);
    assert_eq!(type_name(&env, &nodes[1]), "section");
}

#[test]
fn local_properties() {
    assert_eq!(nodes("[paragraph {foo}]")[0].property("foo"), Some("true"));
    assert_eq!(
        nodes("<def paragraph {foo}> [paragraph {!foo}]")[0].property("foo"),
        Some("false")
    );
}

#[test]
fn property_shorthand_makes_text_node() {
    let env = basic_env();
    let nodes = reify_with(&env, "<def text {foo}> [{!foo bar}]").unwrap();
    let shorthand = first_child(&nodes[0]);

    assert_eq!(type_name(&env, shorthand), "text");
    assert_eq!(shorthand.property("foo"), Some("false"));
    assert_eq!(shorthand.property("bar"), Some("true"));
}

#[test]
fn duplicate_local_property() {
    let err = error("[paragraph {a !a}]");
    assert_eq!(reify_kind(&err), &ReifyErrorKind::DuplicateProperty { name: "a".into() });
    assert_eq!(err.positions().len(), 2);
}

#[test]
fn local_main_property() {
    let nodes = nodes("[code {=rust} x]");
    assert_eq!(first_child(&nodes[0]).property("language"), Some("rust"));

    assert!(matches!(
        reify_kind(&error("[paragraph {=x}]")),
        ReifyErrorKind::NoMainProperty { .. }
    ));
    assert!(matches!(
        reify_kind(&error("[code {=rust language=c}]")),
        ReifyErrorKind::DuplicateMainProperty { .. }
    ));
}

#[test]
fn consecutive_preamble_elements() {
    let nodes = nodes("<val x x> <def paragraph {foo=<val x>}> [paragraph]");
    assert_eq!(nodes[0].property("foo"), Some("x"));
}

#[test]
fn classes() {
    assert_eq!(
        nodes("<cla .foo paragraph {bar}> [paragraph.foo]")[0].property("bar"),
        Some("true")
    );
    assert_eq!(
        nodes("<cla .foo paragraph {bar}> [paragraph.foo {!bar}]")[0].property("bar"),
        Some("false")
    );
    assert_eq!(
        nodes("<cla .foo paragraph {bar}> [paragraph]")[0].property("bar"),
        None
    );
}

#[test]
fn classes_apply_in_order() {
    let nodes = nodes(
        "<cla .foo paragraph {bar}> <cla .baz paragraph {!bar}> [paragraph.foo.baz][paragraph.baz.foo]",
    );

    assert_eq!(nodes[0].property("bar"), Some("false"));
    assert_eq!(nodes[1].property("bar"), Some("true"));
}

#[test]
fn classes_on_text_shorthands() {
    let nodes = nodes("<cla .foo text {bar}> [text.foo][.foo][.foo {baz}]");
    let paragraph = nodes[0].as_list().unwrap();

    assert_eq!(paragraph.content.len(), 3);
    for text in &paragraph.content {
        assert_eq!(text.property("bar"), Some("true"));
    }
}

#[test]
fn class_is_scoped_to_its_type() {
    let nodes = nodes("<cla .foo paragraph {bar}> <cla .foo text {baz}> [paragraph.foo [.foo baz]]");
    let paragraph = &nodes[0];
    let inner = first_child(paragraph);

    assert_eq!(paragraph.property("bar"), Some("true"));
    assert_eq!(paragraph.property("baz"), None);
    assert_eq!(inner.property("bar"), None);
    assert_eq!(inner.property("baz"), Some("true"));
}

#[test]
fn class_for_several_types() {
    let nodes = nodes("<cla .foo paragraph text {bar}> [paragraph.foo [.foo baz]]");

    assert_eq!(nodes[0].property("bar"), Some("true"));
    assert_eq!(first_child(&nodes[0]).property("bar"), Some("true"));
}

#[test]
fn class_without_types_applies_to_eligible_types() {
    let nodes = self::nodes("<cla .foo {bar}> [paragraph.foo [.foo]]");
    assert_eq!(nodes[0].property("bar"), Some("true"));
    assert_eq!(first_child(&nodes[0]).property("bar"), Some("true"));

    let nodes = self::nodes("<cla .foo {=bar}> [code.foo]");
    assert_eq!(first_child(&nodes[0]).property("language"), Some("bar"));

    assert_eq!(
        reify_kind(&error("<cla .foo {=bar}> [paragraph.foo]")),
        &ReifyErrorKind::NoSuchClass {
            class: "foo".into(),
            node_type: "paragraph".into()
        }
    );
}

#[test]
fn declarations_with_only_classes() {
    assert_eq!(
        nodes("<cla .foo paragraph {bar}> <def paragraph .foo> [paragraph]")[0].property("bar"),
        Some("true")
    );
    assert_eq!(
        nodes("<cla .foo paragraph {bar}> <cla .baz paragraph .foo> [paragraph.baz]")[0]
            .property("bar"),
        Some("true")
    );
}

#[test]
fn extending_a_class_overrides_only_restated_properties() {
    let nodes = nodes("<cla .foo paragraph {bar baz}> <cla .foo paragraph .foo {!baz}> [paragraph.foo]");

    assert_eq!(nodes[0].property("bar"), Some("true"));
    assert_eq!(nodes[0].property("baz"), Some("false"));
}

#[test]
fn list_items() {
    let nodes = self::nodes("[list]");
    assert!(nodes[0].as_map().unwrap().slot("item").unwrap().is_empty());

    let nodes = self::nodes("[list [\\item foo]]");
    let items = nodes[0].as_map().unwrap().slot("item").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(text(first_child(first_child(&items[0]))), "foo");

    let nodes = self::nodes("[list [\\item foo][\\item bar]]");
    assert_eq!(nodes[0].as_map().unwrap().slot("item").unwrap().len(), 2);

    let nodes = self::nodes("[list [\\item foo]\n[\\item bar]]");
    assert_eq!(nodes[0].as_map().unwrap().slot("item").unwrap().len(), 2);
}

fn item_texts(list: &Node) -> Vec<&Node> {
    list.as_map()
        .unwrap()
        .slot("item")
        .unwrap()
        .iter()
        .map(|item| first_child(first_child(item)))
        .collect()
}

#[test]
fn each_line_is_an_implicit_item() {
    let nodes = nodes("[list foo\nbar\nbaz]");
    let texts: Vec<&str> = item_texts(&nodes[0]).into_iter().map(text).collect();

    assert_eq!(texts, vec!["foo", "bar", "baz"]);
}

#[test]
fn nested_blocks_split_implicit_items() {
    let nodes = nodes("[list foo\n[<def text {flag}> bar\nbaz]\nqux]");
    let flags: Vec<Option<&str>> = item_texts(&nodes[0])
        .into_iter()
        .map(|text| text.property("flag"))
        .collect();

    assert_eq!(flags, vec![None, Some("true"), Some("true"), None]);
}

#[test]
fn nested_preamble_reaches_only_explicit_items() {
    let nodes = nodes("[list foo\n[<def \\item {flag}> bar\n[\\item baz]]\nqux]");
    let items = nodes[0].as_map().unwrap().slot("item").unwrap();
    let flags: Vec<Option<&str>> = items.iter().map(|item| item.property("flag")).collect();

    assert_eq!(flags, vec![None, None, Some("true"), None]);
}

#[test]
fn defaults_for_child_types() {
    let nodes = nodes("<def list\\item {foo}> [list [\\item][\\item]]");
    let list = &nodes[0];
    let items = list.as_map().unwrap().slot("item").unwrap();

    assert_eq!(list.property("foo"), None);
    assert!(items.iter().all(|item| item.property("foo") == Some("true")));
}

#[test]
fn mapped_nodes_from_nested_blocks() {
    let nodes = nodes("[list [\\item][<def \\item {foo}> [\\item][\\item]][\\item]]");
    let items = nodes[0].as_map().unwrap().slot("item").unwrap();
    let flags: Vec<Option<&str>> = items.iter().map(|item| item.property("foo")).collect();

    assert_eq!(flags, vec![None, Some("true"), Some("true"), None]);
}

#[test]
fn code_block_slots() {
    let env = basic_env();

    let nodes = reify_with(&env, "[code-block]").unwrap();
    let block = nodes[0].as_map().unwrap();
    assert!(block.slot("title").unwrap().is_empty());
    assert!(block.slot("code").unwrap().is_empty());

    let nodes = reify_with(&env, "[code-block foo]").unwrap();
    let code = &nodes[0].as_map().unwrap().slot("code").unwrap()[0];
    assert_eq!(type_name(&env, code), "code-block\\code");
    assert_eq!(text(first_child(code)), "foo");

    let nodes = reify_with(&env, "<val x foo> [code-block [val x]]").unwrap();
    let code = &nodes[0].as_map().unwrap().slot("code").unwrap()[0];
    assert_eq!(text(first_child(code)), "foo");

    let nodes = reify_with(&env, "[code-block {=rust} [\\code foo]]").unwrap();
    assert_eq!(nodes[0].property("language"), Some("rust"));
    let code = &nodes[0].as_map().unwrap().slot("code").unwrap()[0];
    assert_eq!(text(first_child(code)), "foo");
}

#[test]
fn code_block_title_anywhere() {
    for source in [
        "[code-block [\\title foo]bar]",
        "[code-block bar[\\title foo]]",
    ] {
        let nodes = nodes(source);
        let block = nodes[0].as_map().unwrap();

        assert_eq!(block.slot("title").unwrap().len(), 1);
        assert_eq!(block.slot("code").unwrap().len(), 1);
        assert_eq!(text(first_child(&block.slot("title").unwrap()[0])), "foo");
    }

    let nodes = nodes("[code-block foo[\\title bar]baz]");
    let code = &nodes[0].as_map().unwrap().slot("code").unwrap()[0];
    assert_eq!(code.as_list().unwrap().content.len(), 2);
}

#[test]
fn same_named_types_are_distinct() {
    let env = basic_env();
    let nodes = reify_with(&env, "[code-block [\\code]][code]").unwrap();

    let child_code = &nodes[0].as_map().unwrap().slot("code").unwrap()[0];
    let global_code = first_child(&nodes[1]);

    assert_eq!(
        env.registry()[child_code.node_type()].name,
        env.registry()[global_code.node_type()].name
    );
    assert_ne!(child_code.node_type(), global_code.node_type());
}

#[test]
fn map_without_main_slot() {
    let env = basic_env();
    let nodes = reify_with(&env, "[pair [\\right b][\\left a]]").unwrap();
    let pair = nodes[0].as_map().unwrap();

    assert_eq!(text(first_child(&pair.slot("left").unwrap()[0])), "a");
    assert_eq!(text(first_child(&pair.slot("right").unwrap()[0])), "b");

    let err = reify_with(&env, "[pair stray]").unwrap_err();
    assert_eq!(
        reify_kind(&err),
        &ReifyErrorKind::NoMainSlot {
            node_type: "pair".into()
        }
    );
}

#[test]
fn type_path_errors() {
    assert_eq!(
        reify_kind(&error("[\\item foo]")),
        &ReifyErrorKind::RelativePathOutsideNode
    );
    assert_eq!(
        reify_kind(&error("[nope]")),
        &ReifyErrorKind::UnknownType { name: "nope".into() }
    );
    assert_eq!(
        reify_kind(&error("[list [\\nope]]")),
        &ReifyErrorKind::UnknownType {
            name: "list\\nope".into()
        }
    );
}

fn env_with(name: &'static str, decl: impl Into<TypeDecl>) -> Environment {
    let mut types = basic_types();
    types.push((name, decl.into()));
    create_environment(NullRead, "", types).unwrap()
}

#[test]
fn pre_macro_expands_in_current_environment() {
    let env = env_with(
        "x",
        PreMacroDecl::new(|_env, node| Ok(PreContent::from_text("foo", node.start))),
    );
    let nodes = reify_with(&env, "<def text {bar}>[x]").unwrap();
    let foo = first_child(&nodes[0]);

    assert_eq!(foo.property("bar"), Some("true"));
    assert_eq!(text(foo), "foo");
}

#[test]
fn pre_macro_sees_properties_and_body() {
    let env = env_with(
        "greet",
        PreMacroDecl::new(|_env, node| {
            let name = node.property("name").unwrap_or("nobody");
            let mut line = vec![LineElement::Text(Text {
                content: format!("hello {}, ", name),
                start: node.start,
            })];
            line.extend(node.content.lines.iter().flatten().cloned());

            Ok(PreContent {
                preamble: Vec::new(),
                lines: vec![line],
            })
        })
        .main_property("name"),
    );

    let nodes = reify_with(&env, "<val who you>[greet {=ann} [val who]]").unwrap();
    let paragraph = nodes[0].as_list().unwrap();

    assert_eq!(paragraph.content.len(), 2);
    assert_eq!(text(&paragraph.content[0]), "hello ann, ");
    assert_eq!(text(&paragraph.content[1]), "you");
}

#[test]
fn post_macro_returns_lines_directly() {
    let env = env_with(
        "x",
        PostMacroDecl::new(|env, _node| Ok(vec![vec![env.text_node("foo")]])),
    );
    let nodes = reify_with(&env, "<def text {bar}>[x]").unwrap();
    let foo = first_child(&nodes[0]);

    assert_eq!(foo.property("bar"), Some("true"));
    assert_eq!(text(foo), "foo");
}

#[test]
fn macro_failures_become_diagnostics() {
    let env = env_with(
        "boom",
        PreMacroDecl::new(|_env, _node| Err(anyhow::anyhow!("exploded"))),
    );
    let err = reify_with(&env, "[boom]").unwrap_err();

    assert_eq!(
        reify_kind(&err),
        &ReifyErrorKind::Macro {
            message: "exploded".into()
        }
    );
    assert_eq!(err.positions().as_slice(), &[Position::start()]);
}

#[test]
fn reading_files() {
    let nodes = nodes("[read {=`/test.gobbo`}]");
    assert_eq!(text(first_child(&nodes[0])), "test");

    let nodes = self::nodes("[read {=sub/test2.gobbo}]");
    assert_eq!(text(first_child(&nodes[0])), "test2");
}

#[test]
fn read_failure_carries_position() {
    let err = error("foo [read {=missing.gobbo}]");

    match &err {
        Error::Read { position, error } => {
            assert_eq!(*position, Position::new(1, 5, 4));
            assert_eq!(error.path, "/data/missing.gobbo");
        }
        other => panic!("Expected read error, got {:?}", other),
    }
}

#[test]
fn including_files() {
    let nodes = nodes("[include {=sub/include-absolute.gobbo}]");
    assert_eq!(text(first_child(&nodes[0])), "test");

    let nodes = self::nodes("[include {=sub/include-relative.gobbo}]");
    assert_eq!(text(first_child(&nodes[0])), "test2");
}

#[test]
fn include_requires_path() {
    assert_eq!(reify_kind(&error("[include]")), &ReifyErrorKind::MissingPath);
}

#[test]
fn include_parse_failure_names_file() {
    match error("[include {=broken.gobbo}]") {
        Error::Parse { path, .. } => assert_eq!(path, "/data/broken.gobbo"),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn include_parse_failure_points_at_include() {
    match error("text   [include {=broken.gobbo}]") {
        Error::Parse {
            path,
            position,
            error,
        } => {
            assert_eq!(path, "/data/broken.gobbo");
            assert_eq!(position, Position::new(1, 8, 7));
            assert_eq!(error.position, Position::new(1, 6, 5));
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn include_preamble_applies_to_included_content() {
    let read = MemoryRead::new().with_file("/part.gob", "[val who]");
    let env = create_environment(read, "/main.gob", basic_types()).unwrap();

    let nodes = reify_with(&env, "[include {=part.gob} <val who inner>]").unwrap();
    assert_eq!(text(first_child(&nodes[0])), "inner");
}

#[test]
fn nested_includes_track_current_file() {
    let read = MemoryRead::new()
        .with_file("/docs/chapters/one.gob", "[include {=parts/two.gob}]")
        .with_file("/docs/chapters/parts/two.gob", "[read {=data.txt}]")
        .with_file("/docs/chapters/parts/data.txt", "innermost");
    let env = create_environment(read, "/docs/main.gob", basic_types()).unwrap();

    let nodes = reify_with(&env, "[include {=chapters/one.gob}]").unwrap();
    assert_eq!(text(first_child(&nodes[0])), "innermost");
}

#[test]
fn include_cycles_are_reported() {
    let read = MemoryRead::new()
        .with_file("/loop/a.gob", "[include {=b.gob}]")
        .with_file("/loop/b.gob", "[include {=a.gob}]");
    let env = create_environment(read, "/loop/main.gob", basic_types()).unwrap();

    let err = reify_with(&env, "[include {=a.gob}]").unwrap_err();
    assert_eq!(
        reify_kind(&err),
        &ReifyErrorKind::IncludeCycle {
            path: "/loop/a.gob".into()
        }
    );
}

#[test]
fn include_depth_is_bounded() {
    let read = MemoryRead::new().with_file("/self.gob", "[include {=self.gob}]");
    let env = create_environment(read, "/self.gob", basic_types())
        .unwrap()
        .with_config(
            Config::new()
                .with_max_include_depth(3)
                .with_include_cycle_detection(false),
        );

    let err = reify_with(&env, "[include {=self.gob}]").unwrap_err();
    assert_eq!(
        reify_kind(&err),
        &ReifyErrorKind::IncludeDepthExceeded { limit: 3 }
    );

    let env = env.with_config(Config::default());
    let err = reify_with(&env, "[include {=self.gob}]").unwrap_err();
    assert_eq!(
        reify_kind(&err),
        &ReifyErrorKind::IncludeCycle {
            path: "/self.gob".into()
        }
    );
}

#[test]
fn sibling_branches_share_no_state() {
    let env = basic_env();
    let content = parse("[<def text {a}> x] y").unwrap();
    let nodes: Vec<Node> = reify(&env, &content, false).unwrap().into_iter().flatten().collect();

    assert_eq!(nodes[0].property("a"), Some("true"));
    assert_eq!(nodes[1].property("a"), None);
    assert!(env.defaults(env.registry().text()).is_empty());
}
