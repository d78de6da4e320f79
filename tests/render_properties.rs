//! Incremental rendering guarantees: what a re-render may and may not touch

use html_templating::{html, Callback, Document, Engine, Invocation, MutationRecord, NodeId};
use pretty_assertions::assert_eq;

fn setup() -> (Document, NodeId, Engine) {
    let mut doc = Document::new();
    let container = doc.create_element("main");
    (doc, container, Engine::new())
}

fn item(label: &str) -> Invocation {
    html!("<li>{}</li>", label)
}

fn list(items: Vec<Invocation>) -> Invocation {
    html!("<ul>{}</ul>", items)
}

fn elements(doc: &Document, parent: NodeId) -> Vec<NodeId> {
    doc.children(parent)
        .filter(|&n| doc.tag_name(n).is_some())
        .collect()
}

#[test]
fn test_identical_render_is_idempotent() {
    let (mut doc, container, mut engine) = setup();
    let on_submit = Callback::new(|_| {});
    let form = |busy: bool, title: &str| {
        html!(
            r#"<form onsubmit={} aria-busy={}><h2 title="Edit {}">{}</h2>{}</form>"#,
            on_submit.clone(),
            busy,
            title,
            title,
            list(vec![item("a"), item("b")])
        )
    };

    engine.render(&mut doc, &form(true, "Notes"), container).unwrap();
    let first = doc.inner_html(container);

    doc.observe();
    engine.render(&mut doc, &form(true, "Notes"), container).unwrap();
    assert_eq!(doc.take_records(), Vec::<MutationRecord>::new());
    assert_eq!(doc.inner_html(container), first);
}

#[test]
fn test_changing_one_list_item_touches_only_its_region() {
    let (mut doc, container, mut engine) = setup();
    let texts = |items: Vec<&str>| html!("<ul>{}</ul>", items);

    engine
        .render(&mut doc, &texts(vec!["a", "b", "c"]), container)
        .unwrap();
    let ul = doc.first_child(container).unwrap();
    let before: Vec<_> = doc.children(ul).collect();

    doc.observe();
    engine
        .render(&mut doc, &texts(vec!["a", "b", "d"]), container)
        .unwrap();
    assert_eq!(
        doc.take_records(),
        vec![MutationRecord::CharacterData {
            target: before[2],
            old_value: "c".to_string(),
        }]
    );
    assert_eq!(doc.children(ul).collect::<Vec<_>>(), before);
    assert_eq!(doc.data(before[0]), Some("a"));
    assert_eq!(doc.data(before[1]), Some("b"));
    assert_eq!(doc.inner_html(ul), "abd");
}

#[test]
fn test_changing_one_template_item_keeps_sibling_nodes() {
    let (mut doc, container, mut engine) = setup();
    engine
        .render(&mut doc, &list(vec![item("a"), item("b"), item("c")]), container)
        .unwrap();
    let ul = doc.first_child(container).unwrap();
    let lis = elements(&doc, ul);
    let third_text = doc.first_child(lis[2]).unwrap();

    doc.observe();
    engine
        .render(&mut doc, &list(vec![item("a"), item("b"), item("d")]), container)
        .unwrap();
    assert_eq!(
        doc.take_records(),
        vec![MutationRecord::CharacterData {
            target: third_text,
            old_value: "c".to_string(),
        }]
    );
    assert_eq!(elements(&doc, ul), lis);
}

#[test]
fn test_shape_swap_replaces_all_nodes() {
    let (mut doc, container, mut engine) = setup();
    engine
        .render(&mut doc, &html!("<h1>A</h1><p>{}</p>", "a"), container)
        .unwrap();
    let old: Vec<_> = doc.children(container).collect();
    assert_eq!(old.len(), 2);

    engine
        .render(&mut doc, &html!("<section>{}</section>{}", "b", "c"), container)
        .unwrap();
    assert!(old.iter().all(|&n| !doc.contains(n)));
    assert_eq!(doc.inner_html(container), "<section>b</section>c");
    // <section>, the slot's text node and its boundary
    assert_eq!(doc.child_count(container), 3);
    assert_eq!(engine.region(&doc, container).unwrap().len(), 3);
}

#[test]
fn test_nested_content_switches_kind_in_place() {
    let (mut doc, container, mut engine) = setup();
    let frame = |content: Option<Invocation>, text: &str| {
        let value = match content {
            Some(inv) => html_templating::Value::from(inv),
            None if text.is_empty() => html_templating::Value::Null,
            None => html_templating::Value::from(text),
        };
        html!("<div><b>before</b>{}<i>after</i></div>", value)
    };

    let mut check = |content: Option<Invocation>, text: &str, expected: &str| {
        engine
            .render(&mut doc, &frame(content, text), container)
            .unwrap();
        assert_eq!(doc.inner_html(container), expected);
    };

    check(None, "text", "<div><b>before</b>text<i>after</i></div>");
    check(
        Some(html!("<p>{}</p><p>2</p>", "x")),
        "",
        "<div><b>before</b><p>x</p><p>2</p><i>after</i></div>",
    );
    check(
        Some(html!("<span>y</span>")),
        "",
        "<div><b>before</b><span>y</span><i>after</i></div>",
    );
    check(None, "", "<div><b>before</b><i>after</i></div>");
    check(None, "back", "<div><b>before</b>back<i>after</i></div>");
}

#[test]
fn test_boolean_attribute_toggling() {
    let (mut doc, container, mut engine) = setup();
    let input = |disabled: bool| html!("<input disabled={}>", disabled);

    engine.render(&mut doc, &input(true), container).unwrap();
    let node = doc.first_child(container).unwrap();
    assert!(doc.has_attribute(node, "disabled"));

    doc.observe();
    engine.render(&mut doc, &input(true), container).unwrap();
    assert_eq!(doc.take_records(), Vec::<MutationRecord>::new());

    engine.render(&mut doc, &input(false), container).unwrap();
    assert_eq!(
        doc.take_records(),
        vec![MutationRecord::Attributes {
            target: node,
            name: "disabled".to_string(),
            old_value: Some(String::new()),
        }]
    );
    assert!(!doc.has_attribute(node, "disabled"));

    engine.render(&mut doc, &input(false), container).unwrap();
    assert_eq!(doc.take_records(), Vec::<MutationRecord>::new());
}

#[test]
fn test_string_attribute_written_only_when_different() {
    let (mut doc, container, mut engine) = setup();
    let link = |title: &str| html!("<a title={}>x</a>", title);

    engine.render(&mut doc, &link("one"), container).unwrap();
    doc.observe();
    engine.render(&mut doc, &link("one"), container).unwrap();
    assert_eq!(doc.take_records().len(), 0);
    engine.render(&mut doc, &link("two"), container).unwrap();
    assert_eq!(doc.take_records().len(), 1);
    assert_eq!(doc.inner_html(container), r#"<a title="two">x</a>"#);
}

#[test]
fn test_list_shrink_and_grow() {
    let (mut doc, container, mut engine) = setup();
    engine
        .render(&mut doc, &list(vec![item("a"), item("b"), item("c")]), container)
        .unwrap();
    let ul = doc.first_child(container).unwrap();
    let lis = elements(&doc, ul);
    assert_eq!(lis.len(), 3);

    engine
        .render(&mut doc, &list(vec![item("x")]), container)
        .unwrap();
    assert_eq!(elements(&doc, ul), vec![lis[0]]);
    assert!(!doc.contains(lis[1]));
    assert!(!doc.contains(lis[2]));
    assert_eq!(doc.inner_html(ul), "<li>x</li>");

    engine
        .render(&mut doc, &list(vec![item("x"), item("y"), item("z")]), container)
        .unwrap();
    let grown = elements(&doc, ul);
    assert_eq!(grown.len(), 3);
    assert_eq!(grown[0], lis[0]);
    assert_eq!(doc.inner_html(ul), "<li>x</li><li>y</li><li>z</li>");
}

#[test]
fn test_interpolated_attribute() {
    let (mut doc, container, mut engine) = setup();
    let link = |id: &str| html!(r#"<a href="/id={}">item</a>"#, id);

    engine.render(&mut doc, &link("42"), container).unwrap();
    let a = doc.first_child(container).unwrap();
    assert_eq!(doc.get_attribute(a, "href"), Some("/id=42"));

    doc.observe();
    engine.render(&mut doc, &link("42"), container).unwrap();
    assert_eq!(doc.take_records(), Vec::<MutationRecord>::new());

    engine.render(&mut doc, &link("7"), container).unwrap();
    assert_eq!(
        doc.take_records(),
        vec![MutationRecord::Attributes {
            target: a,
            name: "href".to_string(),
            old_value: Some("/id=42".to_string()),
        }]
    );
    assert_eq!(doc.get_attribute(a, "href"), Some("/id=7"));
}

#[test]
fn test_interpolated_attribute_with_several_slots_rewrites_whole_value() {
    let (mut doc, container, mut engine) = setup();
    let page = |n: &str, total: &str| html!(r#"<span title="page {} of {}"></span>"#, n, total);

    engine.render(&mut doc, &page("1", "3"), container).unwrap();
    engine.render(&mut doc, &page("2", "3"), container).unwrap();
    let span = doc.first_child(container).unwrap();
    assert_eq!(doc.get_attribute(span, "title"), Some("page 2 of 3"));
}
