//! The bundled demo templates rendered through their scenarios

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use html_templating::{Document, Engine, EngineConfig, Invocation, Scenario, Statics};
use pretty_assertions::assert_eq;

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

/// Render every frame, returning the markup and mutation count after each
fn run(template: &str, values: &str, config: EngineConfig) -> Vec<(String, usize)> {
    let source = fs::read_to_string(demo(template)).expect("Should read template");
    let statics = Rc::new(Statics::parse(&source));
    let scenario = Scenario::from_file(&demo(values)).expect("Should load scenario");

    let mut engine = Engine::with_config(config).expect("Should accept config");
    let mut doc = Document::new();
    let container = doc.create_element("body");
    doc.observe();

    scenario
        .frames()
        .iter()
        .map(|values| {
            let invocation = Invocation::new(Rc::clone(&statics), values.clone());
            engine
                .render(&mut doc, &invocation, container)
                .expect("Should render");
            (doc.inner_html(container), doc.take_records().len())
        })
        .collect()
}

fn todo_page(items: &str, hidden: bool, left: &str) -> String {
    format!(
        "<section class=\"todo\">\n  <h1>Groceries</h1>\n  <ul>{}</ul>\n  <p{}>{} items left</p>\n</section>\n",
        items,
        if hidden { " hidden" } else { "" },
        left
    )
}

#[test]
fn test_todo_demo() {
    let frames = run("todo.html", "todo.toml", EngineConfig::default());
    let milk = r#"<li class="open"><input type="checkbox">milk</li>"#;
    let open_eggs = r#"<li class="open"><input type="checkbox">eggs</li>"#;
    let done_eggs = r#"<li class="done"><input type="checkbox" checked>eggs</li>"#;

    let markup: Vec<_> = frames.iter().map(|(html, _)| html.clone()).collect();
    assert_eq!(
        markup,
        vec![
            todo_page(&format!("{}{}", milk, open_eggs), false, "2"),
            todo_page(&format!("{}{}", milk, done_eggs), false, "1"),
            todo_page(milk, false, "1"),
            todo_page("", true, "0"),
        ]
    );

    let mutations: Vec<_> = frames.iter().map(|(_, count)| *count).collect();
    assert_eq!(mutations, vec![10, 3, 1, 3]);
}

#[test]
fn test_todo_demo_with_configured_marker() {
    let config = EngineConfig::from_file(&demo("engine.toml")).expect("Should load config");
    assert_eq!(config.marker, "@@slot@@");
    let with_config = run("todo.html", "todo.toml", config);
    let with_defaults = run("todo.html", "todo.toml", EngineConfig::default());
    assert_eq!(with_config, with_defaults);
}

#[test]
fn test_menu_demo() {
    let frames = run("menu.html", "menu.toml", EngineConfig::default());
    assert_eq!(
        frames,
        vec![
            (
                r#"<nav><a href="/home">Home</a><a href="/about">About</a></nav>ready"#.to_string()
                    + "\n",
                frames[0].1,
            ),
            (r#"<nav><a href="/home">Home</a></nav>"#.to_string() + "\n", 2),
        ]
    );
}
