//! Scenario files: named sub-templates plus a sequence of value frames
//!
//! ```toml
//! [templates]
//! item = "<li class={}>{}</li>"
//!
//! [[frames]]
//! values = ["Groceries", [{ template = "item", values = ["done", "milk"] }]]
//!
//! [[frames]]
//! values = ["Groceries", []]
//! ```
//!
//! Strings, booleans and arrays map to [`Value::Str`], [`Value::Bool`] and
//! [`Value::List`]. Numbers map to [`Value::Number`], which no slot accepts.
//! Tables are `{}` (null), `{ template = "name", values = [...] }` (a nested
//! invocation) or `{ callback = "label" }` (a handler that logs when invoked).
//! Every use of a template name shares one statics, and every use of a
//! callback label one callback, so frames differ only where their values do.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::dom::Callback;
use crate::template::{Invocation, Statics, Value};

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse scenario TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Invalid value table: {0}")]
    InvalidTable(&'static str),
    #[error("Unsupported TOML value: {0}")]
    UnsupportedValue(&'static str),
}

#[derive(Deserialize)]
struct TomlScenario {
    #[serde(default)]
    templates: BTreeMap<String, String>,
    #[serde(default)]
    frames: Vec<TomlFrame>,
}

#[derive(Deserialize)]
struct TomlFrame {
    #[serde(default)]
    values: Vec<toml::Value>,
}

/// A loaded scenario with every frame converted to engine values
#[derive(Debug, Default)]
pub struct Scenario {
    templates: HashMap<String, Rc<Statics>>,
    callbacks: HashMap<String, Callback>,
    frames: Vec<Vec<Value>>,
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a scenario from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ScenarioError> {
        let parsed: TomlScenario = toml::from_str(content)?;
        let mut scenario = Scenario {
            templates: parsed
                .templates
                .iter()
                .map(|(name, text)| (name.clone(), Rc::new(Statics::parse(text))))
                .collect(),
            ..Scenario::default()
        };
        for frame in &parsed.frames {
            let values = frame
                .values
                .iter()
                .map(|v| scenario.convert(v))
                .collect::<Result<Vec<_>, _>>()?;
            scenario.frames.push(values);
        }
        Ok(scenario)
    }

    /// Root template values, one list per frame
    pub fn frames(&self) -> &[Vec<Value>] {
        &self.frames
    }

    /// Shared statics of a named sub-template
    pub fn template(&self, name: &str) -> Option<&Rc<Statics>> {
        self.templates.get(name)
    }

    fn convert(&mut self, value: &toml::Value) -> Result<Value, ScenarioError> {
        Ok(match value {
            toml::Value::String(s) => Value::Str(s.clone()),
            toml::Value::Boolean(b) => Value::Bool(*b),
            toml::Value::Integer(n) => Value::Number(*n as f64),
            toml::Value::Float(f) => Value::Number(*f),
            toml::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<_, _>>()?,
            ),
            toml::Value::Table(table) => self.convert_table(table)?,
            toml::Value::Datetime(_) => return Err(ScenarioError::UnsupportedValue("datetime")),
        })
    }

    fn convert_table(&mut self, table: &toml::Table) -> Result<Value, ScenarioError> {
        if table.is_empty() {
            return Ok(Value::Null);
        }

        if let Some(name) = table.get("template") {
            let name = name
                .as_str()
                .ok_or(ScenarioError::InvalidTable("`template` must be a string"))?;
            let statics = self
                .templates
                .get(name)
                .cloned()
                .ok_or_else(|| ScenarioError::UnknownTemplate(name.to_string()))?;
            let values = match table.get("values") {
                Some(toml::Value::Array(items)) => items
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(ScenarioError::InvalidTable("`values` must be an array")),
                None => Vec::new(),
            };
            return Ok(Value::Template(Invocation::new(statics, values)));
        }

        if let Some(label) = table.get("callback") {
            let label = label
                .as_str()
                .ok_or(ScenarioError::InvalidTable("`callback` must be a string"))?;
            let callback = self
                .callbacks
                .entry(label.to_string())
                .or_insert_with(|| {
                    let label = label.to_string();
                    Callback::new(move |event| {
                        info!(callback = %label, event = %event.name, "callback invoked")
                    })
                })
                .clone();
            return Ok(Value::Callback(callback));
        }

        Err(ScenarioError::InvalidTable(
            "expected `template` or `callback` key",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn type_names(values: &[Value]) -> Vec<&'static str> {
        values.iter().map(Value::type_name).collect()
    }

    #[test]
    fn test_scalar_values() {
        let scenario = Scenario::from_str(
            r#"
[[frames]]
values = ["a", true, 1, 2.5, {}, ["x", {}]]
"#,
        )
        .expect("Should parse");
        assert_eq!(
            type_names(&scenario.frames()[0]),
            vec!["string", "boolean", "number", "number", "null", "list"]
        );
    }

    #[test]
    fn test_template_statics_shared_across_frames() {
        let scenario = Scenario::from_str(
            r#"
[templates]
item = "<li>{}</li>"

[[frames]]
values = [{ template = "item", values = ["a"] }]

[[frames]]
values = [{ template = "item", values = ["b"] }]
"#,
        )
        .expect("Should parse");
        let statics: Vec<_> = scenario
            .frames()
            .iter()
            .map(|frame| match &frame[0] {
                Value::Template(inv) => Rc::clone(inv.statics()),
                other => panic!("Expected template, got {:?}", other),
            })
            .collect();
        assert!(Rc::ptr_eq(&statics[0], &statics[1]));
        assert!(Rc::ptr_eq(
            &statics[0],
            scenario.template("item").expect("item")
        ));
    }

    #[test]
    fn test_callbacks_shared_per_label() {
        let scenario = Scenario::from_str(
            r#"
[[frames]]
values = [{ callback = "save" }, { callback = "save" }, { callback = "close" }]
"#,
        )
        .expect("Should parse");
        let callbacks: Vec<_> = scenario.frames()[0]
            .iter()
            .map(|v| match v {
                Value::Callback(cb) => cb.clone(),
                other => panic!("Expected callback, got {:?}", other),
            })
            .collect();
        assert!(callbacks[0].ptr_eq(&callbacks[1]));
        assert!(!callbacks[0].ptr_eq(&callbacks[2]));
    }

    #[test]
    fn test_unknown_template() {
        let result = Scenario::from_str(
            r#"
[[frames]]
values = [{ template = "missing" }]
"#,
        );
        assert!(matches!(result, Err(ScenarioError::UnknownTemplate(name)) if name == "missing"));
    }

    #[test]
    fn test_invalid_table() {
        let result = Scenario::from_str(
            r#"
[[frames]]
values = [{ nope = 1 }]
"#,
        );
        assert!(matches!(result, Err(ScenarioError::InvalidTable(_))));
    }

    #[test]
    fn test_empty_scenario() {
        let scenario = Scenario::from_str("").expect("Should parse");
        assert!(scenario.frames().is_empty());
    }
}
