//! Template loading: JSON or YAML text into the domain template model.
//!
//! YAML short-form intrinsics (`!Ref`, `!Sub`, `!GetAtt a.b`, ...) are rewritten into their
//! long JSON form before the domain sees them, so both encodings evaluate identically.

use anyhow::Context;
use serde_json::{Map, Number, Value as JsonValue};
use serde_yaml::Value as YamlValue;
use stackguard_domain::model::Template;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Yaml,
    /// JSON when the document starts with `{`, YAML otherwise.
    #[default]
    Auto,
}

impl TemplateFormat {
    /// Guess from a file extension.
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".json") {
            TemplateFormat::Json
        } else if lower.ends_with(".yaml") || lower.ends_with(".yml") || lower.ends_with(".template")
        {
            TemplateFormat::Yaml
        } else {
            TemplateFormat::Auto
        }
    }
}

/// Parse template text into a JSON document.
pub fn parse_template(text: &str, format: TemplateFormat) -> anyhow::Result<JsonValue> {
    let format = match format {
        TemplateFormat::Auto if text.trim_start().starts_with('{') => TemplateFormat::Json,
        TemplateFormat::Auto => TemplateFormat::Yaml,
        other => other,
    };

    match format {
        TemplateFormat::Json => serde_json::from_str(text).context("parse template json"),
        _ => {
            let yaml: YamlValue = serde_yaml::from_str(text).context("parse template yaml")?;
            yaml_to_json(yaml)
        }
    }
}

/// Parse and shape-check a template.
pub fn load_template(text: &str, format: TemplateFormat) -> anyhow::Result<Template> {
    let json = parse_template(text, format)?;
    let template = Template::from_json(&json).context("read template resources")?;
    tracing::debug!(resources = template.resources.len(), "template loaded");
    Ok(template)
}

fn yaml_to_json(value: YamlValue) -> anyhow::Result<JsonValue> {
    Ok(match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<anyhow::Result<_>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut out = Map::new();
            for (k, v) in mapping {
                out.insert(yaml_key(k)?, yaml_to_json(v)?);
            }
            JsonValue::Object(out)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            let inner = yaml_to_json(tagged.value)?;
            short_form(name, inner)
        }
    })
}

/// `!Name value` -> `{"Fn::Name": value}`, with the two irregular tags handled.
fn short_form(name: &str, value: JsonValue) -> JsonValue {
    let (key, value) = match name {
        "Ref" | "Condition" => (name.to_string(), value),
        "GetAtt" => {
            let value = match value {
                JsonValue::String(s) => match s.split_once('.') {
                    Some((resource, attribute)) => JsonValue::Array(vec![
                        JsonValue::String(resource.to_string()),
                        JsonValue::String(attribute.to_string()),
                    ]),
                    None => JsonValue::String(s),
                },
                other => other,
            };
            ("Fn::GetAtt".to_string(), value)
        }
        other => (format!("Fn::{other}"), value),
    };

    let mut out = Map::new();
    out.insert(key, value);
    JsonValue::Object(out)
}

fn yaml_number(n: &serde_yaml::Number) -> JsonValue {
    if let Some(i) = n.as_i64() {
        JsonValue::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        JsonValue::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(n.to_string()))
    }
}

fn yaml_key(key: YamlValue) -> anyhow::Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        other => anyhow::bail!("unsupported mapping key in template: {other:?}"),
    }
}
