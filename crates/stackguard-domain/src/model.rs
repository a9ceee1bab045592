use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use thiserror::Error;

/// A value inside a compiled template.
///
/// The variant set is closed. Intrinsic functions are recognized structurally: an object with a
/// single `Ref` key is a reference, an object with a single `Fn::*` key is a call. Everything the
/// resolver cannot reason about still has a variant, so no shape is ever dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Scalar literal. JSON numbers and booleans are kept in their string form.
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Null,
    /// `{"Ref": "<name>"}`: resolved only at deploy time.
    Ref(String),
    Call(Call),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub kind: FnKind,
    pub args: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FnKind {
    Join,
    Sub,
    GetAtt,
    /// Any other intrinsic, keyed by its full name (`Fn::If`, `Fn::Select`, ...).
    Other(String),
}

impl FnKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Fn::Join" => FnKind::Join,
            "Fn::Sub" => FnKind::Sub,
            "Fn::GetAtt" => FnKind::GetAtt,
            other => FnKind::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FnKind::Join => "Fn::Join",
            FnKind::Sub => "Fn::Sub",
            FnKind::GetAtt => "Fn::GetAtt",
            FnKind::Other(name) => name,
        }
    }
}

impl Value {
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Str(b.to_string()),
            JsonValue::Number(n) => Value::Str(n.to_string()),
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => {
                if let Some((key, arg)) = map.iter().next().filter(|_| map.len() == 1) {
                    if key == "Ref" {
                        return match arg {
                            JsonValue::String(name) => Value::Ref(name.clone()),
                            other => Value::Call(Call {
                                kind: FnKind::Other(key.clone()),
                                args: call_args(other),
                            }),
                        };
                    }
                    if key.starts_with("Fn::") {
                        return Value::Call(Call {
                            kind: FnKind::from_name(key),
                            args: call_args(arg),
                        });
                    }
                }
                Value::Map(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Value::from_json(v)))
                        .collect(),
                )
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short human description used in messages about values that could not be resolved.
    pub fn describe(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            Value::List(_) => "a list".to_string(),
            Value::Map(_) => "a mapping".to_string(),
            Value::Null => "null".to_string(),
            Value::Ref(name) => format!("Ref {name}"),
            Value::Call(call) => call.kind.name().to_string(),
        }
    }
}

fn call_args(arg: &JsonValue) -> Vec<Value> {
    match arg {
        JsonValue::Array(items) => items.iter().map(Value::from_json).collect(),
        other => vec![Value::from_json(other)],
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resource {
    pub resource_type: String,
    pub properties: BTreeMap<String, Value>,
}

/// Compiled template: logical ID -> resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Template {
    pub resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template root must be a mapping")]
    NotAMapping,
    #[error("template `Resources` section must be a mapping")]
    ResourcesNotAMapping,
    #[error("resource '{0}' must be a mapping")]
    ResourceNotAMapping(String),
    #[error("resource '{0}' has no string `Type`")]
    MissingType(String),
}

impl Template {
    pub fn from_json(json: &JsonValue) -> Result<Template, TemplateError> {
        let root = json.as_object().ok_or(TemplateError::NotAMapping)?;

        let Some(resources) = root.get("Resources") else {
            return Ok(Template::default());
        };
        let resources = resources
            .as_object()
            .ok_or(TemplateError::ResourcesNotAMapping)?;

        let mut out = BTreeMap::new();
        for (logical_id, raw) in resources {
            let raw = raw
                .as_object()
                .ok_or_else(|| TemplateError::ResourceNotAMapping(logical_id.clone()))?;
            let resource_type = raw
                .get("Type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| TemplateError::MissingType(logical_id.clone()))?
                .to_string();

            // Non-mapping properties carry nothing a rule can inspect.
            let properties = match raw.get("Properties") {
                Some(JsonValue::Object(props)) => props
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
                _ => BTreeMap::new(),
            };

            out.insert(
                logical_id.clone(),
                Resource {
                    resource_type,
                    properties,
                },
            );
        }

        Ok(Template { resources: out })
    }
}

/// Cross-cutting deployment metadata a rule may inspect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeploymentMeta {
    pub service: Option<String>,
    pub stage: Option<String>,
    pub region: Option<String>,
}

/// Read-only view handed to every rule.
#[derive(Clone, Debug, Default)]
pub struct EvaluationContext {
    pub template: Template,
    pub meta: DeploymentMeta,
}

impl EvaluationContext {
    pub fn new(template: Template, meta: DeploymentMeta) -> Self {
        Self { template, meta }
    }
}
