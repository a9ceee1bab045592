//! Resource selection and shape normalization.
//!
//! Templates are loosely shaped: a statement list may be a single mapping, `Action` may be a
//! string or a list, `Policies` may be absent. The walker absorbs all of that and hands rules
//! plain sequences. Malformed nesting yields empty sequences, never errors.

use crate::model::{Resource, Template, Value};
use stackguard_types::PropertyPointer;

pub const IAM_ROLE: &str = "AWS::IAM::Role";
pub const LAMBDA_FUNCTION: &str = "AWS::Lambda::Function";

/// A field that may hold one value or a list of them.
#[derive(Clone, Copy, Debug)]
pub enum OneOrMany<'a> {
    One(&'a Value),
    Many(&'a [Value]),
}

impl<'a> OneOrMany<'a> {
    /// `None` for absent or explicit null fields.
    pub fn from_field(value: Option<&'a Value>) -> Option<Self> {
        match value? {
            Value::Null => None,
            Value::List(items) => Some(OneOrMany::Many(items)),
            other => Some(OneOrMany::One(other)),
        }
    }

    /// Entries paired with the pointer of each entry.
    pub fn entries(self, base: &PropertyPointer) -> Vec<(PropertyPointer, &'a Value)> {
        match self {
            OneOrMany::One(v) => vec![(base.clone(), v)],
            OneOrMany::Many(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (base.index(i), v))
                .collect(),
        }
    }
}

fn entries<'a>(
    value: Option<&'a Value>,
    base: &PropertyPointer,
) -> Vec<(PropertyPointer, &'a Value)> {
    OneOrMany::from_field(value)
        .map(|v| v.entries(base))
        .unwrap_or_default()
}

pub fn select_by_type<'a>(
    template: &'a Template,
    resource_type: &str,
) -> Vec<(&'a str, &'a Resource)> {
    template
        .resources
        .iter()
        .filter(|(_, r)| r.resource_type == resource_type)
        .map(|(id, r)| (id.as_str(), r))
        .collect()
}

/// Nested property lookup through mappings.
pub fn property<'a>(resource: &'a Resource, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = resource.properties.get(*first)?;
    for key in rest {
        current = current.as_map()?.get(*key)?;
    }
    Some(current)
}

/// One entry of a statement's `Action` or `Resource` field.
#[derive(Clone, Debug)]
pub struct StatementEntry<'a> {
    pub value: &'a Value,
    pub pointer: PropertyPointer,
}

#[derive(Clone, Debug)]
pub struct Statement<'a> {
    pub pointer: PropertyPointer,
    pub effect: Option<&'a str>,
    pub actions: Vec<StatementEntry<'a>>,
    pub resources: Vec<StatementEntry<'a>>,
}

/// `Properties.Policies[*].PolicyDocument.Statement[*]` of an IAM role.
pub fn iam_inline_statements<'a>(logical_id: &str, resource: &'a Resource) -> Vec<Statement<'a>> {
    let policies_ptr = PropertyPointer::property(logical_id, &["Policies"]);
    let mut out = Vec::new();

    for (policy_ptr, policy) in entries(resource.properties.get("Policies"), &policies_ptr) {
        let Some(document) = policy.as_map().and_then(|p| p.get("PolicyDocument")) else {
            continue;
        };
        let Some(document) = document.as_map() else {
            continue;
        };
        let statement_ptr = policy_ptr.key("PolicyDocument").key("Statement");

        for (ptr, statement) in entries(document.get("Statement"), &statement_ptr) {
            let Some(statement) = statement.as_map() else {
                continue;
            };
            let collect = |field: &str| {
                entries(statement.get(field), &ptr.key(field))
                    .into_iter()
                    .map(|(pointer, value)| StatementEntry { value, pointer })
                    .collect::<Vec<_>>()
            };
            out.push(Statement {
                effect: statement.get("Effect").and_then(Value::as_str),
                actions: collect("Action"),
                resources: collect("Resource"),
                pointer: ptr,
            });
        }
    }

    out
}
