//! Partial evaluation of intrinsic functions.
//!
//! The resolver answers one question: which literal strings can this value take, if that is
//! knowable from the template alone? Anything that depends on deploy-time state is `Opaque`.
//! `Fn::Join` and `Fn::Sub` are folded far enough to tell whether the result is exactly the
//! wildcard token; nothing else is evaluated.

use crate::model::{FnKind, Value};
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Recursion bound. Deeper values resolve to `Opaque`.
pub const MAX_DEPTH: usize = 32;

pub const WILDCARD: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Every possible literal outcome.
    Exact(BTreeSet<String>),
    /// A list with at least one opaque element: the literals of the elements that did resolve.
    Partial(BTreeSet<String>),
    /// Depends on information unavailable at evaluation time.
    Opaque,
}

impl Resolved {
    pub fn exact(s: impl Into<String>) -> Self {
        Resolved::Exact(BTreeSet::from([s.into()]))
    }

    /// True when some outcome depends on deploy-time state.
    pub fn has_unresolved(&self) -> bool {
        !matches!(self, Resolved::Exact(_))
    }

    /// The single literal outcome, if there is exactly one.
    pub fn single(&self) -> Option<&str> {
        match self {
            Resolved::Exact(set) if set.len() == 1 => set.iter().next().map(String::as_str),
            _ => None,
        }
    }

    /// Known literal outcomes; empty for `Opaque`.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let set = match self {
            Resolved::Exact(set) | Resolved::Partial(set) => Some(set),
            Resolved::Opaque => None,
        };
        set.into_iter().flatten().map(String::as_str)
    }
}

pub fn resolve(value: &Value) -> Resolved {
    resolve_at(value, 0)
}

fn resolve_at(value: &Value, depth: usize) -> Resolved {
    if depth > MAX_DEPTH {
        return Resolved::Opaque;
    }

    match value {
        Value::Str(s) => Resolved::exact(s.clone()),
        // Element-wise: an opaque element never hides a literal sibling.
        Value::List(items) => {
            let mut known = BTreeSet::new();
            let mut unresolved = false;
            for item in items {
                let resolved = resolve_at(item, depth + 1);
                unresolved |= resolved.has_unresolved();
                known.extend(resolved.values().map(str::to_string));
            }
            match (unresolved, known.is_empty()) {
                (false, _) => Resolved::Exact(known),
                (true, true) => Resolved::Opaque,
                (true, false) => Resolved::Partial(known),
            }
        }
        Value::Ref(_) | Value::Map(_) | Value::Null => Resolved::Opaque,
        Value::Call(call) => match call.kind {
            FnKind::Join => resolve_join(&call.args, depth),
            FnKind::Sub => resolve_sub(&call.args, depth),
            FnKind::GetAtt | FnKind::Other(_) => Resolved::Opaque,
        },
    }
}

enum Fragment {
    Known(String),
    Unknown,
}

fn single_at(value: &Value, depth: usize) -> Option<String> {
    resolve_at(value, depth).single().map(str::to_string)
}

fn resolve_join(args: &[Value], depth: usize) -> Resolved {
    let [delimiter, Value::List(parts)] = args else {
        return Resolved::Opaque;
    };
    let Some(delimiter) = single_at(delimiter, depth + 1) else {
        return Resolved::Opaque;
    };

    let fragments = parts
        .iter()
        .map(|part| match single_at(part, depth + 1) {
            Some(s) => Fragment::Known(s),
            None => Fragment::Unknown,
        })
        .collect();

    fold(fragments, &delimiter)
}

fn resolve_sub(args: &[Value], depth: usize) -> Resolved {
    let (template, vars) = match args {
        [template] => (template, None),
        [template, Value::Map(vars)] => (template, Some(vars)),
        _ => return Resolved::Opaque,
    };
    let Some(template) = single_at(template, depth + 1) else {
        return Resolved::Opaque;
    };

    fold(sub_fragments(&template, vars, depth), "")
}

/// Split an `Fn::Sub` template into literal text and substituted variables.
fn sub_fragments(
    template: &str,
    vars: Option<&BTreeMap<String, Value>>,
    depth: usize,
) -> Vec<Fragment> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        text.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder is plain text.
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        rest = &after[end + 1..];

        if let Some(literal) = name.strip_prefix('!') {
            text.push_str("${");
            text.push_str(literal);
            text.push('}');
            continue;
        }

        let substituted = vars
            .and_then(|v| v.get(name.trim()))
            .and_then(|v| single_at(v, depth + 1));
        match substituted {
            Some(s) => text.push_str(&s),
            None => {
                out.push(Fragment::Known(std::mem::take(&mut text)));
                out.push(Fragment::Unknown);
            }
        }
    }
    text.push_str(rest);
    out.push(Fragment::Known(text));
    out
}

/// Concatenate fragments. When some are unknown the result is only classified as the wildcard
/// when there is no delimiter and every non-empty known fragment is itself `*`.
fn fold(fragments: Vec<Fragment>, delimiter: &str) -> Resolved {
    let mut known = Vec::with_capacity(fragments.len());
    let mut has_unknown = false;
    for fragment in fragments {
        match fragment {
            Fragment::Known(s) => known.push(s),
            Fragment::Unknown => has_unknown = true,
        }
    }

    if !has_unknown {
        return Resolved::exact(known.join(delimiter));
    }

    let mut non_empty = known.iter().filter(|s| !s.is_empty()).peekable();
    if delimiter.is_empty() && non_empty.peek().is_some() && non_empty.all(|s| s == WILDCARD) {
        return Resolved::exact(WILDCARD);
    }
    Resolved::Opaque
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn r(json: serde_json::Value) -> Resolved {
        resolve(&Value::from_json(&json))
    }

    #[test]
    fn literals_are_exact() {
        assert_eq!(r(json!("*")), Resolved::exact("*"));
        assert_eq!(r(json!(42)), Resolved::exact("42"));
    }

    #[test]
    fn refs_getatt_and_unknown_calls_are_opaque() {
        assert!(r(json!({"Ref": "foobar"})).has_unresolved());
        assert!(r(json!({"Fn::GetAtt": ["Bucket", "Arn"]})).has_unresolved());
        assert!(r(json!({"Fn::If": ["Cond", "*", "x"]})).has_unresolved());
        assert!(r(json!({"Fn::ImportValue": "*"})).has_unresolved());
        assert!(r(json!(null)).has_unresolved());
    }

    #[test]
    fn lists_resolve_element_wise() {
        assert_eq!(
            r(json!(["a", "b", "a"])),
            Resolved::Exact(BTreeSet::from(["a".to_string(), "b".to_string()]))
        );
        assert_eq!(
            r(json!(["*", {"Ref": "x"}])),
            Resolved::Partial(BTreeSet::from(["*".to_string()]))
        );
        assert_eq!(
            r(json!([["*", {"Ref": "x"}], "a"])),
            Resolved::Partial(BTreeSet::from(["*".to_string(), "a".to_string()]))
        );
        assert_eq!(r(json!([{"Ref": "x"}, null])), Resolved::Opaque);
        assert_eq!(r(json!([])), Resolved::Exact(BTreeSet::new()));
    }

    #[test]
    fn partial_lists_are_not_single_values() {
        let partial = r(json!(["*", {"Ref": "x"}]));
        assert!(partial.has_unresolved());
        assert_eq!(partial.single(), None);
        assert_eq!(partial.values().collect::<Vec<_>>(), vec!["*"]);
        assert!(r(json!({"Fn::Join": ["", [["*", {"Ref": "x"}]]]})).has_unresolved());
    }

    #[test]
    fn join_of_literals_concatenates() {
        assert_eq!(r(json!({"Fn::Join": ["", ["*"]]})), Resolved::exact("*"));
        assert_eq!(
            r(json!({"Fn::Join": [":", ["arn", "aws", "s3"]]})),
            Resolved::exact("arn:aws:s3")
        );
        assert_eq!(
            r(json!({"Fn::Join": ["", ["", "*", ""]]})),
            Resolved::exact("*")
        );
    }

    #[test]
    fn join_with_opaque_parts() {
        assert_eq!(
            r(json!({"Fn::Join": ["", ["*", {"Ref": "Suffix"}]]})),
            Resolved::exact("*")
        );
        assert!(r(json!({"Fn::Join": ["", [{"Ref": "Only"}]]})).has_unresolved());
        assert!(r(json!({"Fn::Join": [":", ["*", {"Ref": "Suffix"}]]})).has_unresolved());
        assert!(r(json!({"Fn::Join": ["", ["arn:", {"Ref": "AWS::Partition"}]]})).has_unresolved());
    }

    #[test]
    fn join_partial_wildcards_are_not_the_wildcard() {
        assert_eq!(
            r(json!({"Fn::Join": ["", ["arn:*:s3:::", "bucket"]]})),
            Resolved::exact("arn:*:s3:::bucket")
        );
    }

    #[test]
    fn malformed_join_is_opaque() {
        assert!(r(json!({"Fn::Join": "*"})).has_unresolved());
        assert!(r(json!({"Fn::Join": ["", "*"]})).has_unresolved());
        assert!(r(json!({"Fn::Join": [{"Ref": "Sep"}, ["*"]]})).has_unresolved());
    }

    #[test]
    fn sub_string_and_list_forms() {
        assert_eq!(r(json!({"Fn::Sub": "*"})), Resolved::exact("*"));
        assert_eq!(r(json!({"Fn::Sub": ["*"]})), Resolved::exact("*"));
        assert_eq!(
            r(json!({"Fn::Sub": ["${Star}", {"Star": "*"}]})),
            Resolved::exact("*")
        );
        assert_eq!(
            r(json!({"Fn::Sub": ["arn:aws:s3:::${B}/*", {"B": "bucket"}]})),
            Resolved::exact("arn:aws:s3:::bucket/*")
        );
    }

    #[test]
    fn sub_with_unresolved_variables() {
        assert!(r(json!({"Fn::Sub": "arn:${AWS::Partition}:s3:::*"})).has_unresolved());
        assert_eq!(r(json!({"Fn::Sub": "*${Suffix}"})), Resolved::exact("*"));
        assert!(r(json!({"Fn::Sub": "${Everything}"})).has_unresolved());
        assert!(r(json!({"Fn::Sub": ["${V}", {"V": {"Ref": "P"}}]})).has_unresolved());
    }

    #[test]
    fn sub_escapes_and_unterminated_placeholders() {
        assert_eq!(r(json!({"Fn::Sub": "${!Literal}"})), Resolved::exact("${Literal}"));
        assert_eq!(r(json!({"Fn::Sub": "a${b"})), Resolved::exact("a${b"));
    }

    #[test]
    fn nested_intrinsics_fold() {
        assert_eq!(
            r(json!({"Fn::Join": ["", [{"Fn::Sub": "*"}]]})),
            Resolved::exact("*")
        );
    }

    #[test]
    fn depth_overrun_is_opaque() {
        let mut v = Value::Str("*".to_string());
        for _ in 0..(MAX_DEPTH + 5) {
            v = Value::List(vec![v]);
        }
        assert!(resolve(&v).has_unresolved());
    }
}
