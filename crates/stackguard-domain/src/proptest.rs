//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - Resolver totality on arbitrary (including deeply nested) values
//! - Scalar vs. list normalization of statement fields
//! - Fail-open handling of references
//! - Evaluation determinism

use crate::engine::evaluate;
use crate::intrinsic::{MAX_DEPTH, Resolved, resolve};
use crate::model::{Call, FnKind, Value};
use crate::rules::{NoWildIamRoleStatements, Rule};
use crate::test_support::{config_with, messages, policy, role_with_statement};
use crate::verdict::Verdict;
use proptest::prelude::*;
use serde_json::json;
use stackguard_types::ids;

// ============================================================================
// Strategies
// ============================================================================

fn arb_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("*".to_string()),
        Just(String::new()),
        prop::string::string_regex("[a-z0-9:*/-]{0,12}").expect("regex"),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        arb_literal().prop_map(Value::Str),
        Just(Value::Null),
        "[A-Za-z]{1,8}".prop_map(Value::Ref),
    ];
    leaf.prop_recursive(8, 64, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            (inner.clone(), prop::collection::vec(inner.clone(), 0..4)).prop_map(
                |(delimiter, parts)| Value::Call(Call {
                    kind: FnKind::Join,
                    args: vec![delimiter, Value::List(parts)],
                })
            ),
            prop::collection::vec(inner.clone(), 0..3).prop_map(|args| Value::Call(Call {
                kind: FnKind::Sub,
                args,
            })),
            prop::collection::vec(inner, 0..3).prop_map(|args| Value::Call(Call {
                kind: FnKind::Other("Fn::If".to_string()),
                args,
            })),
        ]
    })
}

/// JSON actions that are never wildcards.
fn arb_specific_action() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,8}:[A-Z][A-Za-z]{0,12}").expect("regex")
}

fn nested_join(depth: usize) -> Value {
    let mut value = Value::Str("*".to_string());
    for _ in 0..depth {
        value = Value::Call(Call {
            kind: FnKind::Join,
            args: vec![Value::Str(String::new()), Value::List(vec![value])],
        });
    }
    value
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn resolver_is_total_and_deterministic(value in arb_value()) {
        prop_assert_eq!(resolve(&value), resolve(&value));
    }

    #[test]
    fn literal_strings_resolve_exactly(s in arb_literal()) {
        prop_assert_eq!(resolve(&Value::Str(s.clone())), Resolved::exact(s));
    }

    #[test]
    fn scalar_and_list_forms_agree(resource in arb_literal(), action in arb_specific_action()) {
        let scalar = NoWildIamRoleStatements
            .evaluate(
                &role_with_statement(json!({"Effect": "Allow", "Action": action, "Resource": resource})),
                &policy(),
            )
            .expect("evaluate");
        let list = NoWildIamRoleStatements
            .evaluate(
                &role_with_statement(json!({"Effect": "Allow", "Action": [action], "Resource": [resource]})),
                &policy(),
            )
            .expect("evaluate");
        prop_assert_eq!(messages(&scalar), messages(&list));
    }

    #[test]
    fn references_are_always_approved(name in "[A-Za-z][A-Za-z0-9]{0,15}") {
        let verdicts = NoWildIamRoleStatements
            .evaluate(
                &role_with_statement(json!({
                    "Effect": "Allow",
                    "Action": {"Ref": name},
                    "Resource": [{"Ref": name}]
                })),
                &policy(),
            )
            .expect("evaluate");
        prop_assert_eq!(verdicts, vec![Verdict::Approved]);
    }

    #[test]
    fn embedded_wildcards_are_not_flagged(
        prefix in "[a-z]{1,6}",
        suffix in "[a-z]{1,6}",
    ) {
        let resource = format!("arn:{prefix}*{suffix}:s3:::bucket");
        let verdicts = NoWildIamRoleStatements
            .evaluate(
                &role_with_statement(json!({"Effect": "Allow", "Action": "s3:GetObject", "Resource": resource})),
                &policy(),
            )
            .expect("evaluate");
        prop_assert_eq!(verdicts, vec![Verdict::Approved]);
    }

    #[test]
    fn evaluation_is_deterministic(actions in prop::collection::vec(arb_literal(), 0..5)) {
        let ctx = role_with_statement(json!({"Effect": "Allow", "Action": actions, "Resource": "*"}));
        let cfg = config_with(&[(ids::RULE_NO_WILD_IAM_ROLE_STATEMENTS, policy())]);
        let a = evaluate(&ctx, &cfg);
        let b = evaluate(&ctx, &cfg);
        prop_assert_eq!(a.findings, b.findings);
        prop_assert_eq!(a.status, b.status);
    }
}

#[test]
fn depth_bound_turns_deep_values_opaque() {
    assert_eq!(resolve(&nested_join(4)), Resolved::exact("*"));
    assert_eq!(resolve(&nested_join(MAX_DEPTH * 2)), Resolved::Opaque);
}
