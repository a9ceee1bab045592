//! Fuzz target for template loading and rule evaluation.
//!
//! Goal: loading may reject input, but neither loading nor evaluating the default rule set
//! may panic, and evaluation of an accepted template must be deterministic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_template
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use stackguard_app::{TemplateFormat, load_template};
use stackguard_domain::model::{DeploymentMeta, EvaluationContext};
use stackguard_settings::{Overrides, StackguardConfigV1, resolve_config};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(resolved) = resolve_config(StackguardConfigV1::default(), Overrides::default()) else {
        return;
    };

    for format in [TemplateFormat::Json, TemplateFormat::Yaml] {
        let Ok(template) = load_template(text, format) else {
            continue;
        };
        let ctx = EvaluationContext::new(template, DeploymentMeta::default());

        let first = stackguard_domain::evaluate(&ctx, &resolved.effective);
        let second = stackguard_domain::evaluate(&ctx, &resolved.effective);
        assert_eq!(first.findings, second.findings);
    }
});
