//! Fuzz target for config parsing and resolution.
//!
//! Goal: arbitrary `stackguard.toml` contents produce a config or an error, never a panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use stackguard_settings::{Overrides, parse_config_toml, resolve_config};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(cfg) = parse_config_toml(text)
    {
        let _ = resolve_config(cfg, Overrides::default());
    }
});
