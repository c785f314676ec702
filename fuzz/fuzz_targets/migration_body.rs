//! Fuzz target for migration bodies.
//!
//! Feeds arbitrary bytes through environment expansion, statement parsing
//! and DSN parsing. None of them may panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_migration_body
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_s3migrate::env::expand;
use strata_s3migrate::{MapEnv, S3DriverConfig, parse_statements};

fuzz_target!(|data: &[u8]| {
    let _ = parse_statements(data);

    if let Ok(input) = std::str::from_utf8(data) {
        let env = MapEnv::new()
            .set("STAGE", "qa")
            .set("BUCKET", "media")
            .set("EMPTY", "");
        let expanded = expand(input, &env);
        let _ = parse_statements(expanded.as_bytes());
        let _ = S3DriverConfig::from_dsn(input);
    }
});
