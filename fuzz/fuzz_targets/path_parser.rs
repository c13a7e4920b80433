//! Fuzz target for the path language.
//!
//! Parsing must never panic, and every parsed chain must end in an
//! element step and survive truncation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sieve_core::{PathStep, StepKind};

fuzz_target!(|input: &str| {
    let Ok(path) = PathStep::parse(input) else {
        return;
    };

    assert_eq!(path.tail().kind(), StepKind::Element);

    for depth in 1..=path.depth() {
        let prefix = path.truncate(depth);
        assert_eq!(prefix.depth(), depth);
        assert_eq!(prefix.tail().kind(), StepKind::Element);
    }

    // Joining under a valid parent keeps the path parseable
    let joined = sieve_core::path::join("parent", input);
    assert!(PathStep::parse(&joined).is_ok());
});
