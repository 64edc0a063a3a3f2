//! Thread-safety tests.
//!
//! Parsing routes errors through libxml2's process-global structured-error
//! slot, which the crate serializes with a mutex; validation shares
//! compiled schemas across threads. Both paths are exercised in parallel
//! here with rayon.

use std::sync::Arc;

use rayon::prelude::*;

use pbcore_validate::{Dialect, METADATA_NAMESPACE, SchemaRegistry, Validator};

#[test]
fn parallel_validation_shares_one_registry() {
    let registry = Arc::new(SchemaRegistry::new());

    let results: Vec<bool> = (0..64)
        .into_par_iter()
        .map(|i| {
            let xml = format!(
                "<PBCoreDescriptionDocument xmlns=\"{METADATA_NAMESPACE}\">\
                   <pbcoreIdentifier>doc-{i}</pbcoreIdentifier>\
                 </PBCoreDescriptionDocument>"
            );
            let mut validator = Validator::from_xml_str(&xml, Dialect::Pbcore12, &registry).unwrap();
            validator.is_valid()
        })
        .collect();

    assert_eq!(results.len(), 64);
    assert!(results.iter().all(|&valid| valid));
}

#[test]
fn parallel_parse_failures_stay_isolated() {
    // Each failing parse installs a custom receiver in the global error
    // slot; the mutex must keep captures from crossing between threads.
    let registry = Arc::new(SchemaRegistry::new());

    (0..64).into_par_iter().for_each(|i| {
        let well_formed = i % 2 == 0;
        let xml = if well_formed {
            format!("<doc>number {i}</doc>")
        } else {
            format!("<doc><open-{i}></doc>")
        };

        let mut validator = Validator::from_xml_str(&xml, Dialect::Pbcore13, &registry).unwrap();
        assert_eq!(validator.is_well_formed(), well_formed);
        if !well_formed {
            assert!(
                !validator.findings().is_empty(),
                "parse errors must land in the owning validator"
            );
        }
    });
}

#[test]
fn mixed_dialects_compile_once_under_contention() {
    let registry = Arc::new(SchemaRegistry::new());

    (0..48).into_par_iter().for_each(|i| {
        let dialect = Dialect::ALL[i % Dialect::ALL.len()];
        registry.schema(dialect).expect("bundled schema compiles");
    });
}
