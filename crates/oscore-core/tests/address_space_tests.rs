//! Address space registration and matching tests

use oscore_core::address::{classify, AddressType};
use oscore_core::{AddressSpace, Method};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counter() -> (Method, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let method = Method::new(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    (method, hits)
}

#[test]
fn test_classify() {
    assert_eq!(classify("/synth/freq"), AddressType::Address);
    assert_eq!(classify("/synth/*/freq"), AddressType::Pattern);
    assert_eq!(classify("/synth/{a,b}"), AddressType::Pattern);
    assert_eq!(classify(""), AddressType::Invalid);
    assert_eq!(classify("synth"), AddressType::Invalid);
    assert_eq!(classify("/a b"), AddressType::Invalid);
}

#[test]
fn test_literal_registration_accumulates() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    let (b, _) = counter();

    assert!(space.try_add_method("/synth/freq", a.clone()).unwrap());
    assert!(space.try_add_method("/synth/freq", b.clone()).unwrap());

    let chain = space.methods("/synth/freq").expect("Entry should exist");
    assert_eq!(chain.len(), 2);
    assert!(chain.contains(&a));
    assert!(chain.contains(&b));
    assert_eq!(space.handler_count(), 1);
    assert_eq!(space.addresses().collect::<Vec<_>>(), vec!["/synth/freq"]);
}

#[test]
fn test_remove_unknown_method() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    let (b, _) = counter();
    space.try_add_method("/x", a).unwrap();

    assert!(!space.remove_method("/x", &b));
    assert!(!space.remove_method("/y", &b));
    assert!(!space.remove_method("/z/*", &b));
    assert!(!space.remove_method("", &b));
    assert_eq!(space.methods("/x").unwrap().len(), 1);
}

#[test]
fn test_remove_one_of_two_pattern_subscribers_keeps_the_other() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    let (b, _) = counter();
    space.try_add_method("/foo/*", a.clone()).unwrap();
    space.try_add_method("/foo/*", b.clone()).unwrap();
    let slot = space.pattern_slot("/foo/*").unwrap();

    assert!(space.remove_method("/foo/*", &a));
    assert_eq!(space.pattern_slot("/foo/*"), Some(slot));

    let mut matched = Vec::new();
    assert!(space.try_match_pattern_handler("/foo/1", &mut matched));
    assert_eq!(matched, vec![b.clone()]);

    // last subscriber gone: slot released and handed to the next new pattern
    assert!(space.remove_method("/foo/*", &b));
    assert_eq!(space.pattern_slot("/foo/*"), None);
    assert_eq!(space.pattern_count(), 0);

    space.try_add_method("/bar/?", a).unwrap();
    assert_eq!(space.pattern_slot("/bar/?"), Some(slot));
}

#[test]
fn test_match_and_promote() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    space.try_add_method("/foo/*", a.clone()).unwrap();

    let mut matched = Vec::new();
    assert!(space.try_match_pattern_handler("/foo/1", &mut matched));
    assert_eq!(matched, vec![a.clone()]);

    // the literal lookup now hits without consulting patterns
    let chain = space.methods("/foo/1").expect("Promoted entry should exist");
    assert!(chain.contains(&a));

    // promoted entries outlive the pattern registration
    assert!(space.remove_method("/foo/*", &a));
    assert!(space.methods("/foo/1").is_some());
    assert!(!space.try_match_pattern_handler("/foo/2", &mut matched));
    assert!(space.remove_address_method("/foo/1"));
}

#[test]
fn test_promotion_merges_with_existing_literal() {
    let mut space = AddressSpace::new();
    let (literal, _) = counter();
    let (pattern, _) = counter();
    space.try_add_method("/foo/1", literal.clone()).unwrap();
    space.try_add_method("/foo/*", pattern.clone()).unwrap();

    let mut matched = Vec::new();
    assert!(space.try_match_pattern_handler("/foo/1", &mut matched));

    let chain = space.methods("/foo/1").unwrap();
    assert_eq!(chain.iter().cloned().collect::<Vec<_>>(), vec![literal, pattern]);
}

#[test]
fn test_unbalanced_pattern_is_rejected_not_an_error() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    assert!(!space.try_add_method("/foo/[0-9", a).unwrap());
}

#[test]
fn test_uncompilable_pattern_falls_back_to_literal_match() {
    let mut space = AddressSpace::new();
    let (a, _) = counter();
    assert!(space.try_add_method("/foo/[9-0]", a.clone()).unwrap());

    let mut matched = Vec::new();
    assert!(!space.try_match_pattern_handler("/foo/5", &mut matched));
    assert!(space.try_match_pattern_handler("/foo/[9-0]", &mut matched));
    assert_eq!(matched, vec![a]);
}
