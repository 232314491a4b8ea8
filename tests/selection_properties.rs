//! Property tests for model selection
//!
//! Checks the invariants of `ModelSelector::pick` over generated catalogs:
//! bounded fallbacks, primary never repeated, reasoning pools respected and
//! catalog order preserved.

use modelgate::models::selector::{DEFAULT_CHAT_MODEL, DEFAULT_REASONING_MODEL, MAX_FALLBACKS};
use modelgate::models::{
    CatalogSnapshot, ModelDescriptor, ModelSelector, Mode, PinnedModels, is_reasoning_capable,
};
use proptest::prelude::*;

/// Ids drawn from a small alphabet so duplicates and token matches occur
fn descriptor() -> impl Strategy<Value = ModelDescriptor> {
    (
        prop::sample::select(vec![
            "openai/o1",
            "openai/gpt-4o",
            "deepseek/r1",
            "anthropic/claude-3",
            "google/gemini-thinking",
            "meta/llama-3",
            "mistral/large",
        ]),
        any::<bool>(),
    )
        .prop_map(|(id, reasoning)| {
            let descriptor = ModelDescriptor::new(id);
            if reasoning {
                descriptor.with_supported_parameter("reasoning")
            } else {
                descriptor
            }
        })
}

fn catalog() -> impl Strategy<Value = CatalogSnapshot> {
    prop::collection::vec(descriptor(), 0..8).prop_map(CatalogSnapshot::new)
}

fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Default), Just(Mode::Reasoning)]
}

fn pin() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["openai/o1", "meta/llama-3", "not/listed"]))
        .prop_map(|id| id.map(str::to_string))
}

fn pool_ids(catalog: &CatalogSnapshot, mode: Mode) -> Vec<String> {
    catalog
        .iter()
        .filter(|d| mode == Mode::Default || is_reasoning_capable(d))
        .map(|d| d.id().to_string())
        .collect()
}

fn is_subsequence(needle: &[String], haystack: &[String]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|n| rest.any(|h| h == n))
}

proptest! {
    #[test]
    fn fallbacks_are_bounded_and_exclude_primary(
        catalog in catalog(),
        mode in mode(),
        reasoning_pin in pin(),
        default_pin in pin(),
    ) {
        let selector = ModelSelector::new(PinnedModels::new(reasoning_pin, default_pin));
        let selection = selector.pick(&catalog, mode);

        prop_assert!(!selection.primary().is_empty());
        prop_assert!(selection.fallbacks().len() <= MAX_FALLBACKS);
        prop_assert!(selection.fallbacks().iter().all(|f| f != selection.primary()));
    }

    #[test]
    fn fallbacks_come_from_the_pool_in_catalog_order(
        catalog in catalog(),
        mode in mode(),
        reasoning_pin in pin(),
        default_pin in pin(),
    ) {
        let selector = ModelSelector::new(PinnedModels::new(reasoning_pin, default_pin));
        let selection = selector.pick(&catalog, mode);
        let pool: Vec<String> = pool_ids(&catalog, mode)
            .into_iter()
            .filter(|id| id != selection.primary())
            .collect();

        prop_assert!(is_subsequence(selection.fallbacks(), &pool));
        prop_assert_eq!(selection.fallbacks().len(), pool.len().min(MAX_FALLBACKS));
    }

    #[test]
    fn present_pin_is_always_primary(catalog in catalog(), mode in mode(), pinned in pin()) {
        let pins = match mode {
            Mode::Reasoning => PinnedModels::new(pinned.clone(), None),
            Mode::Default => PinnedModels::new(None, pinned.clone()),
        };
        let selection = ModelSelector::new(pins).pick(&catalog, mode);

        match pinned {
            Some(id) if catalog.contains(&id) => prop_assert_eq!(selection.primary(), id.as_str()),
            _ => {
                let pool = pool_ids(&catalog, mode);
                let expected = pool.first().map(String::as_str).unwrap_or(match mode {
                    Mode::Reasoning => DEFAULT_REASONING_MODEL,
                    Mode::Default => DEFAULT_CHAT_MODEL,
                });
                prop_assert_eq!(selection.primary(), expected);
            }
        }
    }

    #[test]
    fn request_chain_starts_with_primary(catalog in catalog(), mode in mode()) {
        let selection = ModelSelector::default().pick(&catalog, mode);
        let chain = selection.models();

        prop_assert_eq!(chain[0], selection.primary());
        let tail: Vec<&str> = selection.fallbacks().iter().map(String::as_str).collect();
        prop_assert_eq!(&chain[1..], tail.as_slice());
    }

    #[test]
    fn selection_is_deterministic(catalog in catalog(), mode in mode(), pinned in pin()) {
        let selector = ModelSelector::new(PinnedModels::new(pinned.clone(), pinned));
        prop_assert_eq!(selector.pick(&catalog, mode), selector.pick(&catalog, mode));
    }
}
