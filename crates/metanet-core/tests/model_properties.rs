//! Property tests for model ingestion and species cloning.

use std::collections::BTreeMap;

use metanet_core::model::{DegreeThresholdCloner, MetabolicGraph, SpeciesCloner, parse_model};
use proptest::prelude::*;
use serde_json::json;

/// Reactions as `(id, {metabolite: coefficient})` over species `s0..sN`.
type Reactions = Vec<(String, BTreeMap<String, f64>)>;

fn arb_reactions() -> impl Strategy<Value = (usize, Reactions)> {
    (1usize..8).prop_flat_map(|species| {
        let stoichiometry = prop::collection::btree_map(
            (0..species).prop_map(|i| format!("s{i}")),
            prop::sample::select(vec![-2.0, -1.0, 0.0, 1.0, 3.0]),
            0..4,
        );
        (
            Just(species),
            prop::collection::vec(stoichiometry, 1..10).prop_map(|maps| {
                maps.into_iter()
                    .enumerate()
                    .map(|(i, m)| (format!("R{i}"), m))
                    .collect()
            }),
        )
    })
}

fn document(species: usize, reactions: &Reactions) -> String {
    let metabolites: Vec<_> = (0..species)
        .map(|i| json!({"id": format!("s{i}"), "compartment": "c"}))
        .collect();
    let reactions: Vec<_> = reactions
        .iter()
        .map(|(id, metabolites)| json!({"id": id, "metabolites": metabolites}))
        .collect();
    json!({"metabolites": metabolites, "reactions": reactions}).to_string()
}

fn model(species: usize, reactions: &Reactions) -> MetabolicGraph {
    parse_model(&document(species, reactions)).expect("generated model parses")
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    #[test]
    fn edges_follow_coefficient_signs((species, reactions) in arb_reactions()) {
        let graph = model(species, &reactions);
        let nonzero: usize = reactions
            .iter()
            .map(|(_, m)| m.values().filter(|&&c| c != 0.0).count())
            .sum();
        prop_assert_eq!(graph.edge_count(), nonzero);
        for (id, metabolites) in &reactions {
            let reaction = graph.node_by_id(id).expect("reaction");
            prop_assert_eq!(
                graph.in_edges(reaction).len(),
                metabolites.values().filter(|&&c| c < 0.0).count()
            );
            prop_assert_eq!(
                graph.out_edges(reaction).len(),
                metabolites.values().filter(|&&c| c > 0.0).count()
            );
        }
    }

    #[test]
    fn content_hash_ignores_reaction_order(
        (species, reactions, shuffled) in arb_reactions().prop_flat_map(|(species, reactions)| {
            let shuffled = Just(reactions.clone()).prop_shuffle();
            (Just(species), Just(reactions), shuffled)
        })
    ) {
        prop_assert_eq!(
            model(species, &reactions).content_hash,
            model(species, &shuffled).content_hash
        );
    }

    #[test]
    fn cloning_keeps_originals_and_edges(
        (species, reactions) in arb_reactions(),
        threshold in 0usize..4,
    ) {
        let graph = model(species, &reactions);
        let cloned = DegreeThresholdCloner::new(Vec::new(), threshold)
            .clone_species(&graph)
            .expect("built-in cloner never fails");

        prop_assert_eq!(cloned.edge_count(), graph.edge_count());
        prop_assert_eq!(&cloned.content_hash, &graph.content_hash);
        for idx in graph.graph.node_indices() {
            prop_assert_eq!(cloned.id_of(idx), graph.id_of(idx));
            prop_assert!(!cloned.is_clone(idx));
        }
        for idx in cloned.graph.node_indices() {
            let original = cloned.original_of(idx);
            prop_assert_eq!(cloned.id_of(idx), graph.id_of(original));
            if cloned.is_clone(idx) {
                prop_assert!(cloned.is_species(idx));
                prop_assert_eq!(cloned.degree(idx), 1);
            }
        }

        let expected_clones: usize = graph
            .species_nodes()
            .map(|s| graph.degree(s))
            .filter(|&d| d >= threshold.max(2))
            .map(|d| d - 1)
            .sum();
        prop_assert_eq!(cloned.clone_count(), expected_clones);
        prop_assert_eq!(cloned.original_species_nodes().count(), species);
    }
}
