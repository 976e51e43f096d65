//! Property-based tests for curation and cleanup.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p setaudit --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p setaudit --test property_tests
//! ```

use std::collections::BTreeSet;

use proptest::prelude::*;

use setaudit::{
    BoundingVolume, Category, CategoryConfig, CategoryRoles, CategoryType, CleanupConfig, CurationApplier,
    CurationConfig, CurationEngine, DeletePlanner, DeletionExecutor, Element, ElementId, MemoryModel, ModelHost,
};

const CATEGORIES: [&str; 3] = ["walls", "furniture", "rooms"];

// =============================================================================
// Test Strategies
// =============================================================================

/// (category index, x, y, size)
fn element_spec() -> impl Strategy<Value = (usize, f64, f64, f64)> {
    (0..CATEGORIES.len(), 0.0..100.0f64, 0.0..100.0f64, 0.1..10.0f64)
}

/// Element specs plus set memberships as element indices (some dangling).
fn model_spec() -> impl Strategy<Value = (Vec<(usize, f64, f64, f64)>, Vec<Vec<usize>>)> {
    prop::collection::vec(element_spec(), 1..40).prop_flat_map(|elements| {
        let n = elements.len();
        let sets = prop::collection::vec(prop::collection::vec(0..n + 3, 1..6), 1..5);
        (Just(elements), sets)
    })
}

fn build_model(elements: &[(usize, f64, f64, f64)], sets: &[Vec<usize>]) -> MemoryModel {
    let mut model = MemoryModel::new("prop")
        .with_category(Category::new("walls", "Walls", CategoryType::Model))
        .with_category(Category::new("furniture", "Furniture", CategoryType::Model))
        .with_category(Category::new("rooms", "Rooms", CategoryType::Model));

    for (i, (cat, x, y, size)) in elements.iter().enumerate() {
        let bounds = BoundingVolume::from_coords([*x, *y, 0.0], [x + size, y + size, 3.0]);
        model.add_element(Element::new(format!("e{}", i), CATEGORIES[*cat]), Some(bounds));
    }
    for (i, members) in sets.iter().enumerate() {
        // Indices past the element count become dangling references
        model.add_set(format!("s{}", i), format!("Set {}", i), members.iter().map(|m| format!("e{}", m)));
    }
    model
}

/// Put every wall into some set, so expansion can only add non-seed
/// elements and never grows an inclusion volume.
fn cover_walls(elements: &[(usize, f64, f64, f64)], sets: &mut [Vec<usize>]) {
    let n = sets.len();
    for (i, (cat, ..)) in elements.iter().enumerate() {
        if CATEGORIES[*cat] == "walls" && !sets.iter().any(|s| s.contains(&i)) {
            sets[i % n].push(i);
        }
    }
}

/// Category id lists over a universe of `c0..c5`, with some unknown ids.
fn id_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(0usize..8, 0..6).prop_map(|v| v.into_iter().map(|i| format!("c{}", i)).collect())
}

fn category_universe() -> Vec<Category> {
    let names = ["Walls", "Floors", "Doors", "Door Tags", "Rooms", "Ceilings"];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Category::new(format!("c{}", i), *name, CategoryType::Model))
        .collect()
}

fn roles_for(model: &MemoryModel) -> CategoryRoles {
    let config = CategoryConfig::new().with_seed(["walls"]).with_blacklist(["rooms"]);
    CategoryRoles::classify(&model.categories(), &config)
}

// =============================================================================
// Curation Properties
// =============================================================================

proptest! {
    #[test]
    fn delta_sets_are_consistent((elements, sets) in model_spec()) {
        let model = build_model(&elements, &sets);
        let roles = roles_for(&model);
        let curation = CurationConfig::default();
        let plan = CurationEngine::new(&roles, &curation).compute_all(&model);

        for delta in &plan.deltas {
            let expected: BTreeSet<ElementId> = delta
                .before_ids
                .difference(&delta.to_remove)
                .chain(delta.to_add.iter())
                .cloned()
                .collect();
            prop_assert_eq!(&delta.after_ids, &expected);
            prop_assert!(delta.to_add.is_disjoint(&delta.before_ids));
            prop_assert!(delta.to_remove.is_subset(&delta.before_ids));
            prop_assert!(delta.unresolved_ids.is_subset(&delta.to_remove));
            prop_assert!(delta.blacklist_removals.is_subset(&delta.to_remove));
        }

        for name in &plan.ambiguous_set_names {
            prop_assert!(plan.valid_set_names.contains(name));
        }
    }

    #[test]
    fn blacklisted_never_survive((elements, sets) in model_spec()) {
        let model = build_model(&elements, &sets);
        let roles = roles_for(&model);
        let curation = CurationConfig::default();
        let plan = CurationEngine::new(&roles, &curation).compute_all(&model);

        for delta in &plan.deltas {
            for id in &delta.after_ids {
                let element = model.element(id);
                prop_assert!(element.is_some());
                prop_assert!(!roles.is_blacklisted(&element.unwrap().category));
            }
        }
    }

    #[test]
    fn compute_is_deterministic((elements, sets) in model_spec()) {
        let model = build_model(&elements, &sets);
        let roles = roles_for(&model);
        let curation = CurationConfig::default();
        let engine = CurationEngine::new(&roles, &curation);

        let first = engine.compute_all(&model);
        let second = engine.compute_all(&model);
        prop_assert_eq!(first.deltas, second.deltas);
    }

    #[test]
    fn inflated_volume_contains_original(
        (x, y, size) in (-50.0..50.0f64, -50.0..50.0f64, 0.0..10.0f64),
        offset in 0.0..5.0f64,
    ) {
        let original = BoundingVolume::from_coords([x, y, 0.0], [x + size, y + size, size]);
        let inflated = original.inflate(offset);

        prop_assert!(inflated.contains_point(&original.min));
        prop_assert!(inflated.contains_point(&original.max));
        prop_assert!(inflated.intersects(&original));
        prop_assert!(original.intersects(&inflated));
    }
}

proptest! {
    #[test]
    fn apply_then_compute_is_stable((elements, mut sets) in model_spec()) {
        cover_walls(&elements, &mut sets);
        let mut model = build_model(&elements, &sets);
        let roles = roles_for(&model);
        let curation = CurationConfig::default();
        let engine = CurationEngine::new(&roles, &curation);

        let plan = engine.compute_all(&model);
        CurationApplier::new().apply(&mut model, &plan).unwrap();

        let again = engine.compute_all(&model);
        prop_assert!(!again.any_changes());
    }
}

// =============================================================================
// Classification Properties
// =============================================================================

proptest! {
    #[test]
    fn blacklist_wins_regardless_of_order(
        (seed, seed_shuffled) in id_list().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        (proxy, proxy_shuffled) in id_list().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        (blacklist, blacklist_shuffled) in id_list().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
    ) {
        let universe = category_universe();
        let roles = CategoryRoles::classify(
            &universe,
            &CategoryConfig::new().with_seed(seed).with_proxy(proxy).with_blacklist(blacklist),
        );

        prop_assert!(roles.seed.is_disjoint(&roles.blacklist));
        prop_assert!(roles.proxy.is_disjoint(&roles.blacklist));
        let known: BTreeSet<_> = universe.iter().map(|c| c.id.clone()).collect();
        prop_assert!(roles.blacklist.is_subset(&known));

        let shuffled = CategoryRoles::classify(
            &universe,
            &CategoryConfig::new()
                .with_seed(seed_shuffled)
                .with_proxy(proxy_shuffled)
                .with_blacklist(blacklist_shuffled),
        );
        prop_assert_eq!(roles, shuffled);
    }
}

// =============================================================================
// Cleanup Properties
// =============================================================================

proptest! {
    #[test]
    fn bisection_deletes_everything_but_poisoned_and_preserved(
        n in 1usize..40,
        poisoned in prop::collection::btree_set(0usize..40, 0..6),
        preserved in prop::collection::btree_set(0usize..40, 0..4),
    ) {
        let mut model = MemoryModel::new("prop")
            .with_category(Category::new("walls", "Walls", CategoryType::Model));
        for i in 0..n {
            model.add_element(Element::new(format!("e{}", i), "walls"), None);
        }
        for p in poisoned.iter().filter(|p| **p < n) {
            model.poison(format!("e{}", p));
        }

        let config = CleanupConfig::default();
        let roles = CategoryRoles::classify(&model.categories(), &CategoryConfig::new());
        let plan = DeletePlanner::new(&config).build(&model, &roles);
        let preserve: BTreeSet<ElementId> = preserved.iter().map(|p| ElementId::new(format!("e{}", p))).collect();

        let report = DeletionExecutor::new(&config).run(&mut model, &preserve, &plan, true).unwrap();

        let kept: BTreeSet<usize> = (0..n).filter(|i| preserved.contains(i) || poisoned.contains(i)).collect();
        let failing = (0..n).filter(|i| poisoned.contains(i) && !preserved.contains(i)).count();

        if report.skipped_due_to_no_preserve {
            prop_assert!(plan.is_empty());
        } else {
            prop_assert_eq!(report.errors, failing);
            prop_assert_eq!(report.total_deleted(), n - kept.len());
            prop_assert_eq!(model.element_count(), kept.len());
        }
    }
}
