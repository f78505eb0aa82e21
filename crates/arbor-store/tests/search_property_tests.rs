use std::sync::Arc;

use arbor_schema::{EntityType, Repository, SchemaRegistry};
use arbor_store::RecordStore;
use proptest::prelude::*;

const MAX_RECORDS: usize = 24;

fn attr_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-zA-Z ]{0,12}", "[a-zA-Z ]{0,12}"), 1..MAX_RECORDS)
}

fn note_registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new(vec![EntityType::new("Note").with_display_field("title")]).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn search_is_case_insensitive_substring_in_insertion_order(
        rows in attr_strategy(),
        query in "[a-zA-Z]{1,3}",
    ) {
        let registry = note_registry();
        let mut store = RecordStore::new(registry.clone());
        for (i, (title, body)) in rows.iter().enumerate() {
            store
                .insert("Note", i as i64, vec![("title", title.as_str()), ("body", body.as_str())])
                .unwrap();
        }

        let needle = query.to_lowercase();
        let expected: Vec<String> = rows
            .iter()
            .enumerate()
            .filter(|(_, (t, b))| t.to_lowercase().contains(&needle) || b.to_lowercase().contains(&needle))
            .map(|(i, _)| i.to_string())
            .collect();

        let note = registry.get("Note").unwrap();
        let found: Vec<String> = store
            .search(note, &query.to_uppercase())
            .unwrap()
            .into_iter()
            .map(|r| r.key.to_string())
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn blank_queries_match_nothing(rows in attr_strategy(), pad in " {0,4}") {
        let registry = note_registry();
        let mut store = RecordStore::new(registry.clone());
        for (i, (title, body)) in rows.iter().enumerate() {
            store
                .insert("Note", i as i64, vec![("title", title.as_str()), ("body", body.as_str())])
                .unwrap();
        }
        let note = registry.get("Note").unwrap();
        prop_assert!(store.search(note, &pad).unwrap().is_empty());
    }
}
