mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use arbor_schema::{EntityType, RelationKind, RelationshipField, SchemaRegistry};
use arbor_store::RecordStore;
use arbor_tree::*;
use common::*;
use proptest::prelude::*;

const MAX_NODES: usize = 6;

/// Peer edges between `Node` records (cycles and self loops allowed) plus an
/// optional owner edge from each node to the single `Root` record.
fn peer_graph_strategy() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<bool>)> {
    (1usize..=MAX_NODES).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(0..n, 0..=3), n),
            prop::collection::vec(any::<bool>(), n),
        )
    })
}

fn peer_registry() -> Arc<SchemaRegistry> {
    Arc::new(
        SchemaRegistry::new(vec![
            EntityType::new("Root").with_display_field("name"),
            EntityType::new("Node")
                .with_display_field("name")
                .with_field(RelationshipField::new("peers", RelationKind::MultiPeer, "Node"))
                .with_field(RelationshipField::new("owner", RelationKind::ParentLink, "Root")),
        ])
        .unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn paths_are_bounded_and_anchored((peers, owned) in peer_graph_strategy()) {
        let registry = peer_registry();
        let mut store = RecordStore::new(registry.clone());
        let root = store.insert("Root", 0, vec![("name", "root")]).unwrap();
        let ids: Vec<_> = (0..peers.len())
            .map(|i| {
                let name = format!("n{i}");
                store
                    .insert("Node", (i + 1) as i64, vec![("name", name.as_str())])
                    .unwrap()
            })
            .collect();
        for (i, targets) in peers.iter().enumerate() {
            for &t in targets {
                store.link(ids[i], "peers", ids[t]).unwrap();
            }
            if owned[i] {
                store.link(ids[i], "owner", root).unwrap();
            }
        }

        let finder = AncestorPathFinder::new(&registry, &store);
        for (i, &id) in ids.iter().enumerate() {
            let start = store.get(id).unwrap();
            let paths = finder.find_paths(&start, "Root");

            for path in &paths {
                prop_assert!(path.len() >= 2);
                prop_assert!(path.len() <= finder.max_depth() + 1);
                prop_assert_eq!(&path.root().unwrap().entity_type, "Root");
                prop_assert_eq!(&path.leaf().unwrap().id, &start.key.to_string());
                for node in &path.nodes[1..] {
                    prop_assert_eq!(&node.entity_type, "Node");
                }
            }
            if owned[i] {
                prop_assert!(paths.iter().any(|p| p.len() == 2));
            }
            prop_assert_eq!(&paths, &finder.find_paths(&start, "Root"));
        }
    }

    #[test]
    fn child_configs_follow_the_markers(
        marks in prop::collection::vec(prop::option::of(-3i32..3), 0..8),
    ) {
        let mut root = EntityType::new("Root").with_marker(root_marker(None, None));
        let mut types = Vec::new();
        for (i, mark) in marks.iter().enumerate() {
            let target = format!("Leaf{i}");
            let mut field = RelationshipField::new(format!("f{i}"), RelationKind::MultiChild, &target);
            if let Some(order) = mark {
                field = field.child_edge(child(None, None, *order));
            }
            root = root.with_field(field);
            types.push(EntityType::new(target));
        }
        types.push(root);
        let registry = SchemaRegistry::new(types).unwrap();

        let store = HierarchyConfigStore::discover(&registry, &TreeSettings::default());
        let tree = store.get("Root").unwrap();

        let configured: BTreeSet<&str> =
            tree.child_fields.iter().map(|c| c.field_name.as_str()).collect();
        let marked: BTreeSet<String> = marks
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_some())
            .map(|(i, _)| format!("f{i}"))
            .collect();
        prop_assert_eq!(configured.len(), tree.child_fields.len());
        prop_assert_eq!(
            configured.into_iter().map(str::to_string).collect::<BTreeSet<_>>(),
            marked
        );

        // Ascending by order; ties keep declaration order.
        for pair in tree.child_fields.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.order <= b.order);
            if a.order == b.order {
                let index = |name: &str| name[1..].parse::<usize>().unwrap();
                prop_assert!(index(&a.field_name) < index(&b.field_name));
            }
        }
    }
}
