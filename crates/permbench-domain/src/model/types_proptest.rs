//! Property-based tests for model types and the organization graph.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use crate::model::{AclRow, OrgGraph, Owner, RelationTuple};

    /// Strategy producing a parent choice for each department after the
    /// first: `None` for a new root, otherwise an index into earlier ones.
    fn parent_choices() -> impl Strategy<Value = Vec<Option<prop::sample::Index>>> {
        prop::collection::vec(prop::option::weighted(0.85, any::<prop::sample::Index>()), 0..24)
    }

    /// Builds a graph greedily, skipping placements that violate the depth bound.
    fn build_graph(
        max_depth: u32,
        parents: &[Option<prop::sample::Index>],
        memberships: &[(prop::sample::Index, u64)],
        owners: &[prop::sample::Index],
    ) -> OrgGraph {
        let mut graph = OrgGraph::new(max_depth);
        graph.add_department(0, None).unwrap();
        for (offset, parent) in parents.iter().enumerate() {
            let id = offset as u64 + 1;
            let parent = parent.as_ref().map(|index| index.index(id as usize) as u64);
            if graph.add_department(id, parent).is_err() {
                graph.add_department(id, None).unwrap();
            }
        }
        let department_count = graph.department_count();
        for (department, user) in memberships {
            graph.add_user(*user);
            graph
                .add_member(department.index(department_count) as u64, *user)
                .unwrap();
        }
        for (document, owner) in owners.iter().enumerate() {
            graph
                .add_document(
                    document as u64,
                    Owner::Department(owner.index(department_count) as u64),
                )
                .unwrap();
        }
        graph
    }

    proptest! {
        #[test]
        fn test_generated_trees_never_exceed_max_depth(
            max_depth in 1u32..6,
            parents in parent_choices(),
        ) {
            let graph = build_graph(max_depth, &parents, &[], &[]);
            prop_assert!(graph.tree_depth() <= max_depth);
            for department in graph.departments() {
                prop_assert!(graph.ancestors_or_self(department.id).len() as u32 == department.depth);
            }
        }

        #[test]
        fn test_acl_rows_agree_with_reference_evaluator(
            max_depth in 1u32..5,
            parents in parent_choices(),
            memberships in prop::collection::vec((any::<prop::sample::Index>(), 0u64..12), 0..30),
            owners in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
        ) {
            let graph = build_graph(max_depth, &parents, &memberships, &owners);
            let rows: BTreeSet<AclRow> = graph.acl_rows().collect();
            for user in graph.users() {
                let visible = graph.visible_documents(user);
                for (document, _) in graph.documents() {
                    let expected = graph.can_view(user, document);
                    prop_assert_eq!(rows.contains(&AclRow::new(user, document)), expected);
                    prop_assert_eq!(visible.contains(&document), expected);
                }
            }
        }

        #[test]
        fn test_tuple_notation_parses_back(
            document in any::<u64>(),
            department in any::<u64>(),
        ) {
            let tuple = RelationTuple::department_owner(document, department);
            prop_assert_eq!(RelationTuple::parse(&tuple.to_string()).unwrap(), tuple);
        }
    }
}
