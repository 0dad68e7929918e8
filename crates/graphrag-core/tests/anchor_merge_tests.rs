use graphrag_core::AnchorSet;
use proptest::prelude::*;
use std::collections::HashSet;

fn ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]{1,2}", 0..12)
}

#[test]
fn test_merge_keeps_first_seen_order() {
    let vector = AnchorSet::from(vec!["v1".to_string(), "v2".to_string()]);
    let entity = AnchorSet::from(vec!["v2".to_string(), "e1".to_string()]);
    assert_eq!(vector.merge(entity).into_vec(), vec!["v1", "v2", "e1"]);
}

proptest! {
    #[test]
    fn merge_is_ordered_union(a in ids(), b in ids()) {
        let merged = AnchorSet::from(a.clone())
            .merge(AnchorSet::from(b.clone()))
            .into_vec();

        let unique: HashSet<&String> = merged.iter().collect();
        prop_assert_eq!(unique.len(), merged.len());

        let expected: HashSet<&String> = a.iter().chain(b.iter()).collect();
        prop_assert_eq!(unique, expected);

        // first-seen order over the concatenation
        let mut seen = HashSet::new();
        let reference: Vec<String> = a
            .iter()
            .chain(b.iter())
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();
        prop_assert_eq!(merged, reference);
    }
}
