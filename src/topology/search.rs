use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::mesh::Node;

pub const SEARCH_RESULT_LIMIT: usize = 20;

const EXACT_MATCH_SCORE: i64 = i64::MAX / 2;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), query))
}

fn match_score(matcher: &SkimMatcherV2, node: &Node, query: &str) -> Option<i64> {
    let hex = format!("{:08x}", node.node_id);
    let display_name = node.display_name.to_lowercase();

    let substring_hit = display_name.contains(query)
        || hex.contains(query)
        || node.node_id.to_string().contains(query)
        || node
            .hw_model
            .as_deref()
            .is_some_and(|hw| hw.to_lowercase().contains(query));
    if substring_hit {
        return Some(EXACT_MATCH_SCORE);
    }

    fuzzy_match_score(matcher, &node.display_name, query)
}

/// Nodes matching `query`, best first, at most [`SEARCH_RESULT_LIMIT`].
///
/// Substring hits on name, hex id, decimal id or hardware model rank above
/// fuzzy name matches. An empty query returns nothing.
pub fn search_nodes<'a>(nodes: &'a [Node], query: &str) -> Vec<&'a Node> {
    let query = query.trim().to_lowercase();
    let query = query.strip_prefix('!').unwrap_or(&query);
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = nodes
        .iter()
        .filter_map(|node| match_score(&matcher, node, query).map(|score| (score, node)))
        .collect::<Vec<_>>();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| a.1.display_name.cmp(&b.1.display_name))
    });
    scored.truncate(SEARCH_RESULT_LIMIT);
    scored.into_iter().map(|(_, node)| node).collect()
}

/// Node list order: by display name, then id.
pub fn sorted_by_name(nodes: &[Node]) -> Vec<&Node> {
    let mut sorted = nodes.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::test_support::node;

    fn named(node_id: u32, name: &str, hw: Option<&str>) -> Node {
        let mut n = node(node_id);
        n.display_name = name.to_owned();
        n.hw_model = hw.map(str::to_owned);
        n
    }

    #[test]
    fn matches_name_hex_decimal_and_hardware() {
        let nodes = vec![
            named(0xdead_beef, "Ridge Relay", None),
            named(12345, "Valley", Some("HELTEC_V3")),
            named(7, "Basement", None),
        ];

        let by_name = search_nodes(&nodes, "ridge");
        assert_eq!(by_name[0].node_id, 0xdead_beef);

        let by_hex = search_nodes(&nodes, "!deadbeef");
        assert_eq!(by_hex.len(), 1);
        assert_eq!(by_hex[0].node_id, 0xdead_beef);

        let by_decimal = search_nodes(&nodes, "12345");
        assert_eq!(by_decimal[0].node_id, 12345);

        let by_hw = search_nodes(&nodes, "heltec");
        assert_eq!(by_hw[0].node_id, 12345);
    }

    #[test]
    fn fuzzy_name_matches_rank_after_substring_hits() {
        let nodes = vec![named(1, "Rooftop Gateway", None), named(2, "rtgw", None)];
        let results = search_nodes(&nodes, "rtgw");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node_id, 2);
        assert_eq!(results[1].node_id, 1);
    }

    #[test]
    fn empty_query_and_limit() {
        let nodes = (0..40)
            .map(|id| named(id, &format!("node-{id}"), None))
            .collect::<Vec<_>>();
        assert!(search_nodes(&nodes, "   ").is_empty());
        assert_eq!(search_nodes(&nodes, "node").len(), SEARCH_RESULT_LIMIT);
    }

    #[test]
    fn list_sorts_case_insensitively_by_name() {
        let nodes = vec![
            named(3, "charlie", None),
            named(1, "Bravo", None),
            named(2, "alpha", None),
        ];
        let order = sorted_by_name(&nodes)
            .into_iter()
            .map(|n| n.node_id)
            .collect::<Vec<_>>();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
