// Structural blueprint diff
//
// Pure and stateless: consumes two fully-loaded blueprint documents and
// reconciles each collection by its identity field (never by position, so
// reordering produces no spurious diff). Variables, functions and components
// compare by deep value equality; matched graphs recurse into node-guid
// reconciliation instead.
//
// Line order is deterministic: each collection pass walks side B in document
// order for additions, then side A for removals and modifications.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use blueprint_graph::document::{field, field_array, field_str};

use crate::report::{ChangeKind, DiffLine, DiffOutcome, DiffReport};

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that prevent a comparison from running at all
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Compare two blueprint documents supplied as raw JSON text.
///
/// Any parse failure yields a failure outcome with no partial diff.
pub fn diff_json(a: &str, b: &str) -> DiffOutcome {
    match try_diff_json(a, b) {
        Ok(report) => DiffOutcome::Report(report),
        Err(e) => DiffOutcome::failure(e.to_string()),
    }
}

fn try_diff_json(a: &str, b: &str) -> Result<DiffReport, DiffError> {
    let doc_a: Value = serde_json::from_str(a)?;
    let doc_b: Value = serde_json::from_str(b)?;
    Ok(diff_values(&doc_a, &doc_b))
}

/// Compare two fully-loaded blueprint documents.
pub fn diff_values(a: &Value, b: &Value) -> DiffReport {
    let mut lines = Vec::new();

    // Metadata: parent class is the one field compared.
    let meta_a = field(a, "Metadata").cloned().unwrap_or(Value::Null);
    let meta_b = field(b, "Metadata").cloned().unwrap_or(Value::Null);
    let parent_a = field_str(&meta_a, "ParentClass");
    let parent_b = field_str(&meta_b, "ParentClass");
    if parent_a != parent_b {
        lines.push(DiffLine::top(
            ChangeKind::Modification,
            format!(
                "ParentClass: {} -> {}",
                parent_a.unwrap_or("None"),
                parent_b.unwrap_or("None")
            ),
        ));
    }

    lines.extend(diff_keyed_list(
        field_array(a, "Variables"),
        field_array(b, "Variables"),
        "VarName",
        "Variable",
    ));
    lines.extend(diff_keyed_list(
        field_array(a, "Functions"),
        field_array(b, "Functions"),
        "FunctionName",
        "Function",
    ));
    lines.extend(diff_keyed_list(
        field_array(a, "Components"),
        field_array(b, "Components"),
        "ComponentName",
        "Component",
    ));
    lines.extend(diff_graphs(
        field_array(a, "EventGraphs"),
        field_array(b, "EventGraphs"),
    ));
    lines.extend(diff_interfaces(
        field_array(a, "ImplementedInterfaces"),
        field_array(b, "ImplementedInterfaces"),
    ));

    let name_a = field_str(&meta_a, "BlueprintName").unwrap_or("Unknown");
    let name_b = field_str(&meta_b, "BlueprintName").unwrap_or("Unknown");
    debug!(
        "Compared '{}' vs '{}': {} change lines",
        name_a,
        name_b,
        lines.len()
    );

    DiffReport::from_lines(name_a, name_b, lines)
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection passes
// ─────────────────────────────────────────────────────────────────────────────

/// Index a list of items by the given identity field, keeping document order.
/// Items missing the field are skipped rather than matched against each other.
fn by_key<'a>(items: &'a [Value], key_field: &str) -> IndexMap<&'a str, &'a Value> {
    items
        .iter()
        .filter_map(|item| field_str(item, key_field).map(|key| (key, item)))
        .collect()
}

/// Keyed set reconciliation for variables, functions and components.
///
/// Items present on both sides count as modified on any deep value
/// inequality, whole-structure, not a field whitelist.
fn diff_keyed_list(
    list_a: &[Value],
    list_b: &[Value],
    key_field: &str,
    item_name: &str,
) -> Vec<DiffLine> {
    let items_a = by_key(list_a, key_field);
    let items_b = by_key(list_b, key_field);

    let mut lines = Vec::new();
    for key in items_b.keys() {
        if !items_a.contains_key(key) {
            lines.push(DiffLine::top(
                ChangeKind::Addition,
                format!("{}: {}", item_name, key),
            ));
        }
    }
    for key in items_a.keys() {
        if !items_b.contains_key(key) {
            lines.push(DiffLine::top(
                ChangeKind::Removal,
                format!("{}: {}", item_name, key),
            ));
        }
    }
    for (key, item_a) in &items_a {
        if let Some(item_b) = items_b.get(key) {
            if item_a != item_b {
                lines.push(DiffLine::top(
                    ChangeKind::Modification,
                    format!("{}: {} (modified)", item_name, key),
                ));
            }
        }
    }
    lines
}

/// Display label for a node: title, falling back to class when empty
fn node_label(node: &Value) -> &str {
    match field_str(node, "nodeTitle") {
        Some(title) if !title.is_empty() => title,
        _ => field_str(node, "nodeClass").unwrap_or("Unknown"),
    }
}

/// Graph-level diff: graphs match by name; matched graphs recurse into
/// node-guid reconciliation and report "changed" only when the node set
/// changed, with per-node detail nested under the graph line.
fn diff_graphs(graphs_a: &[Value], graphs_b: &[Value]) -> Vec<DiffLine> {
    let by_name_a = by_key(graphs_a, "graphName");
    let by_name_b = by_key(graphs_b, "graphName");

    let mut lines = Vec::new();
    for (name, graph) in &by_name_b {
        if !by_name_a.contains_key(name) {
            let node_count = field_array(graph, "nodes").len();
            lines.push(DiffLine::top(
                ChangeKind::Addition,
                format!("Graph: {} ({} nodes)", name, node_count),
            ));
        }
    }
    for (name, graph) in &by_name_a {
        if !by_name_b.contains_key(name) {
            let node_count = field_array(graph, "nodes").len();
            lines.push(DiffLine::top(
                ChangeKind::Removal,
                format!("Graph: {} ({} nodes)", name, node_count),
            ));
        }
    }

    for (name, graph_a) in &by_name_a {
        let Some(graph_b) = by_name_b.get(name) else {
            continue;
        };

        let nodes_a = by_key(field_array(graph_a, "nodes"), "nodeGuid");
        let nodes_b = by_key(field_array(graph_b, "nodes"), "nodeGuid");

        let added: Vec<_> = nodes_b
            .iter()
            .filter(|(guid, _)| !nodes_a.contains_key(*guid))
            .map(|(_, node)| *node)
            .collect();
        let removed: Vec<_> = nodes_a
            .iter()
            .filter(|(guid, _)| !nodes_b.contains_key(*guid))
            .map(|(_, node)| *node)
            .collect();

        if added.is_empty() && removed.is_empty() {
            continue;
        }

        lines.push(DiffLine::top(
            ChangeKind::Modification,
            format!("Graph: {}", name),
        ));
        for node in added {
            lines.push(DiffLine::nested(
                ChangeKind::Addition,
                format!("Node: {}", node_label(node)),
            ));
        }
        for node in removed {
            lines.push(DiffLine::nested(
                ChangeKind::Removal,
                format!("Node: {}", node_label(node)),
            ));
        }
    }
    lines
}

/// Plain set difference over implemented-interface names
fn diff_interfaces(interfaces_a: &[Value], interfaces_b: &[Value]) -> Vec<DiffLine> {
    let names_a: Vec<&str> = interfaces_a.iter().filter_map(Value::as_str).collect();
    let names_b: Vec<&str> = interfaces_b.iter().filter_map(Value::as_str).collect();

    let mut lines = Vec::new();
    for name in &names_b {
        if !names_a.contains(name) {
            lines.push(DiffLine::top(
                ChangeKind::Addition,
                format!("Interface: {}", name),
            ));
        }
    }
    for name in &names_a {
        if !names_b.contains(name) {
            lines.push(DiffLine::top(
                ChangeKind::Removal,
                format!("Interface: {}", name),
            ));
        }
    }
    lines
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_document() -> Value {
        json!({
            "Metadata": {"BlueprintName": "BP_Player", "ParentClass": "Character"},
            "Variables": [{"VarName": "Health", "varType": "int"}],
            "Functions": [{"FunctionName": "TakeDamage"}],
            "Components": [{"ComponentName": "Mesh", "componentClass": "SkeletalMesh"}],
            "EventGraphs": [{
                "graphName": "EventGraph",
                "nodes": [{"nodeGuid": "N1", "nodeClass": "K2Node_Event", "nodeTitle": "Begin Play"}]
            }],
            "ImplementedInterfaces": ["Damageable"]
        })
    }

    #[test]
    fn test_identical_documents_no_diff() {
        let doc = base_document();
        let report = diff_values(&doc, &doc);
        assert!(report.is_empty());
        assert_eq!(report.details.additions, 0);
        assert_eq!(report.details.removals, 0);
        assert_eq!(report.details.modifications, 0);
    }

    #[test]
    fn test_variable_added_and_modified() {
        let a = base_document();
        let mut b = base_document();
        b["Variables"] = json!([
            {"VarName": "Health", "varType": "float"},
            {"VarName": "Shield"}
        ]);

        let report = diff_values(&a, &b);
        assert_eq!(report.details.additions, 1);
        assert_eq!(report.details.removals, 0);
        assert_eq!(report.details.modifications, 1);
        assert!(report.details.diffs.contains(&"+ Variable: Shield".to_string()));
        assert!(report.details.diffs.contains(&"~ Variable: Health (modified)".to_string()));
    }

    #[test]
    fn test_reordering_is_not_a_change() {
        let mut a = base_document();
        a["Variables"] = json!([{"VarName": "Health"}, {"VarName": "Shield"}]);
        let mut b = base_document();
        b["Variables"] = json!([{"VarName": "Shield"}, {"VarName": "Health"}]);

        assert!(diff_values(&a, &b).is_empty());
    }

    #[test]
    fn test_graph_node_addition_nested_detail() {
        let a = base_document();
        let mut b = base_document();
        b["EventGraphs"][0]["nodes"] = json!([
            {"nodeGuid": "N1", "nodeClass": "K2Node_Event", "nodeTitle": "Begin Play"},
            {"nodeGuid": "N2", "nodeClass": "K2Node_CallFunction", "nodeTitle": ""}
        ]);

        let report = diff_values(&a, &b);
        // One graph-changed entry; nested node detail is not counted.
        assert_eq!(report.details.modifications, 1);
        assert_eq!(report.details.additions, 0);
        assert_eq!(
            report.details.diffs,
            vec![
                "~ Graph: EventGraph".to_string(),
                // Empty title falls back to the class name.
                "    + Node: K2Node_CallFunction".to_string(),
            ]
        );
    }

    #[test]
    fn test_unchanged_nodes_absent_from_detail() {
        let a = base_document();
        let mut b = base_document();
        b["EventGraphs"][0]["nodes"] = json!([
            {"nodeGuid": "N2", "nodeClass": "K2Node_CallFunction", "nodeTitle": "Print"}
        ]);

        let report = diff_values(&a, &b);
        let diffs = &report.details.diffs;
        assert!(diffs.contains(&"    + Node: Print".to_string()));
        assert!(diffs.contains(&"    - Node: Begin Play".to_string()));
        assert!(!diffs.iter().any(|d| d.contains("N1") || d.contains("N2")));
    }

    #[test]
    fn test_graph_added_and_removed_with_node_counts() {
        let mut a = base_document();
        let mut b = base_document();
        a["EventGraphs"] = json!([{"graphName": "Old", "nodes": [{}, {}]}]);
        b["EventGraphs"] = json!([{"graphName": "New", "nodes": [{}]}]);

        let report = diff_values(&a, &b);
        assert!(report.details.diffs.contains(&"+ Graph: New (1 nodes)".to_string()));
        assert!(report.details.diffs.contains(&"- Graph: Old (2 nodes)".to_string()));
    }

    #[test]
    fn test_parent_class_and_interfaces() {
        let a = base_document();
        let mut b = base_document();
        b["Metadata"]["ParentClass"] = json!("Pawn");
        b["ImplementedInterfaces"] = json!(["Damageable", "Interactable"]);

        let report = diff_values(&a, &b);
        assert!(report
            .details
            .diffs
            .contains(&"~ ParentClass: Character -> Pawn".to_string()));
        assert!(report.details.diffs.contains(&"+ Interface: Interactable".to_string()));
    }

    #[test]
    fn test_capitalized_document_keys_accepted() {
        let a = base_document();
        // Same content, but graph and node keys in the capitalized convention.
        let mut b = base_document();
        b["EventGraphs"] = json!([{
            "GraphName": "EventGraph",
            "Nodes": [{"NodeGuid": "N1", "NodeClass": "K2Node_Event", "NodeTitle": "Begin Play"}]
        }]);

        let report = diff_values(&a, &b);
        // The graph pass sees identical node sets despite the casing.
        assert!(!report.details.diffs.iter().any(|d| d.contains("Graph:")));
    }

    #[test]
    fn test_summary_header() {
        let a = base_document();
        let mut b = base_document();
        b["Metadata"]["BlueprintName"] = json!("BP_Player_v2");
        b["Variables"] = json!([]);

        let report = diff_values(&a, &b);
        assert!(report.summary.starts_with("Comparing BP_Player vs BP_Player_v2"));
        assert!(report.summary.contains("Changes: +0 added, -1 removed, ~0 modified"));
    }

    #[test]
    fn test_diff_after_graph_edit() {
        use blueprint_graph::{BlueprintGraph, GraphType};

        let mut graph = BlueprintGraph::new("EventGraph", GraphType::EventGraph, None);
        graph.add_node("K2Node_Event", (0, 0), "Begin Play", "", Default::default());

        let wrap = |graph: &BlueprintGraph| {
            json!({
                "Metadata": {"BlueprintName": "BP_Door", "ParentClass": "Actor"},
                "EventGraphs": [serde_json::to_value(graph.to_document()).unwrap()]
            })
        };
        let before = wrap(&graph);

        graph.add_node("K2Node_CallFunction", (200, 0), "Open Door", "", Default::default());
        let after = wrap(&graph);

        let report = diff_values(&before, &after);
        assert_eq!(report.details.modifications, 1);
        assert_eq!(
            report.details.diffs,
            vec![
                "~ Graph: EventGraph".to_string(),
                "    + Node: Open Door".to_string(),
            ]
        );
    }

    #[test]
    fn test_diff_json_parse_failure() {
        let good = base_document().to_string();
        let outcome = diff_json("not json", &good);
        match outcome {
            DiffOutcome::Failure(failure) => {
                assert!(!failure.success);
                assert!(!failure.error.is_empty());
            }
            DiffOutcome::Report(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_diff_json_success_wire_shape() {
        let doc = base_document().to_string();
        let outcome = diff_json(&doc, &doc);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["details"]["diffs"], json!([]));
    }
}
