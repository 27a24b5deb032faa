use indexmap::IndexSet;
use tracing::debug;

use archlens_core::{FileRecord, FilesByPackage, PackageGraph};

/// Resolve an import identifier to an internal package by longest-prefix
/// match: the import equals the package or starts with `package + "."`.
/// Ties on length (unreachable for exact prefix matching, but kept
/// deterministic) prefer the lexicographically smaller package. Returns
/// `None` for external imports.
pub fn resolve_internal_package<'a>(
    import_path: &str,
    internal_packages: &'a IndexSet<String>,
) -> Option<&'a str> {
    let mut best: Option<&str> = None;

    for pkg in internal_packages {
        let matches = import_path == pkg
            || (import_path.len() > pkg.len()
                && import_path.starts_with(pkg.as_str())
                && import_path.as_bytes()[pkg.len()] == b'.');
        if !matches {
            continue;
        }

        best = match best {
            Some(b) if pkg.len() < b.len() => Some(b),
            Some(b) if pkg.len() == b.len() && pkg.as_str() > b => Some(b),
            _ => Some(pkg),
        };
    }

    best
}

/// Build the directed package graph and the package->files index from a
/// sequence of file records.
///
/// Every distinct `package` value owning at least one file becomes a graph
/// key (in first-seen order), even with an empty dependency set. Imports
/// that resolve to no internal package, or back to the importing package
/// itself, produce no edge; that is a normal outcome, not an error.
pub fn build_package_graph(records: &[FileRecord]) -> (PackageGraph, FilesByPackage) {
    let internal_packages: IndexSet<String> = records
        .iter()
        .filter(|r| !r.package.is_empty())
        .map(|r| r.package.clone())
        .collect();

    let mut graph = PackageGraph::new();
    let mut files_by_pkg = FilesByPackage::new();

    for record in records {
        graph.entry(record.package.clone()).or_default();
        files_by_pkg
            .entry(record.package.clone())
            .or_default()
            .push(record.clone());
    }

    for record in records {
        if record.package.is_empty() {
            continue;
        }

        for import in &record.imports {
            let Some(dst) = resolve_internal_package(import, &internal_packages) else {
                continue;
            };
            if dst == record.package {
                continue;
            }
            let dst = dst.to_string();
            if let Some(deps) = graph.get_mut(&record.package) {
                deps.insert(dst);
            }
        }
    }

    let edge_count: usize = graph.values().map(IndexSet::len).sum();
    debug!(
        "Built package graph: {} packages, {} edges",
        graph.len(),
        edge_count
    );

    (graph, files_by_pkg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(package: &str, imports: &[&str]) -> FileRecord {
        FileRecord::new(
            format!("{}/File.java", package.replace('.', "/")),
            package,
            imports.iter().map(|s| s.to_string()).collect(),
            10,
        )
    }

    #[test]
    fn longest_prefix_wins() {
        let internal: IndexSet<String> = ["a", "a.b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            resolve_internal_package("a.b.c.Foo", &internal),
            Some("a.b")
        );
        assert_eq!(resolve_internal_package("a.X", &internal), Some("a"));
        assert_eq!(resolve_internal_package("a.b", &internal), Some("a.b"));
    }

    #[test]
    fn unrelated_imports_resolve_to_none() {
        let internal: IndexSet<String> = ["a.b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_internal_package("java.io.File", &internal), None);
        // "a.bc" is not "a.b" followed by a dot.
        assert_eq!(resolve_internal_package("a.bc.X", &internal), None);
    }

    #[test]
    fn graph_has_no_self_loops() {
        let records = vec![record("a", &["a.Helper", "b.Thing"]), record("b", &[])];
        let (graph, _) = build_package_graph(&records);
        assert!(!graph["a"].contains("a"));
        assert!(graph["a"].contains("b"));
    }

    #[test]
    fn every_file_owning_package_is_a_key() {
        let records = vec![record("a", &["b.X"]), record("b", &[])];
        let (graph, files) = build_package_graph(&records);
        assert!(graph.contains_key("a"));
        assert!(graph.contains_key("b"));
        assert!(graph["b"].is_empty());
        assert_eq!(files["a"].len(), 1);
    }

    #[test]
    fn external_imports_produce_no_edges() {
        let records = vec![record("a", &["java.util.List", "org.junit.Test"])];
        let (graph, _) = build_package_graph(&records);
        assert!(graph["a"].is_empty());
    }

    #[test]
    fn empty_package_contributes_files_but_no_edges() {
        let mut naked = record("", &["a.X"]);
        naked.path = "Naked.java".into();
        let records = vec![naked, record("a", &[])];
        let (graph, files) = build_package_graph(&records);
        assert!(graph.contains_key(""));
        assert!(graph[""].is_empty());
        assert_eq!(files[""].len(), 1);
    }

    #[test]
    fn key_order_is_first_seen() {
        let records = vec![record("z", &[]), record("a", &[]), record("z", &[])];
        let (graph, _) = build_package_graph(&records);
        let keys: Vec<&String> = graph.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
