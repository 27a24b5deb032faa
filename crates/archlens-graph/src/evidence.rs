use archlens_core::{PackageGraph, Smell};

use crate::analytics::edge_count;
use crate::smells::SmellReport;

/// Render the evidence block: the deterministic, ID-addressable text that is
/// the sole grounding material for any downstream generation. Re-rendering
/// the same inputs yields byte-identical output.
///
/// Line grammar (the verifier parses these prefixes byte-for-byte):
///
/// ```text
/// SUMMARY: packages=<n> edges=<m>
/// MAGNET_k: <pkg> fin=<i> fout=<o> total=<t>
/// MAGNET_k_FILES: <path> (loc=<n>), <path> (loc=<n>)
/// CYCLE_k: <pkg> -> <pkg> -> ... -> <pkg>
/// EDGE_k: <pkg> -> <pkg> cycle=CYCLE_j
/// OVERSIZED_k: <pkg> total_loc=<n>
/// ```
///
/// IDs are 1-based and sequential per category in emission order. EDGE ids
/// are global across all cycles, never reset. Empty categories render as
/// `(none)`.
pub fn format_dependency_evidence(graph: &PackageGraph, smells: &SmellReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("Dependency evidence summary:".to_string());
    lines.push(format!(
        "SUMMARY: packages={} edges={}",
        graph.len(),
        edge_count(graph)
    ));

    lines.push(String::new());
    lines.push("Dependency magnets (fan_in/fan_out/total):".to_string());
    if smells.magnets.is_empty() {
        lines.push("(none)".to_string());
    } else {
        for (i, smell) in smells.magnets.iter().enumerate() {
            let Smell::DependencyMagnet {
                package,
                fan_in,
                fan_out,
                total_degree,
                sample_files,
            } = smell
            else {
                continue;
            };
            let mid = format!("MAGNET_{}", i + 1);
            lines.push(format!(
                "{}: {} fin={} fout={} total={}",
                mid, package, fan_in, fan_out, total_degree
            ));
            if !sample_files.is_empty() {
                lines.push(format!("{}_FILES: {}", mid, sample_files.join(", ")));
            }
        }
    }

    lines.push(String::new());
    lines.push("Cycles (package-level):".to_string());
    if smells.cycles.is_empty() {
        lines.push("(none)".to_string());
    } else {
        let mut edge_id = 1usize;
        for (c, smell) in smells.cycles.iter().enumerate() {
            let Smell::Cycle { path } = smell else {
                continue;
            };
            let cid = format!("CYCLE_{}", c + 1);
            lines.push(format!("{}: {}", cid, path.join(" -> ")));

            for pair in path.windows(2) {
                lines.push(format!(
                    "EDGE_{}: {} -> {} cycle={}",
                    edge_id, pair[0], pair[1], cid
                ));
                edge_id += 1;
            }
        }
    }

    lines.push(String::new());
    lines.push("Oversized packages (by total LOC):".to_string());
    if smells.oversized.is_empty() {
        lines.push("(none)".to_string());
    } else {
        for (k, smell) in smells.oversized.iter().enumerate() {
            let Smell::OversizedPackage { package, total_loc } = smell else {
                continue;
            };
            lines.push(format!("OVERSIZED_{}: {} total_loc={}", k + 1, package, total_loc));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{compute_degrees, find_cycles};
    use crate::builder::build_package_graph;
    use crate::smells::detect_smells;
    use archlens_core::{AnalysisConfig, FileRecord};

    fn two_package_cycle_records() -> Vec<FileRecord> {
        vec![
            FileRecord::new("a/One.java", "a", vec!["b.Thing".into()], 10),
            FileRecord::new("b/Two.java", "b", vec!["a.Other".into()], 20),
        ]
    }

    #[test]
    fn empty_graph_renders_none_placeholders() {
        let graph = PackageGraph::new();
        let text = format_dependency_evidence(&graph, &SmellReport::default());

        assert!(text.contains("SUMMARY: packages=0 edges=0"));
        assert_eq!(text.matches("(none)").count(), 3);
    }

    #[test]
    fn formatting_is_idempotent() {
        let records = two_package_cycle_records();
        let (graph, files) = build_package_graph(&records);
        let degrees = compute_degrees(&graph);
        let cycles = find_cycles(&graph, 5);
        let smells = detect_smells(&degrees, &files, &cycles, &AnalysisConfig::default());

        let first = format_dependency_evidence(&graph, &smells);
        let second = format_dependency_evidence(&graph, &smells);
        assert_eq!(first, second);
    }

    #[test]
    fn end_to_end_two_package_cycle_scenario() {
        let records = two_package_cycle_records();
        let (graph, files) = build_package_graph(&records);

        assert!(graph["a"].contains("b"));
        assert!(graph["b"].contains("a"));

        let degrees = compute_degrees(&graph);
        assert_eq!(degrees.fan_in("a"), 1);
        assert_eq!(degrees.fan_out("a"), 1);
        assert_eq!(degrees.fan_in("b"), 1);
        assert_eq!(degrees.fan_out("b"), 1);

        let cycles = find_cycles(&graph, 5);
        assert_eq!(cycles, vec![vec!["a", "b", "a"]]);

        let smells = detect_smells(&degrees, &files, &cycles, &AnalysisConfig::default());
        let text = format_dependency_evidence(&graph, &smells);

        assert!(text.contains("SUMMARY: packages=2 edges=2"));
        assert!(text.contains("CYCLE_1: a -> b -> a"));
        assert!(text.contains("EDGE_1: a -> b cycle=CYCLE_1"));
        assert!(text.contains("EDGE_2: b -> a cycle=CYCLE_1"));
    }

    #[test]
    fn edge_ids_are_global_across_cycles() {
        let smells = SmellReport {
            magnets: vec![],
            cycles: vec![
                Smell::Cycle {
                    path: vec!["a".into(), "b".into(), "a".into()],
                },
                Smell::Cycle {
                    path: vec!["c".into(), "d".into(), "c".into()],
                },
            ],
            oversized: vec![],
        };
        let text = format_dependency_evidence(&PackageGraph::new(), &smells);

        assert!(text.contains("EDGE_1: a -> b cycle=CYCLE_1"));
        assert!(text.contains("EDGE_2: b -> a cycle=CYCLE_1"));
        assert!(text.contains("EDGE_3: c -> d cycle=CYCLE_2"));
        assert!(text.contains("EDGE_4: d -> c cycle=CYCLE_2"));
        assert!(!text.contains("EDGE_5"));
    }

    #[test]
    fn magnet_lines_follow_the_grammar() {
        let smells = SmellReport {
            magnets: vec![Smell::DependencyMagnet {
                package: "a.util".into(),
                fan_in: 4,
                fan_out: 2,
                total_degree: 6,
                sample_files: vec!["a/util/Raw.java (loc=120)".into()],
            }],
            cycles: vec![],
            oversized: vec![Smell::OversizedPackage {
                package: "a.core".into(),
                total_loc: 900,
            }],
        };
        let text = format_dependency_evidence(&PackageGraph::new(), &smells);

        assert!(text.contains("MAGNET_1: a.util fin=4 fout=2 total=6"));
        assert!(text.contains("MAGNET_1_FILES: a/util/Raw.java (loc=120)"));
        assert!(text.contains("OVERSIZED_1: a.core total_loc=900"));
    }
}
