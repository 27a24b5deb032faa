use indexmap::IndexSet;
use tracing::debug;

use archlens_core::{Cycle, DegreeTable, PackageGraph};

/// Compute in/out degree per package. Out-degree is the size of a package's
/// edge set; in-degree counts distinct packages depending on it. Every
/// package appearing in either position gets a 0-default entry in the
/// opposite table.
pub fn compute_degrees(graph: &PackageGraph) -> DegreeTable {
    let mut table = DegreeTable::default();

    for (pkg, deps) in graph {
        table.out_degree.insert(pkg.clone(), deps.len());
        table.in_degree.entry(pkg.clone()).or_insert(0);

        for dep in deps {
            *table.in_degree.entry(dep.clone()).or_insert(0) += 1;
            table.out_degree.entry(dep.clone()).or_insert(0);
        }
    }

    table
}

/// One DFS frame: the node and the index of the next child to visit.
struct Frame {
    node: usize,
    next_child: usize,
}

/// Find up to `limit` cycles by depth-first search.
///
/// Detection is a bounded sample, not an exhaustive enumeration: once `limit`
/// cycles have been emitted the search stops, and the same cycle structure
/// may surface in different rotations depending on traversal order. Traversal
/// order is the graph's insertion order, so results are stable for a fixed
/// input ordering.
///
/// The DFS keeps an explicit frame stack rather than recursing, so depth is
/// bounded by the package count without touching the call stack. A node is
/// marked on-path when its frame is pushed and unmarked when the frame pops;
/// only an edge into an on-path node is a back-edge (cycle), while edges
/// into globally-visited, off-path nodes are cross-edges and emit nothing.
pub fn find_cycles(graph: &PackageGraph, limit: usize) -> Vec<Cycle> {
    let mut cycles: Vec<Cycle> = Vec::new();
    if limit == 0 {
        return cycles;
    }

    // Index-based adjacency over the key order for cheap set membership.
    let nodes: Vec<&String> = graph.keys().collect();
    let index_of = |name: &String| -> Option<usize> { graph.get_index_of(name) };
    let children: Vec<Vec<usize>> = graph
        .values()
        .map(|deps| deps.iter().filter_map(index_of).collect())
        .collect();

    let mut visited = vec![false; nodes.len()];
    let mut on_path = vec![false; nodes.len()];
    let mut path: Vec<usize> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    'roots: for root in 0..nodes.len() {
        if visited[root] {
            continue;
        }

        visited[root] = true;
        on_path[root] = true;
        path.push(root);
        stack.push(Frame {
            node: root,
            next_child: 0,
        });

        while let Some(frame) = stack.last_mut() {
            let u = frame.node;
            if let Some(&v) = children[u].get(frame.next_child) {
                frame.next_child += 1;

                if !visited[v] {
                    visited[v] = true;
                    on_path[v] = true;
                    path.push(v);
                    stack.push(Frame {
                        node: v,
                        next_child: 0,
                    });
                } else if on_path[v] {
                    // Back-edge: close the loop from v's first occurrence on
                    // the current path through the top, then repeat v.
                    if let Some(start) = path.iter().position(|&n| n == v) {
                        let mut cycle: Cycle =
                            path[start..].iter().map(|&n| nodes[n].clone()).collect();
                        cycle.push(nodes[v].clone());
                        cycles.push(cycle);
                    }
                    if cycles.len() >= limit {
                        break 'roots;
                    }
                }
            } else {
                on_path[u] = false;
                path.pop();
                stack.pop();
            }
        }
    }

    debug!("Cycle search found {} cycle(s), limit {}", cycles.len(), limit);
    cycles
}

/// Total directed edge count of a graph.
pub fn edge_count(graph: &PackageGraph) -> usize {
    graph.values().map(IndexSet::len).sum()
}
