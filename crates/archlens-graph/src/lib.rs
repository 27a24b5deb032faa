pub mod analytics;
pub mod builder;
pub mod evidence;
pub mod smells;

pub use analytics::{compute_degrees, edge_count, find_cycles};
pub use builder::{build_package_graph, resolve_internal_package};
pub use evidence::format_dependency_evidence;
pub use smells::{
    detect_cycle_smells, detect_dependency_magnets, detect_oversized_packages, detect_smells,
    SmellReport,
};
