use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One source file after extraction: its owning package, the identifiers it
/// imports, and its line count. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Repository-relative path, `/`-separated.
    pub path: String,
    /// Declared package, empty when the file has none.
    pub package: String,
    /// Imported identifiers in source order.
    pub imports: Vec<String>,
    /// Non-blank, non-comment line count.
    pub loc: usize,
}

impl FileRecord {
    pub fn new(
        path: impl Into<String>,
        package: impl Into<String>,
        imports: Vec<String>,
        loc: usize,
    ) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            imports,
            loc,
        }
    }
}

/// Directed package dependency graph. Every package that owns at least one
/// file is a key, even with no outgoing edges. Insertion order is first-seen
/// order so downstream rendering is reproducible.
pub type PackageGraph = IndexMap<String, IndexSet<String>>;

/// Files grouped by owning package, in extraction order.
pub type FilesByPackage = IndexMap<String, Vec<FileRecord>>;

/// In/out degree per package. Any package appearing as an edge source or
/// destination, or as a graph key, has an entry in both tables (default 0).
#[derive(Debug, Clone, Default)]
pub struct DegreeTable {
    pub in_degree: IndexMap<String, usize>,
    pub out_degree: IndexMap<String, usize>,
}

impl DegreeTable {
    pub fn fan_in(&self, package: &str) -> usize {
        self.in_degree.get(package).copied().unwrap_or(0)
    }

    pub fn fan_out(&self, package: &str) -> usize {
        self.out_degree.get(package).copied().unwrap_or(0)
    }

    pub fn total_degree(&self, package: &str) -> usize {
        self.fan_in(package) + self.fan_out(package)
    }

    /// All packages present in either table, in first-seen order.
    pub fn packages(&self) -> IndexSet<String> {
        let mut all: IndexSet<String> = IndexSet::new();
        for k in self.in_degree.keys() {
            all.insert(k.clone());
        }
        for k in self.out_degree.keys() {
            all.insert(k.clone());
        }
        all
    }
}

/// A closed walk through the package graph: consecutive entries are connected
/// by an edge and the last entry repeats the first.
pub type Cycle = Vec<String>;

/// A detected architectural smell. Ephemeral: exists only within one
/// analysis run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Smell {
    DependencyMagnet {
        package: String,
        fan_in: usize,
        fan_out: usize,
        total_degree: usize,
        /// Up to three largest member files, annotated `path (loc=N)`.
        sample_files: Vec<String>,
    },
    Cycle {
        path: Cycle,
    },
    OversizedPackage {
        package: String,
        total_loc: usize,
    },
}

/// Outcome of checking a generated answer against its evidence block.
/// Rejection is the intended mechanism for refusing ungrounded text, not a
/// bug condition, so this is a value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: String,
}

impl Verdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: "OK".to_string(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: reason.into(),
        }
    }
}
