use archlens_core::{AnalysisConfig, Cycle, DegreeTable, FilesByPackage, Smell};

/// All smells detected in one analysis run, grouped by category in the
/// order the evidence block will render them.
#[derive(Debug, Clone, Default)]
pub struct SmellReport {
    pub magnets: Vec<Smell>,
    pub cycles: Vec<Smell>,
    pub oversized: Vec<Smell>,
}

/// Rank packages by total degree (fan-in + fan-out) descending and keep the
/// top N, each with up to `sample_files` largest member files as evidence.
pub fn detect_dependency_magnets(
    degrees: &DegreeTable,
    files_by_pkg: &FilesByPackage,
    top_n: usize,
    sample_files: usize,
) -> Vec<Smell> {
    let mut ranked: Vec<(String, usize, usize, usize)> = degrees
        .packages()
        .into_iter()
        .map(|pkg| {
            let fin = degrees.fan_in(&pkg);
            let fout = degrees.fan_out(&pkg);
            (pkg, fin, fout, fin + fout)
        })
        .collect();
    // Stable sort keeps first-seen order among equal degrees.
    ranked.sort_by(|a, b| b.3.cmp(&a.3));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .map(|(package, fan_in, fan_out, total_degree)| {
            let mut samples: Vec<&archlens_core::FileRecord> = files_by_pkg
                .get(&package)
                .map(|files| files.iter().collect())
                .unwrap_or_default();
            samples.sort_by(|a, b| b.loc.cmp(&a.loc));

            let sample_files = samples
                .into_iter()
                .take(sample_files)
                .map(|f| format!("{} (loc={})", f.path, f.loc))
                .collect();

            Smell::DependencyMagnet {
                package,
                fan_in,
                fan_out,
                total_degree,
                sample_files,
            }
        })
        .collect()
}

/// Wrap detected cycles into smell records, preserving detection order.
pub fn detect_cycle_smells(cycles: &[Cycle]) -> Vec<Smell> {
    cycles
        .iter()
        .map(|c| Smell::Cycle { path: c.clone() })
        .collect()
}

/// Rank packages by aggregate member LOC descending and keep the top N.
pub fn detect_oversized_packages(files_by_pkg: &FilesByPackage, top_n: usize) -> Vec<Smell> {
    let mut ranked: Vec<(String, usize)> = files_by_pkg
        .iter()
        .map(|(pkg, files)| (pkg.clone(), files.iter().map(|f| f.loc).sum()))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top_n);

    ranked
        .into_iter()
        .map(|(package, total_loc)| Smell::OversizedPackage { package, total_loc })
        .collect()
}

/// Run all detectors with the configured bounds. Empty inputs yield empty
/// categories.
pub fn detect_smells(
    degrees: &DegreeTable,
    files_by_pkg: &FilesByPackage,
    cycles: &[Cycle],
    config: &AnalysisConfig,
) -> SmellReport {
    SmellReport {
        magnets: detect_dependency_magnets(
            degrees,
            files_by_pkg,
            config.top_magnets,
            config.sample_files,
        ),
        cycles: detect_cycle_smells(cycles),
        oversized: detect_oversized_packages(files_by_pkg, config.top_oversized),
    }
}
