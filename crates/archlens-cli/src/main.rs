use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use archlens_ai::{ArchEngine, OpenAiCompatibleProvider, Outcome, ResponseVerifier};
use archlens_core::ArchLensConfig;
use archlens_parser::{count_repo_loc, scan_repo_java};

#[derive(Parser)]
#[command(name = "archlens")]
#[command(about = "Grounded architectural refactoring advisor", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "ARCHLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and produce a verified recommendation
    Analyze {
        /// Repository root to analyze
        repo: PathBuf,

        /// Skip the LLM and use the deterministic fallback path
        #[arg(long)]
        offline: bool,

        /// Directory for the generated report
        #[arg(short, long, default_value = "out")]
        out: PathBuf,
    },

    /// Count production Java lines in a repository
    Loc {
        /// Repository root to scan
        repo: PathBuf,
    },

    /// Check an answer file against an evidence file
    Verify {
        /// Candidate answer text file
        answer: PathBuf,

        /// Evidence block file the answer must be grounded in
        evidence: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<ArchLensConfig> {
    match path {
        Some(p) => ArchLensConfig::from_toml_file(p)
            .with_context(|| format!("failed to load config from {}", p.display())),
        None => Ok(ArchLensConfig::default()),
    }
}

fn write_report(out_dir: &Path, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let path = out_dir.join("arch_report.md");
    let stamped = format!(
        "<!-- generated by archlens on {} -->\n{}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        text
    );
    fs::write(&path, stamped).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

async fn run_analyze(config: ArchLensConfig, repo: &Path, offline: bool, out: &Path) -> Result<()> {
    let records = scan_repo_java(repo)?;
    if records.is_empty() {
        println!("{} no Java sources found under {}", "warning:".yellow(), repo.display());
    }

    let engine = if offline {
        ArchEngine::offline(config)
    } else {
        let provider = OpenAiCompatibleProvider::new(config.llm.clone())?;
        ArchEngine::new(config, Some(Arc::new(provider)))
    };

    let report = engine.run(&records).await?;
    println!(
        "Analyzed {} packages, {} edges, {} cycle(s) found",
        report.stats.packages, report.stats.edges, report.stats.cycles_found
    );

    match &report.outcome {
        Outcome::Accepted { answer } => {
            println!("{}", "ACCEPTED".green().bold());
            println!("{}", answer);
            let path = write_report(out, answer)?;
            println!("Wrote: {}", path.display());
        }
        Outcome::Fallback { answer, reason } => {
            println!("{} {}", "FALLBACK".yellow().bold(), reason);
            println!("{}", answer);
            let path = write_report(out, answer)?;
            println!("Wrote: {}", path.display());
        }
        Outcome::Blocked { reason } => {
            println!("{} {}", "BLOCKED:".red().bold(), reason);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn run_loc(repo: &Path) -> Result<()> {
    let (total, files) = count_repo_loc(repo)?;
    println!("repo_path={}", repo.display());
    println!("java_files={}", files);
    println!("total_loc={}", total);
    Ok(())
}

fn run_verify(config: &ArchLensConfig, answer_path: &Path, evidence_path: &Path) -> Result<()> {
    let answer = fs::read_to_string(answer_path)
        .with_context(|| format!("failed to read {}", answer_path.display()))?;
    let evidence = fs::read_to_string(evidence_path)
        .with_context(|| format!("failed to read {}", evidence_path.display()))?;

    let verifier = ResponseVerifier::new(&config.verify)?;
    let verdict = verifier.verify(&answer, &evidence);

    if verdict.accepted {
        println!("{}", "ACCEPTED".green().bold());
        Ok(())
    } else {
        println!("{} {}", "REJECTED:".red().bold(), verdict.reason);
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Analyze { repo, offline, out } => {
            run_analyze(config, repo, *offline, out).await
        }
        Commands::Loc { repo } => run_loc(repo),
        Commands::Verify { answer, evidence } => run_verify(&config, answer, evidence),
    }
}
