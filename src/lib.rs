mod models;
mod normalize;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context as _, Result};
use num_format::{Locale, ToFormattedString};
use tracing::{info, warn};
use walkdir::WalkDir;

pub use crate::models::{CanonicalEdge, EdgeSet, ExtraColumns, MalformedRecord, NormalizeStats};
pub use crate::normalize::{normalize, normalize_file, EdgeList};

const INPUT_EXTENSION: &str = "txt";
const OUTPUT_SUFFIX: &str = " new";

/// Deduplicate undirected edge lists, writing `<name> new.txt` next to each input.
#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base names, .txt files, or directories of .txt files
    #[arg(required = true)]
    targets: Vec<PathBuf>,

    /// Write to this path instead of `<name> new.txt` (single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How to treat records with more than three fields
    #[arg(long, value_enum, default_value_t = ExtraColumns::Reject)]
    extra_columns: ExtraColumns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// `dir/GBM.txt` becomes `dir/GBM new.txt`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(OUTPUT_SUFFIX);
    name.push(".");
    name.push(INPUT_EXTENSION);
    input.with_file_name(name)
}

fn is_output_file(path: &Path) -> bool {
    path.file_stem().is_some_and(|stem| stem.to_string_lossy().ends_with(OUTPUT_SUFFIX))
}

fn has_input_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(INPUT_EXTENSION))
}

fn resolve_target(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_dir() {
        let mut inputs = Vec::new();
        for entry in WalkDir::new(target).sort_by_file_name() {
            let entry = entry.context("Failed to get a entry")?;
            let path = entry.path();
            if entry.file_type().is_file() && has_input_extension(path) && !is_output_file(path) {
                inputs.push(path.to_path_buf());
            }
        }
        if inputs.is_empty() {
            warn!(target = %target.display(), "no edge lists found in directory");
        }
        return Ok(inputs);
    }

    if has_input_extension(target) {
        return Ok(vec![target.to_path_buf()]);
    }

    // a bare base name, e.g. `GBM` for `GBM.txt`
    let mut name = OsString::from(target.as_os_str());
    name.push(".");
    name.push(INPUT_EXTENSION);
    Ok(vec![PathBuf::from(name)])
}

pub fn resolve_jobs(args: &Args) -> Result<Vec<Job>> {
    let mut inputs = Vec::new();
    for target in &args.targets {
        inputs.extend(resolve_target(target)?);
    }

    if let Some(output) = &args.output {
        ensure!(
            inputs.len() == 1,
            "--output requires exactly one input, but the targets expand to {}",
            inputs.len(),
        );
        return Ok(vec![Job {
            input: inputs.remove(0),
            output: output.clone(),
        }]);
    }

    Ok(inputs
        .into_iter()
        .map(|input| Job {
            output: output_path_for(&input),
            input,
        })
        .collect())
}

fn format_stats(stats: &NormalizeStats) -> String {
    format!(
        "Edges: {} read, {} unique",
        stats.read.to_formatted_string(&Locale::en),
        stats.unique.to_formatted_string(&Locale::en),
    )
}

pub fn run(args: Args) -> Result<()> {
    let jobs = resolve_jobs(&args)?;
    let mut total = NormalizeStats::default();
    for job in &jobs {
        info!(input = %job.input.display(), output = %job.output.display(), "normalizing");
        let stats = normalize_file(&job.input, &job.output, args.extra_columns)?;
        println!("{}", &job.input.display());
        println!("-> {}", &job.output.display());
        println!("{}", format_stats(&stats));
        total += stats;
    }
    if jobs.len() > 1 {
        println!("Total: {} files, {}", jobs.len(), format_stats(&total));
    }
    Ok(())
}
