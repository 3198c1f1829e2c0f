//! Batch command implementation.

use crate::cli::BatchArgs;
use crate::error::{CliError, Result};
use crate::input::{read_email, EngineOptions};
use crate::output::Formatter;
use roster_extractor::{ExtractionEngine, ExtractionReport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Totals for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Files processed
    pub files: usize,
    /// Records produced
    pub records: usize,
    /// Files that could not be read or written
    pub failed: usize,
}

/// Execute the batch command.
pub fn execute_batch(args: BatchArgs, options: &EngineOptions, formatter: &Formatter) -> Result<()> {
    let engine = options.build_engine()?;
    let inputs = collect_inputs(&args.dir, &args.extensions)?;
    if inputs.is_empty() {
        println!("{}", formatter.info(&format!("No matching files in {}", args.dir.display())));
        return Ok(());
    }

    if let Some(out_dir) = &args.out_dir {
        fs::create_dir_all(out_dir)?;
    }

    let summary = run_batch(&engine, &inputs, args.out_dir.as_deref(), formatter);
    let message = format!(
        "Processed {} file(s), {} record(s), {} failed",
        summary.files, summary.records, summary.failed
    );
    if summary.failed > 0 {
        eprintln!("{}", formatter.warning(&message));
    } else {
        eprintln!("{}", formatter.success(&message));
    }
    Ok(())
}

/// Files directly inside `dir` whose extension is listed, sorted by name.
pub fn collect_inputs(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!("{} is not a directory", dir.display())));
    }
    let mut inputs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.iter().any(|x| x.trim_start_matches('.').eq_ignore_ascii_case(e)))
                .unwrap_or(false)
        })
        .collect();
    inputs.sort();
    Ok(inputs)
}

/// Extract every input; one failing file does not stop the rest.
pub fn run_batch(
    engine: &ExtractionEngine,
    inputs: &[PathBuf],
    out_dir: Option<&Path>,
    formatter: &Formatter,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for path in inputs {
        match process_one(engine, path, out_dir, formatter) {
            Ok(records) => {
                summary.files += 1;
                summary.records += records;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                eprintln!("{}", formatter.error(&e.to_string()));
                summary.failed += 1;
            }
        }
    }
    info!(
        "Batch finished: {} file(s), {} record(s), {} failed",
        summary.files, summary.records, summary.failed
    );
    summary
}

fn process_one(
    engine: &ExtractionEngine,
    path: &Path,
    out_dir: Option<&Path>,
    formatter: &Formatter,
) -> Result<usize> {
    let content = read_email(path, false)?;
    let report = ExtractionReport::build(engine, &content, Some(path.display().to_string()));

    match out_dir {
        Some(dir) => {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("email");
            fs::write(dir.join(format!("{}.json", stem)), report.to_json()?)?;
        }
        None => {
            println!("{}", formatter.info(&path.display().to_string()));
            println!("{}", formatter.format_report(&report)?);
        }
    }
    Ok(report.records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn extensions() -> Vec<String> {
        vec!["txt".to_string(), "html".to_string()]
    }

    #[test]
    fn test_collect_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("a.HTML"), "x").unwrap();
        fs::write(dir.path().join("c.pdf"), "x").unwrap();
        fs::create_dir(dir.path().join("d.txt")).unwrap();

        let inputs = collect_inputs(dir.path(), &extensions()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.HTML", "b.txt"]);
    }

    #[test]
    fn test_collect_inputs_rejects_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            collect_inputs(file.path(), &extensions()),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_batch_writes_reports() {
        let inbox = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(
            inbox.path().join("term.txt"),
            "Please terminate Dr. John Smith, NPI 1234567893, effective 09/22/2025. Reason: retirement.",
        )
        .unwrap();
        fs::write(inbox.path().join("blank.txt"), "").unwrap();

        let inputs = collect_inputs(inbox.path(), &extensions()).unwrap();
        let engine = ExtractionEngine::default();
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let summary = run_batch(&engine, &inputs, Some(out.path()), &formatter);

        assert_eq!(
            summary,
            BatchSummary {
                files: 2,
                records: 2,
                failed: 0
            }
        );
        let json = fs::read_to_string(out.path().join("term.json")).unwrap();
        assert!(json.contains("\"Provider NPI\": \"1234567893\""));
        assert!(out.path().join("blank.json").exists());
    }
}
