//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::Result;
use crate::input::{read_email, EngineOptions};
use crate::output::Formatter;
use roster_extractor::ExtractionReport;

/// Execute the extract command.
pub fn execute_extract(args: ExtractArgs, options: &EngineOptions, formatter: &Formatter) -> Result<()> {
    let engine = options.build_engine()?;
    let content = read_email(&args.file, args.html)?;

    let report = ExtractionReport::build(&engine, &content, Some(args.file.display().to_string()));
    println!("{}", formatter.format_report(&report)?);

    if !args.no_validate {
        for line in formatter.issues(&report.issues) {
            eprintln!("{}", line);
        }
    }

    Ok(())
}
