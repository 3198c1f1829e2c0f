//! Blocks command implementation.

use crate::cli::BlocksArgs;
use crate::error::Result;
use crate::input::{read_email, EngineOptions};
use crate::output::Formatter;
use roster_extractor::BlockSummary;

/// Execute the blocks command.
pub fn execute_blocks(args: BlocksArgs, options: &EngineOptions, formatter: &Formatter) -> Result<()> {
    let engine = options.build_engine()?;
    let content = read_email(&args.file, args.html)?;

    let blocks: Vec<BlockSummary> = engine.section(&content).iter().map(BlockSummary::from).collect();
    println!("{}", formatter.format_blocks(&blocks)?);

    Ok(())
}
