use anyhow::{Context, Result};
use zonewalk::Pipeline;

use crate::commands::load_config;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ValidateArgs) -> Result<()> {
    let pipeline = Pipeline::new(load_config(args.config.as_deref())?)?;

    println!("[validate] checking {} against {}", args.crosswalk.display(), args.fine.display());
    let crosswalk = pipeline.validate_files(&args.crosswalk, &args.fine)
        .with_context(|| format!("{} failed validation", args.crosswalk.display()))?;

    println!("[validate] ok: {} records, one per fine zone", crosswalk.len());
    Ok(())
}
