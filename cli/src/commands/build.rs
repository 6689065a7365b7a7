use anyhow::{Context, Result};
use zonewalk::{FallbackPolicy, MinOverlap, Pipeline};

use crate::{cli::FallbackArg, commands::load_config};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::BuildArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(fraction) = args.min_overlap_fraction {
        config = config.with_min_overlap(MinOverlap::Fraction(fraction));
    }
    if let Some(area) = args.min_overlap_area {
        config = config.with_min_overlap(MinOverlap::Absolute(area));
    }
    if let Some(fallback) = args.fallback {
        config = config.with_fallback_policy(match fallback {
            FallbackArg::NearestCentroid => FallbackPolicy::NearestCentroid,
            FallbackArg::NearestBoundary => FallbackPolicy::NearestBoundary,
            FallbackArg::Reject => FallbackPolicy::Reject,
        });
    }

    let pipeline = Pipeline::new(config)?;

    println!("[build] loading {} and {}", args.fine.display(), args.coarse.display());
    let run = pipeline.run_files(&args.fine, &args.coarse, &args.regions)
        .context("crosswalk build failed; no output written")?;

    let summary = &run.summary;
    println!(
        "[build] resolved {} medium zones: {} single, {} by area, {} ties, {} fallbacks",
        summary.total(), summary.single, summary.area, summary.tie, summary.fallback,
    );

    let digest = run.write_csv(&args.output, args.force)?;
    println!("[build] wrote {} records to {} (sha256 {digest})", run.crosswalk.len(), args.output.display());

    if let Some(report) = &args.report {
        run.write_report(report, args.force)?;
        println!("[build] wrote resolution report to {}", report.display());
    }

    Ok(())
}
