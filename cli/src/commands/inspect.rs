use anyhow::Result;
use zonewalk::{inspect, read_shapefile};

use crate::commands::load_config;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::InspectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let info = inspect(&read_shapefile(&args.layer)?, &config);

    println!("[inspect] {} ({} features)", info.name, info.features);
    println!("[inspect] crs: {}", info.crs.as_deref().unwrap_or("none (.prj missing)"));
    if let Some(bounds) = info.bounds {
        println!(
            "[inspect] bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
            bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y,
        );
    }
    println!("[inspect] total area: {:.3}", info.total_area);
    for (role, column) in &info.detected {
        println!("[inspect] {role}: {}", column.as_deref().unwrap_or("-"));
    }
    if cli.verbose > 0 {
        println!("[inspect] columns: {}", info.columns.join(", "));
    }

    Ok(())
}
