use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use clusterbank::cli;
use clusterbank::genbank;

#[derive(Parser)]
#[command(name = "region_report", about = "Summarize annotated regions in a GenBank file")]
struct Cli {
    /// GenBank file to inspect (.gbk, or .gbk.gz for gzip input)
    input: PathBuf,
}

fn main() -> Result<()> {
    let start = Instant::now();
    let cli_args = Cli::parse();

    cli::banner("Region Report");

    let records = genbank::read_genbank(&cli_args.input)
        .with_context(|| format!("failed to read {}", cli_args.input.display()))?;

    let mut total_regions = 0;
    for record in &records {
        cli::section(record.id());
        if record.region_count() == 0 {
            cli::warning("no regions");
            continue;
        }
        for region in record.region_ids() {
            total_regions += 1;
            let location = record.region_location(region);
            cli::kv(
                "Region",
                &format!("{} ({}..{})", region.number(), location.start(), location.end()),
            );
            let products = record.region_product_string(region);
            if !products.is_empty() {
                cli::kv("Products", &products);
            }
            let probabilities = record.region_probabilities(region);
            if !probabilities.is_empty() {
                let joined: Vec<String> =
                    probabilities.iter().map(ToString::to_string).collect();
                cli::kv("Probabilities", &joined.join(", "));
            }
            cli::kv(
                "CDS features",
                &record.region(region).cds_children().len().to_string(),
            );
        }
        eprintln!();
    }

    cli::success(&format!(
        "{} region(s) across {} record(s)",
        total_regions,
        records.len()
    ));
    cli::print_summary(start);
    Ok(())
}
