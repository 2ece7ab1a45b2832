use vento_core::analysis::WsiOutcome;

pub fn print(outcome: &WsiOutcome, max_sites: usize) {
    println!("=== {} ===\n", outcome.config_name);

    let stats = &outcome.statistics;
    println!(
        "  Grid: {}x{} cells, {} valid ({:.1}% nodata)",
        outcome.wsi.width(),
        outcome.wsi.height(),
        stats.valid_cells,
        stats.nodata_percentage
    );
    if stats.valid_cells > 0 {
        println!(
            "  WSI:  mean {:.3}, std {:.3}, range {:.3} - {:.3}",
            stats.mean, stats.std_dev, stats.min, stats.max
        );
    }

    let v = &outcome.viability;
    println!(
        "  Viable (WSI >= {}): {:.1}% ({} of {} cells, area {:.0} of {:.0})\n",
        v.threshold,
        v.viability_percentage,
        v.suitable_cell_count,
        v.total_valid_cell_count,
        v.suitable_area,
        v.total_area
    );

    // Criteria
    let name_width = outcome
        .criteria
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(10);
    println!("  Criteria:");
    for c in &outcome.criteria {
        println!(
            "    {:<width$}  weight {:.2}  {:<16}  {:<12}  raw {:.2} - {:.2}",
            c.name,
            c.weight,
            c.direction.to_string(),
            c.method.to_string(),
            c.raw_stats.min,
            c.raw_stats.max,
            width = name_width
        );
    }
    println!();

    // Class breakdown
    println!("  Classes:");
    for share in &outcome.class_breakdown {
        let bar = "#".repeat((share.percentage / 2.5).round() as usize);
        println!(
            "    {:<10} {:>8}  {:>5.1}%  {}",
            share.level.to_string(),
            share.cell_count,
            share.percentage,
            bar
        );
    }
    println!();

    // Sites
    match outcome.effective_threshold {
        Some(t) if !outcome.sites.is_empty() => {
            println!(
                "  Candidate sites (WSI >= {:.3}): {}",
                t,
                outcome.sites.len()
            );
            println!(
                "    {:>4}  {:>7}  {:>12}  {:>6}  {:>6}  Centroid",
                "Rank", "Cells", "Area", "Mean", "Max"
            );
            for site in outcome.sites.iter().take(max_sites) {
                println!(
                    "    {:>4}  {:>7}  {:>12.0}  {:>6.3}  {:>6.3}  ({:.1}, {:.1})",
                    site.rank,
                    site.cell_count,
                    site.area,
                    site.mean_wsi,
                    site.max_wsi,
                    site.centroid.0,
                    site.centroid.1
                );
            }
            if outcome.sites.len() > max_sites {
                println!(
                    "    ... and {} more",
                    outcome.sites.len() - max_sites
                );
            }
        }
        _ => println!("  No candidate sites."),
    }

    if !outcome.warnings.is_empty() {
        println!("\n  Warnings:");
        for w in &outcome.warnings {
            println!("    - {}: {}", w.criterion, w.message);
        }
    }

    println!("\n  Computed in {:.3}s", outcome.processing_time_seconds);
}
