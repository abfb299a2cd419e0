use crate::tasks::{
    bins::{BinPartition, Distribution},
    stats::Summary,
};

pub fn percentile_line(summary: &Summary) -> String {
    format!(
        "P50: {:.2}×, P75: {:.2}×, P90: {:.2}×",
        summary.median, summary.p75, summary.p90
    )
}

pub fn summary_lines(summary: &Summary) -> Vec<String> {
    vec![
        format!("  Blocks analyzed: {}", summary.count),
        format!("  Min:    {:.2}×", summary.min),
        format!("  P25:    {:.2}×", summary.p25),
        format!("  Median: {:.2}×", summary.median),
        format!("  P75:    {:.2}×", summary.p75),
        format!("  P90:    {:.2}×", summary.p90),
        format!("  P95:    {:.2}×", summary.p95),
        format!("  P99:    {:.2}×", summary.p99),
        format!("  Max:    {:.2}×", summary.max),
        format!("  Mean:   {:.2}×", summary.mean),
    ]
}

pub fn print_summary(title: &str, summary: &Summary) {
    println!("\n{title} speedup statistics:");
    for line in summary_lines(summary) {
        println!("{line}");
    }
}

pub fn distribution_lines(bins: &BinPartition, dist: &Distribution) -> Vec<String> {
    let mut lines = vec![
        format!("{:<15} {:<10} {:<12}", "Speedup Range", "Blocks", "Percentage"),
        "-".repeat(37),
    ];
    for ((label, count), pct) in bins
        .labels()
        .iter()
        .zip(&dist.counts)
        .zip(&dist.percentages)
    {
        lines.push(format!("{label:<15} {count:<10} {pct:>6.1}%"));
    }

    lines
}

pub fn print_distribution(bins: &BinPartition, dist: &Distribution) {
    println!();
    for line in distribution_lines(bins, dist) {
        println!("{line}");
    }
}

pub fn distribution_column_lines(
    bins: &BinPartition,
    columns: &[(&str, &Distribution)],
) -> Vec<String> {
    let mut header = format!("{:<10}", "Speedup");
    for (name, _) in columns {
        header.push_str(&format!(" {name:>12}"));
    }
    let rule = "=".repeat(header.chars().count());

    let mut lines = vec![rule.clone(), header, rule];
    for (idx, label) in bins.labels().iter().enumerate() {
        let mut line = format!("{label:<10}");
        for (_, dist) in columns {
            line.push_str(&format!(" {:>11.1}%", dist.percentages[idx]));
        }
        lines.push(line);
    }

    lines
}

pub fn print_distribution_columns(bins: &BinPartition, columns: &[(&str, &Distribution)]) {
    println!();
    for line in distribution_column_lines(bins, columns) {
        println!("{line}");
    }
}
