use std::time::Duration;

use console::Style;
use moviebarcode_core::pipeline::config::BarcodeConfig;
use moviebarcode_core::pipeline::BarcodeSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            warning: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_header(config: &BarcodeConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Movie Barcode"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(13)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value
            .apply_to(format!("{}x{}", config.output_width, config.output_height))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Clusters"),
        s.value.apply_to(format!(
            "{} (seed {}, {} attempts)",
            config.kmeans.clusters, config.kmeans.seed, config.kmeans.attempts
        ))
    );
    println!();
}

pub fn print_run_summary(summary: &BarcodeSummary, config: &BarcodeConfig) {
    let s = Styles::new();
    let columns = &summary.columns;

    println!("  {}", s.header.apply_to("Result"));
    println!(
        "    {:<14}{}",
        s.label.apply_to("Source"),
        s.value.apply_to(format!(
            "{}x{} ({})",
            summary.source.width, summary.source.height, summary.source.backend
        ))
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(columns.frame_count)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Per column"),
        s.value.apply_to(columns.stride)
    );
    println!(
        "    {:<14}{}",
        s.label.apply_to("Black bars"),
        s.value
            .apply_to(format!("{} px", columns.border.border_height))
    );
    let filled = columns.colors.len();
    let width = config.output_width as usize;
    if filled < width {
        println!(
            "    {:<14}{} {}",
            s.label.apply_to("Columns"),
            s.value.apply_to(format!("{filled}/{width}")),
            s.warning.apply_to("(rest left black)")
        );
    } else {
        println!(
            "    {:<14}{}",
            s.label.apply_to("Columns"),
            s.value.apply_to(format!("{filled}/{width}"))
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Timing"));
    for stage in &summary.profile.stages {
        println!(
            "    {:<22}{} {}",
            s.label.apply_to(stage.name),
            s.value.apply_to(format!("{:>6}x", stage.calls)),
            s.label.apply_to(format!(
                "max {:.3}s  avg {:.3}s",
                stage.max.as_secs_f64(),
                stage.average().as_secs_f64()
            ))
        );
    }
    println!(
        "    {:<22}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format_hms(summary.profile.elapsed))
    );
    println!();
    println!(
        "  Saved to {}",
        s.path.apply_to(config.output.display())
    );
}

fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(3725)), "01:02:05");
    }
}
