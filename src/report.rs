//! Plain terminal rendering for the `detect` and `parse-ua` commands.

use colored::*;

use crate::detect::{DetectionResult, Meter, Status};

const METER_WIDTH: usize = 24;
const LABEL_WIDTH: usize = 16;

/// Short badge text for a status.
pub fn status_label(status: &Status) -> &'static str {
    match status {
        Status::Pending => "DETECTING",
        Status::Ready => "OK",
        Status::Warning(_) => "PARTIAL",
        Status::Unknown => "UNKNOWN",
        Status::Error(_) => "ERROR",
    }
}

fn status_badge(status: &Status) -> ColoredString {
    let label = status_label(status);
    match status {
        Status::Pending => label.bright_cyan(),
        Status::Ready => label.bright_green(),
        Status::Warning(_) | Status::Unknown => label.bright_yellow(),
        Status::Error(_) => label.bright_red(),
    }
}

/// `████████░░░░` scaled to `width` cells.
pub fn meter_bar(percent: u8, width: usize) -> String {
    let filled = (width * usize::from(percent.min(100)) + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_meter(meter: &Meter) -> String {
    let color = match meter.percent {
        70..=100 => Color::BrightGreen,
        40..=69 => Color::BrightCyan,
        _ => Color::BrightYellow,
    };
    format!(
        "  {:<LABEL_WIDTH$} {} {}",
        format!("{}:", meter.label).bright_cyan(),
        meter_bar(meter.percent, METER_WIDTH).color(color),
        format!("{:>3}%", meter.percent).bright_white()
    )
}

/// One card as a block of lines.
pub fn render(report: &DetectionResult) -> String {
    let mut lines = vec![format!(
        "{}  [{}]",
        report.title.to_uppercase().bright_white().bold(),
        status_badge(&report.status)
    )];

    for field in &report.fields {
        lines.push(format!(
            "  {:<LABEL_WIDTH$} {}",
            format!("{}:", field.label).bright_cyan(),
            field.value
        ));
    }
    if let Some(meter) = &report.meter {
        lines.push(render_meter(meter));
    }
    if let Some(details) = &report.details {
        for field in details {
            lines.push(format!(
                "    {} {}",
                format!("{}:", field.label).bright_black(),
                field.value
            ));
        }
    }
    match &report.status {
        Status::Warning(message) => lines.push(format!("  {}", message.bright_yellow())),
        Status::Error(message) => lines.push(format!("  {}", message.bright_red())),
        _ => {}
    }
    lines.join("\n")
}

pub fn print_reports(reports: &[DetectionResult]) {
    println!("{}\n", "Device Inspector".bright_cyan().bold());
    for report in reports {
        println!("{}\n", render(report));
    }
}
