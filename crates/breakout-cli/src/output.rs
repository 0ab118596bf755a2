use breakout_application::reporting::summary_metrics;
use breakout_domain::services::summary::BreakoutSummary;

pub fn print_summary(summary: &BreakoutSummary, holding_period: usize) {
    for (label, value) in summary_metrics(summary, holding_period) {
        println!("{label}: {value}");
    }
}

/// Plain-text table: first column left-aligned, the rest right-aligned.
pub fn render_table<const N: usize>(headers: &[String; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = std::array::from_fn(|idx| headers[idx].chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String; N]| {
        cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(idx, (cell, width))| {
                if idx == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_row(headers));
    out.push('\n');
    let rule_len = widths.iter().sum::<usize>() + 2 * N.saturating_sub(1);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out
}
