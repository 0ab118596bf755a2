use crate::output::print_summary;
use breakout_application::meta::engine_name;
use std::path::PathBuf;

pub(super) fn run_report(input: PathBuf, json: bool) -> Result<(), String> {
    let deps = crate::infra::build_reporting_deps();
    let result =
        breakout_application::reporting::summarize_export(input.as_path(), deps.reader.as_ref())?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "input": result.path.display().to_string(),
                "holding_period": result.holding_period,
                "volume_window": result.volume_window,
                "summary": result.summary,
            })
        );
        return Ok(());
    }

    println!(
        "{} cli: report (input={}, holding_period={}, volume_window={})",
        engine_name(),
        result.path.display(),
        result.holding_period,
        result.volume_window
    );
    match &result.summary {
        Some(summary) => print_summary(summary, result.holding_period),
        None => println!("Total Breakouts: 0"),
    }
    Ok(())
}
