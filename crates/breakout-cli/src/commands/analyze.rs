use super::{load_optional_config, today, AnalyzeArgs};
use crate::output::{print_summary, render_table};
use breakout_application::analysis::{analyze_breakouts, BreakoutAnalysis};
use breakout_application::meta::{engine_name, engine_version};
use breakout_application::reporting::{export_results, ExportResult};
use breakout_application::shared::{resolve_request, RequestOverrides};
use breakout_domain::value_objects::bar::format_timestamp_date;
use breakout_infrastructure::reporting::{breakout_headers, format_breakout_row};

pub(super) fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let config = load_optional_config(args.config.as_ref())?;
    let today = today();
    let overrides = RequestOverrides {
        symbol: args.symbol.clone(),
        start: args.start,
        end: args.end,
        volume_threshold_pct: args.volume_threshold,
        price_change_threshold_pct: args.price_threshold,
        holding_period: args.holding_period,
    };
    let request = resolve_request(&config, &overrides, today)?;

    let source = match &args.csv {
        Some(path) => format!("csv:{}", path.display()),
        None => config.data.source.label().to_string(),
    };
    let market_data =
        crate::infra::build_market_data_repo(&config, args.csv.as_deref(), args.refresh)?;
    let analysis = analyze_breakouts(&request, market_data.as_ref(), today)?;

    let export = match (&args.out, analysis.has_breakouts()) {
        (Some(out_dir), true) => {
            let deps = crate::infra::build_reporting_deps();
            Some(export_results(
                &analysis,
                out_dir,
                deps.writer.as_ref(),
                config.output.summary_json,
            )?)
        }
        _ => None,
    };

    if args.json {
        println!("{}", analysis_json(&analysis, export.as_ref()));
        return Ok(());
    }

    println!(
        "{} cli: analyze (symbol={}, start={}, end={}, volume_threshold={}%, price_threshold={}%, holding_period={}, source={})",
        engine_name(),
        analysis.symbol,
        analysis.range.start,
        analysis.range.end,
        analysis.params.volume_threshold_pct,
        analysis.params.price_change_threshold_pct,
        analysis.params.holding_period,
        source
    );
    println!(
        "sessions: {}, flagged: {}, data quality: {}",
        analysis.sessions(),
        analysis.flagged_sessions(),
        if analysis.data_quality.is_clean() {
            "clean".to_string()
        } else {
            format!(
                "duplicates={} out_of_order={} invalid_close={}",
                analysis.data_quality.duplicates,
                analysis.data_quality.out_of_order,
                analysis.data_quality.invalid_close
            )
        }
    );

    let Some(summary) = &analysis.summary else {
        println!("{}", analysis.no_breakouts_message());
        return Ok(());
    };

    println!();
    print_summary(summary, analysis.params.holding_period);
    println!();

    let rows: Vec<_> = analysis.events.iter().map(format_breakout_row).collect();
    print!("{}", render_table(&breakout_headers(&analysis.params), &rows));

    if let Some(export) = &export {
        println!();
        println!("exported: {}", export.csv_path.display());
        if let Some(path) = &export.summary_path {
            println!("summary: {}", path.display());
        }
    }
    Ok(())
}

fn analysis_json(analysis: &BreakoutAnalysis, export: Option<&ExportResult>) -> serde_json::Value {
    let breakouts: Vec<serde_json::Value> = analysis
        .events
        .iter()
        .map(|event| {
            serde_json::json!({
                "date": format_timestamp_date(event.timestamp),
                "volume": event.volume,
                "avg_volume": event.avg_volume,
                "volume_pct_above_avg": event.volume_pct_above_avg,
                "price_change_pct": event.price_change_pct,
                "entry_price": event.entry_price,
                "exit_price": event.exit_price,
                "holding_return_pct": event.holding_return_pct,
            })
        })
        .collect();

    serde_json::json!({
        "engine": { "name": engine_name(), "version": engine_version() },
        "symbol": analysis.symbol,
        "start": analysis.range.start.to_string(),
        "end": analysis.range.end.to_string(),
        "params": analysis.params,
        "sessions": analysis.sessions(),
        "flagged_sessions": analysis.flagged_sessions(),
        "data_quality": analysis.data_quality,
        "summary": analysis.summary,
        "message": (!analysis.has_breakouts()).then(|| analysis.no_breakouts_message()),
        "breakouts": breakouts,
        "export": export.map(|e| e.csv_path.display().to_string()),
    })
}
