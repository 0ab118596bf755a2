use breakout_application::meta::engine_name;
use std::path::PathBuf;

pub(super) fn run_validate(config_path: PathBuf) -> Result<(), String> {
    let config = breakout_application::config::load_config(&config_path)?;
    let report = breakout_application::validation::validate_config(&config, super::today())?;
    let pretty = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("failed to serialize validation report: {}", err))?;
    println!(
        "{} cli: validate (config={}): ok",
        engine_name(),
        config_path.display()
    );
    println!("{pretty}");
    Ok(())
}
