use super::{load_optional_config, CacheAction};
use std::path::PathBuf;

pub(super) fn run_cache(
    action: CacheAction,
    config_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
) -> Result<(), String> {
    let config = load_optional_config(config_path.as_ref())?;
    let cache = crate::infra::build_series_cache(&config, cache_dir);

    match action {
        CacheAction::List => {
            let entries = cache.list_entries()?;
            if entries.is_empty() {
                println!("no cached series in {}", cache.dir().display());
                return Ok(());
            }
            for entry in &entries {
                let age = entry
                    .age
                    .map(|age| format!("{}h", age.as_secs() / 3600))
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{}  {} bytes  age {}",
                    entry.path.display(),
                    entry.size_bytes,
                    age
                );
            }
            println!("{} cached series in {}", entries.len(), cache.dir().display());
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("removed {} cached series from {}", removed, cache.dir().display());
        }
    }
    Ok(())
}
