use anyhow::{bail, Context, Result};
use asset_client::domain::{DataSource, PreferencesPatch};
use dashboard_service::{config::AppConfig, observability, AppState};
use std::env;

const USAGE: &str =
    "usage: dashboard_prefs <key=value>... (keys: search, region, health, select, source)";

fn parse_patch(arg: &str) -> Result<PreferencesPatch> {
    let Some((key, value)) = arg.split_once('=') else {
        bail!("expected key=value, got '{arg}'\n{USAGE}");
    };

    let patch = match key {
        "search" => PreferencesPatch::search(value),
        "region" => PreferencesPatch::region(value),
        "health" => PreferencesPatch::health(value),
        "select" => {
            let ids = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<i64>().with_context(|| format!("invalid asset id '{s}'")))
                .collect::<Result<Vec<_>>>()?;
            PreferencesPatch::selection(ids)
        }
        "source" => match value {
            "sample" => PreferencesPatch::source(DataSource::Sample),
            "uploaded" => PreferencesPatch::source(DataSource::Uploaded),
            other => bail!("unknown source '{other}'"),
        },
        other => bail!("unknown key '{other}'\n{USAGE}"),
    };
    Ok(patch)
}

fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        bail!(USAGE);
    }
    let patches = args
        .iter()
        .map(|arg| parse_patch(arg))
        .collect::<Result<Vec<_>>>()?;

    let cfg = AppConfig::load()?;
    let mut state = AppState::open(cfg.storage.open_store());
    for patch in patches {
        state.update(patch);
    }

    let prefs = state.preferences();
    tracing::info!(
        key = state.store().key(),
        search = %prefs.search_term,
        region = %prefs.region_filter,
        health = %prefs.health_filter,
        selected = ?prefs.selected_transformers,
        source = prefs.data_source.as_str(),
        "preferences stored"
    );

    Ok(())
}
