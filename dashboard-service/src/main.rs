use anyhow::{bail, Result};
use asset_client::domain::Severity;
use dashboard_service::{
    config::AppConfig, metrics_server, observability, AppState, Dashboard, LoadStatus,
};
use std::{env, time::Duration};

fn report(dashboard: &Dashboard) {
    let prefs = dashboard.state().preferences();
    let stats = dashboard.stats();
    tracing::info!(
        source = prefs.data_source.as_str(),
        total = stats.total,
        critical = stats.critical,
        regions = stats.regions,
        avg_voltage = ?stats.avg_voltage,
        "summary"
    );

    let table = dashboard.table();
    tracing::info!(
        search = %prefs.search_term,
        region = %prefs.region_filter,
        health = %prefs.health_filter,
        regions = ?table.regions,
        health_statuses = ?table.health_statuses,
        "showing {} of {} transformers",
        table.shown(),
        table.total
    );
    for record in &table.rows {
        tracing::info!(
            asset_id = record.asset_id,
            name = %record.name,
            region = %record.region,
            health = %record.health,
            status = ?record.health_status(),
            badge = ?Severity::for_health(&record.health),
            "transformer"
        );
    }

    let chart = dashboard.chart();
    let visible: Vec<&str> = chart.visible_series().map(|s| s.name.as_str()).collect();
    tracing::info!(
        points = chart.rows.len(),
        first = chart.rows.first().map(|r| r.label.as_str()),
        last = chart.rows.last().map(|r| r.label.as_str()),
        selection = ?dashboard.selection_state(),
        eligible = dashboard.eligible().len(),
        ?visible,
        "voltage chart"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let mut watch = false;
    let mut upload = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--watch" => watch = true,
            _ if upload.is_none() && !arg.starts_with("--") => upload = Some(arg),
            _ => bail!("usage: dashboard [--watch] [upload.json]"),
        }
    }

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let store = cfg.storage.open_store();
    let mut dashboard = Dashboard::new(AppState::open(store), &cfg.sample.path);

    let status = match &upload {
        Some(path) => dashboard.load_upload(path).await.clone(),
        None => dashboard.bootstrap().await.clone(),
    };

    match &status {
        LoadStatus::Error(msg) => tracing::error!(error = %msg, "data load failed"),
        LoadStatus::Idle => tracing::info!("no data loaded; pass an uploaded .json file"),
        _ => {}
    }

    report(&dashboard);

    if watch {
        let interval = Duration::from_millis(cfg.storage.poll_interval_ms.max(50));
        tracing::info!(?interval, "watching stored preferences");
        loop {
            tokio::time::sleep(interval).await;
            // In-process broadcasts first, then writes from other processes.
            if dashboard.sync() | dashboard.refresh() {
                report(&dashboard);
            }
        }
    }

    Ok(())
}
