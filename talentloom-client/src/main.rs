//! TalentLoom demo: binds the dashboard queries against the mock services,
//! replays the demo realtime feed, and logs every change until Ctrl-C.

use talentloom_client::telemetry::init_tracing;
use talentloom_client::{ClientConfig, TalentloomClient};
use talentloom_core::PipelineStage;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = ClientConfig::load()?;
    init_tracing(config.log_format)?;

    let client = TalentloomClient::with_mock_api(config);
    let feed = client.start_realtime();

    let mut pipeline = client.pipeline();
    let _dashboard = client.dashboard();
    let _jobs = client.jobs();
    let _offers = client.offers();

    let board = pipeline.wait_for(|state| state.is_settled()).await;
    match &board.error {
        Some(err) => warn!(error = %err, "initial pipeline load failed"),
        None => info!(cards = board.data.as_ref().map_or(0, Vec::len), "pipeline loaded"),
    }

    let shortlisted = board
        .data
        .iter()
        .flatten()
        .find(|card| card.stage == PipelineStage::Shortlisted)
        .map(|card| card.id.clone());
    if let Some(id) = shortlisted {
        if let Err(err) = client
            .move_pipeline_item(&id, PipelineStage::Interview)
            .await
        {
            warn!(error = %err, item = %id, "demo move failed");
        }
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "could not listen for Ctrl-C");
                }
                break;
            }
            changed = pipeline.changed() => {
                if !changed {
                    break;
                }
                let state = pipeline.state();
                info!(
                    status = ?state.status,
                    stale = state.is_stale,
                    cards = state.data.as_ref().map_or(0, Vec::len),
                    "pipeline changed"
                );
            }
        }
    }

    if let Some(handle) = feed {
        handle.shutdown().await;
    }
    info!(
        cache = ?client.store().stats(),
        feed = ?client.feed().stats(),
        notifications = client.notifications().len(),
        "shutting down"
    );
    Ok(())
}
