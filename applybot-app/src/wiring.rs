use anyhow::Result;
use applybot_common::observability::progress;
use applybot_config::AppConfig;
use applybot_drivers::BrowserSession;
use applybot_drivers::browser::driver::ApplyDriver;
use applybot_embed::ensure_embedder_ready;
use applybot_pipeline::{
    AnswerResolver, ApplicationWizard, CampaignDriver, CampaignSummary, CrawlOrchestrator,
    DedupStore, KnowledgeBase, ResultsLedger,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build every layer from `cfg` and run the campaign.
///
/// Local state and the embedding provider come up before the browser so that
/// a bad path or a missing model fails without opening a window.
pub async fn run(
    cfg: AppConfig,
    reset_cache: bool,
    stop: CancellationToken,
) -> Result<CampaignSummary> {
    // -------- local state --------
    let mut dedup = DedupStore::load(&cfg.storage.dedup_path)?;
    if reset_cache {
        dedup.reset()?;
        progress("Processed-job cache cleared");
    }
    let mut ledger = ResultsLedger::new(&cfg.storage.results_path);

    // -------- answers --------
    let embedder = ensure_embedder_ready(&cfg.embedding).await?;
    let search_country = cfg
        .campaign
        .regions
        .first()
        .map(|r| r.country.as_str())
        .unwrap_or_default();
    let knowledge = KnowledgeBase::build(&cfg.profile, &cfg.knowledge, search_country);
    if knowledge.is_empty() {
        tracing::warn!("knowledge base is empty; required questions will fail their jobs");
    }
    let resolver = Arc::new(AnswerResolver::new(knowledge, embedder));

    // -------- browser --------
    let driver = Arc::new(ApplyDriver::connect(&cfg.browser).await?);
    let session: Arc<dyn BrowserSession> = driver.clone();

    let wizard = ApplicationWizard::new(
        session.clone(),
        resolver,
        &cfg.browser,
        cfg.wizard.clone(),
        &cfg.site,
    );
    let orchestrator =
        CrawlOrchestrator::new(session, wizard, &cfg.browser, cfg.site.domain.clone(), stop);

    let outcome = CampaignDriver::new(&orchestrator, &cfg.campaign)
        .run(&mut dedup, &mut ledger)
        .await;

    drop(orchestrator);
    match Arc::try_unwrap(driver) {
        Ok(driver) => {
            if let Err(err) = driver.close().await {
                tracing::warn!(error = %err, "browser session did not close cleanly");
            }
        }
        Err(_) => tracing::warn!("browser session still referenced; leaving it open"),
    }

    Ok(outcome?)
}
