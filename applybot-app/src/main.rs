use anyhow::Result;
use applybot_common::observability::init_logging;
use applybot_config::{AppConfig, ConfigLoader};
use applybot_runtime::ApplyRuntime;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
mod wiring;

/// Search job boards and complete quick-apply applications.
#[derive(Parser, Debug)]
#[command(name = "applybot", version, about)]
struct Cli {
    /// Configuration file (YAML). `APPLYBOT__*` environment variables override it.
    #[arg(short, long, env = "APPLYBOT_CONFIG", default_value = "applybot.yaml")]
    config: PathBuf,

    /// Forget every processed job id before starting.
    #[arg(long)]
    reset_cache: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: AppConfig = ConfigLoader::new().with_file(&cli.config).load()?;

    // 2) Logging as configured
    let log_path = init_logging(cfg.logging.to_log_config())?;
    tracing::info!(
        config = %cli.config.display(),
        log = %log_path.display(),
        "applybot starting"
    );

    let runtime = ApplyRuntime::build("applybot")?;
    let _ctrl_c = runtime.stop_on_ctrl_c();
    let stop = runtime.stop_token();
    let result = runtime.block_on(wiring::run(cfg, cli.reset_cache, stop));
    runtime.shutdown(Duration::from_secs(1));

    let summary = result?;
    println!("{summary}");
    Ok(())
}
