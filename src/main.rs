use clap::Parser;
use command_shots::{load_defaults, setup_logging, validate, CapturePipeline, Cli};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose)?;

    let defaults = load_defaults(args.config.as_deref()).await?;

    // Missing --capture or --saveto means this launch carries no capture
    // intent; exit cleanly without complaining.
    let Some(config) = validate(&args.raw_args(), &defaults) else {
        info!("No capture requested");
        return Ok(());
    };

    info!("Starting command-shots v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Target: {} | delay: {}ms | format: {:?} | quality: {} | width: {}",
        config.target_url, config.delay_ms, config.format, config.quality, config.width
    );

    match CapturePipeline::new(config).run().await {
        Ok(()) => {
            info!("Capture complete");
            Ok(())
        }
        Err(e) => {
            error!("Capture failed: {}", e);
            if e.may_leave_partial_file() {
                warn!("A partial output file may have been left in place");
            }
            std::process::exit(1);
        }
    }
}
