//! docx-filler command line tool.
//!
//! Lists the templates of a library or fills one template with one item
//! of a list and stores the result as a download, an attachment of the
//! item, or a file in the template library.

use anyhow::Context;
use clap::Parser;
use docx_filler_core::TokenFiller;
use docx_filler_local::{create_backends, Command, Config, FillService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, results to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    info!("Starting docx-filler v{}", env!("CARGO_PKG_VERSION"));
    info!("  Data dir: {}", config.data_dir.display());
    info!("  Template library: {}", config.template_library);
    info!("  Target list: {}", config.target_list);
    info!("  Token style: {}", config.token_style);

    let options = config.fill_options().map_err(anyhow::Error::msg)?;
    let (records, templates, sink) = create_backends(&config.data_dir, &config.download_dir);
    let service = FillService::new(
        records,
        templates,
        sink,
        TokenFiller::new(options),
        config.service_settings(),
    );

    match &config.command {
        Command::Templates => {
            let entries = service
                .templates()
                .await
                .with_context(|| format!("Failed to list library {}", config.template_library))?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Fill { template, item } => {
            let generated = service
                .generate(template, item)
                .await
                .with_context(|| format!("Failed to fill {} with item {}", template, item))?;
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
    }

    Ok(())
}
