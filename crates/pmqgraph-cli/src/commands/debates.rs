//! `pmqgraph debates` — pull recent PMQ contributions from TheyWorkForYou

use clap::Args;
use pmqgraph_common::Result;
use pmqgraph_config::Config;
use pmqgraph_data::{TwfyClient, TwfyConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct DebatesArgs {
    /// How many months back to search
    #[arg(long, default_value_t = 12)]
    pub months: u32,

    /// Search phrase (default: the PMQ session search)
    #[arg(long)]
    pub search: Option<String>,

    /// Write results as CSV to this path instead of printing a summary
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub async fn run(config: &Config, args: DebatesArgs) -> Result<()> {
    let twfy = TwfyConfig::new(&config.twfy.base_url, &config.twfy.api_key)
        .with_timeout(config.twfy.timeout_seconds);
    let client = TwfyClient::new(twfy)?;

    let records = match &args.search {
        Some(search) => client.get_debates(search, args.months).await?,
        None => client.get_pmq_debates(args.months).await?,
    };

    info!(count = records.len(), months = args.months, "Fetched debate contributions");

    match &args.output {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)?;
            for record in &records {
                writer.serialize(record)?;
            }
            writer.flush()?;
            println!("Wrote {} contributions to {}", records.len(), path.display());
        }
        None => {
            for record in &records {
                let speaker = record.speaker_name.as_deref().unwrap_or("(procedural)");
                let preview: String = record.text.chars().take(80).collect();
                println!("{}  {}  {}", record.date, speaker, preview);
            }
            println!("{} contributions", records.len());
        }
    }
    Ok(())
}
