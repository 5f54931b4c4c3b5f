use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use statement_extractor::Extractor;
use statement_extractor::ExtractorConfig;
use statement_extractor::FormatDescriptor;
use statement_extractor::WorkbookSource;
use std::path::PathBuf;

/// Extracts transactions from a bank statement workbook and prints them as JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Statement format descriptor (.toml or .json)
    #[arg(short, long)]
    format: PathBuf,

    /// Account the transactions belong to
    #[arg(short, long)]
    account: String,

    /// Extractor configuration overriding the default heuristics (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Statement workbook (.xls or .xlsx)
    file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let format = FormatDescriptor::load(&cli.format)
        .with_context(|| format!("Failed to load statement format '{}'", cli.format.display()))?;
    let config = match &cli.config {
        Some(path) => ExtractorConfig::load(path)
            .with_context(|| format!("Failed to load extractor configuration '{}'", path.display()))?,
        None => ExtractorConfig::default(),
    };

    let extractor = Extractor::new(config);
    let transactions = extractor
        .extract(WorkbookSource::Path(cli.file.clone()), &format, &cli.account)
        .with_context(|| format!("Error extracting transactions from '{}'", cli.file.display()))?;
    if transactions.is_empty() {
        bail!("No transactions found in '{}'", cli.file.display());
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&transactions)?
    } else {
        serde_json::to_string(&transactions)?
    };
    println!("{json}");
    Ok(())
}
