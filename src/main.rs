use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use antecipado_robot::{read_accounts, BatchRunner, Phase, ProgressSink, Robot, RunConfig};

#[derive(Parser, Debug)]
#[command(name = "antecipado-robot", version)]
#[command(about = "Consulta de antecipado e emissão de DAR no portal do contribuinte SEFAZ-AL")]
struct Cli {
    /// Caminho da saída (padrão: ./output ao lado do executável)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Progress sink backed by an indicatif bar:
/// ` {bar} | <empresa>: <status> | <n>/<total>`
struct BarSink {
    bar: ProgressBar,
}

impl ProgressSink for BarSink {
    fn update(&self, index: usize, total: usize, label: &str, phase: Phase) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(format!("{}: {}", label, phase));
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

/// The input list and the default output directory live next to the binary.
fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let base = base_dir();
    let input = base.join("input.csv");
    let output = cli.output.unwrap_or_else(|| base.join("output"));

    let accounts =
        read_accounts(&input).with_context(|| format!("lendo lista de contas em {:?}", input))?;

    let bar = ProgressBar::new(accounts.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        " {bar:40} | {msg} | {pos}/{len}",
    )?);

    let config = RunConfig::new(&input, &output);
    let mut robot = BatchRunner::new(config).with_progress(Box::new(BarSink { bar }));

    let summary = robot.execute(&accounts).await?;

    println!(
        "{} contas processadas ({} ok, {} com erro de autenticação, {} com falha)",
        summary.processed, summary.succeeded, summary.auth_failures, summary.errors
    );
    Ok(())
}
