use clap::Parser;

#[derive(Parser)]
#[command(name = "lsp-sample")]
#[command(version, about = "Minimal language server with diagnostics and completion")]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "debug", "lsp_sample=trace")
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(lsp_sample::lsp::server::run_server(&cli.log_level))
}
