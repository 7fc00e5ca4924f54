use anyhow::Result;
use clap::Parser;
use sb3_flowchart::cli::Args;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    sb3_flowchart::run_cli(&args)
}
