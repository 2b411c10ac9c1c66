use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flowctl_core::{Controller, Spec};

mod command;
mod session;

#[derive(Parser, Debug)]
struct Args {
    /// Bootstrap spec (JSON) loaded before the prompt appears
    #[arg(long)]
    spec: Option<PathBuf>,
    /// Seed for the best-effort path choices
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let controller = match args.seed {
        Some(seed) => Controller::with_seed(seed),
        None => Controller::new(),
    };
    let controller = match &args.spec {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            let spec: Spec = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("failed to parse {}", path.display()))?;
            spec.build(controller)?
        }
        None => controller,
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    session::Session::new(controller).run(&mut stdin.lock(), &mut stdout.lock())
}
