// src/main.rs

use std::time::Instant;

use bgtask::task::handler::TaskRegistry;
use bgtask::{cli, logging, run_runner, tasks};

fn main() -> anyhow::Result<()> {
    // Anchor for the wall-clock timeout rules; must be captured before
    // anything else runs.
    let app_start = Instant::now();

    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let mut registry = TaskRegistry::new();
    tasks::register_builtin(&mut registry)?;

    std::process::exit(run_runner(args, &registry, Some(app_start)));
}
