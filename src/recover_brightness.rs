use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use synth2yolo::{classify, discover_batches, write_brightness_map, BrightnessArgs, PrepResult};

fn run(args: &BrightnessArgs) -> PrepResult<()> {
    let batches = discover_batches(&args.root, &args.batch_layout())?;
    info!("Found {} batch folders.", batches.len());

    let report = classify(&batches, &args.sampling())?;
    report.print_summary();

    write_brightness_map(&args.output, &report.value_map())?;
    info!("Brightness map saved to {}", args.output.display());
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = BrightnessArgs::parse();

    info!("Analysing sequence brightness...");
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Brightness recovery failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
