use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;

use synth2yolo::{
    discover_batches, process_dataset, remap_dataset, Args, CategoryRemap, PrepResult,
};

fn run(args: &Args) -> PrepResult<()> {
    let batches = discover_batches(&args.root, &args.batch_layout())?;
    info!("Found {} batch folders.", batches.len());

    let mut manifest = process_dataset(&batches, &args.build_options())?;

    if args.remap_categories {
        manifest = remap_dataset(&manifest)?;
    } else if !CategoryRemap::contiguous(&manifest.categories).is_identity() {
        warn!(
            "Category ids {:?} are not 0..{}; trainers indexing classes by id need --remap_categories",
            manifest.categories.keys().collect::<Vec<_>>(),
            manifest.class_count()
        );
    }

    info!("{} classes: {:?}", manifest.class_count(), manifest.class_names());
    Ok(())
}

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.root.exists() {
        error!("The specified root does not exist: {}", args.root.display());
        return ExitCode::FAILURE;
    }

    info!("Starting the conversion process...");
    match run(&args) {
        Ok(()) => {
            info!("Conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to build dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
