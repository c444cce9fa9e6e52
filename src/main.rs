use anyhow::Result;
use clap::Parser;

use qr_label_sheet::cli::Args;
use qr_label_sheet::error::stage_of;
use qr_label_sheet::job::{run_job, LabelJob};

fn run(args: &Args) -> Result<()> {
    let job = LabelJob::from_args(args)?;

    println!(
        "Generating {} labels starting from {}...",
        job.request.count,
        job.request.first_identifier()?
    );
    match &job.template {
        Some(path) => println!("Merging with template: {}", path.display()),
        None => println!("Printing on blank pages (no template)"),
    }

    let summary = run_job(&job)?;

    println!("Successfully created {}", summary.output.display());
    println!(
        "  Labels: {} through {}",
        summary.first_identifier, summary.last_identifier
    );
    println!("  Total sheets: {}", summary.sheet_count);
    if let Some(manifest) = &job.manifest {
        println!("  Manifest: {}", manifest.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Err(e) = run(&args) {
        let stage = stage_of(&e);
        match stage {
            Some(stage) => eprintln!("Error ({} stage): {}", stage, e),
            None => eprintln!("Error: {}", e),
        }
        for cause in e.chain().skip(1) {
            eprintln!("Caused by: {}", cause);
        }
        std::process::exit(stage.map_or(1, |s| s.exit_code()));
    }
}
