mod cli;
mod downloader;
mod manifest;
mod mirror;
mod progress;
mod utils;

use std::process::ExitCode;

use downloader::Downloader;
use progress::ProgressTracker;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let args = cli::parse_args();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let manifest = args.manifest();

    if args.list {
        for doc in manifest.documents {
            match mirror::destination_path(&manifest.output_dir, doc) {
                Ok(dest) => println!(
                    "{} -> {}",
                    mirror::source_url(&manifest.base_url, doc),
                    dest.display()
                ),
                Err(e) => println!("{e}"),
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "\nDownloading ACP documentation to {}/\n",
        manifest.output_dir.display()
    );
    println!("Total files: {}", manifest.len());
    println!("Start time: {}\n", utils::get_current_time());

    let downloader = Downloader::new(manifest.clone(), args.request_timeout())?
        .with_progress(ProgressTracker::new(manifest.len() as u64));
    let summary = downloader.download_all().await;

    print!("{}", summary.render(&manifest.output_dir));
    println!("Finished at {}", utils::get_current_time());

    Ok(ExitCode::from(summary.exit_status()))
}
