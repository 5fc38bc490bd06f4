use std::env;
use std::path::PathBuf;
use ten_steps_battle::{run, CliOptions};
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: ten-steps-matrix [--sims-per-cell N] [--seed SEED] [--output matrix.csv] \
[--characters id,id,...] [--catalog catalog.json] [--config config.json]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut catalog_path = None;
    let mut config_path = None;
    let mut characters = Vec::new();
    let mut sims_per_cell = 100usize;
    let mut seed = 0u64;
    let mut output_path = PathBuf::from("matrix.csv");

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sims-per-cell" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sims-per-cell requires a number"))?;
                sims_per_cell = val.parse()?;
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = val.parse()?;
            }
            "--output" => {
                output_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--output requires a path (e.g. --output matrix.csv)")
                })?;
            }
            "--characters" => {
                let val = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--characters requires a list (e.g. --characters warrior,medic)")
                })?;
                characters = val
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect();
            }
            "--catalog" => {
                catalog_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--catalog requires a path (e.g. --catalog catalog.json)")
                })?);
            }
            "--config" => {
                config_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--config requires a path (e.g. --config config.json)")
                })?);
            }
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        catalog_path,
        config_path,
        characters,
        sims_per_cell,
        seed,
        output_path,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}
