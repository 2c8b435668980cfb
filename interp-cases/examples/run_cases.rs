use anyhow::Result;
use clap::Parser;
use interp::TypedTensor;
use interp_cases::{RunConfig, all_cases, case_tensors, compare_outputs, run_case};
use std::collections::HashMap;

#[derive(Parser, Debug)]
#[command(name = "run-cases")]
#[command(about = "Check nearest-neighbor resize cases against the reference oracle")]
struct Args {
    /// Only run the cases whose name contains this string
    #[arg(short, long)]
    filter: Option<String>,

    /// Seed for the random inputs
    #[arg(short, long, default_value_t = 299792458)]
    seed: u64,

    #[arg(long, default_value_t = 0.)]
    rtol: f64,

    #[arg(long, default_value_t = 0.)]
    atol: f64,

    /// Write the inputs and oracle outputs to a safetensors file, as `<case>.x` and `<case>.out`
    #[arg(long)]
    dump: Option<std::path::PathBuf>,

    /// Check the `<case>.out` tensors of a safetensors file against the oracle, using the
    /// `<case>.x` inputs when present
    #[arg(long)]
    compare: Option<std::path::PathBuf>,

    #[arg(long)]
    chrome_tracing: bool,
}

fn init_tracing(chrome_tracing: bool) -> Option<tracing_chrome::FlushGuard> {
    use tracing_subscriber::prelude::*;

    if chrome_tracing {
        let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new().build();
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::Layer::new().with_target(false))
            .with(chrome_layer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::Layer::new().with_target(false))
            .init();
        None
    }
}

fn compare(path: &std::path::Path, config: &RunConfig) -> Result<()> {
    let tensors = interp::safetensors::load_from_file(path)?;
    let mut checked = 0;
    for case in all_cases().iter().filter(|c| config.selects(c)) {
        let Some(outputs) = tensors.get(&format!("{}.out", case.name)) else {
            tracing::warn!(case = case.name, "no engine output, skipping");
            continue;
        };
        let outputs = outputs.to_dtype::<f32>()?;
        let xs = match tensors.get(&format!("{}.x", case.name)) {
            Some(xs) => xs.to_dtype::<f32>()?,
            None => case_tensors(case, config)?.0,
        };
        let diff = compare_outputs(case, &xs, &outputs, config)?;
        tracing::info!(case = case.name, diff, "engine output matches");
        checked += 1;
    }
    println!("{checked} engine outputs match the oracle");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(args.chrome_tracing);
    tracing::info!(num_threads = interp::get_num_threads(), "starting");

    let config =
        RunConfig { seed: args.seed, rtol: args.rtol, atol: args.atol, filter: args.filter };
    if let Some(path) = args.compare.as_deref() {
        return compare(path, &config);
    }

    let start = std::time::Instant::now();
    let mut dumped = HashMap::new();
    let mut count = 0;
    for case in all_cases().iter().filter(|c| config.selects(c)) {
        let report = run_case(case, &config)?;
        println!(
            "{:<24} {:?} -> {:?} cross-checked: {}",
            report.name, report.input_shape, report.output_shape, report.cross_checked
        );
        if args.dump.is_some() {
            let (xs, ys) = case_tensors(case, &config)?;
            dumped.insert(format!("{}.x", case.name), TypedTensor::F32(xs));
            dumped.insert(format!("{}.out", case.name), TypedTensor::F32(ys));
        }
        count += 1;
    }
    if count == 0 {
        anyhow::bail!("no case matches the filter {:?}", config.filter)
    }
    if let Some(path) = args.dump.as_deref() {
        interp::safetensors::save(&dumped, path)?;
        println!("wrote {} tensors to {}", dumped.len(), path.display());
    }
    println!("{count} cases passed in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}
