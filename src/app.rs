//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main. It:
//! - loads the runtime environment and installs logging
//! - parses CLI arguments
//! - runs the requested workflow
//! - prints reports to stdout

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, CompareArgs, Command, ConfigArgs, GenerationArgs, InferArgs, PresetArgs, VisualizeArgs};
use crate::error::AppError;
use crate::io::read_config_json;
use crate::prior::Prior;

pub mod env;
pub mod pipeline;

pub use env::RuntimeEnv;

/// Entry point for the `archeo` binary.
pub fn run() -> Result<(), AppError> {
    let env = RuntimeEnv::from_env()?;
    init_logging(&env);

    let cli = Cli::parse();
    match cli.command {
        Command::GeneratePresetPrior(args) => handle_preset(args, &env),
        Command::GeneratePrior(args) => handle_config(args, &env),
        Command::VisualizePrior(args) => handle_visualize(args),
        Command::InferPosterior(args) => handle_infer(args),
        Command::ComparePriors(args) => handle_compare(args),
        Command::ListPresets => {
            print!("{}", crate::report::format_presets()?);
            Ok(())
        }
    }
}

fn init_logging(env: &RuntimeEnv) {
    let filter = EnvFilter::try_new(&env.log).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    // Fails only when a global subscriber already exists (tests, embedding).
    if let Err(err) = installed {
        tracing::debug!(%err, "keeping the existing tracing subscriber");
    }
}

/// Merge generation flags with the runtime environment; flags win.
pub fn generation_options(args: &GenerationArgs, env: &RuntimeEnv) -> pipeline::GenerationOptions {
    pipeline::GenerationOptions {
        output_dir: args.output_dir.clone(),
        format: args.format,
        seed: args.seed.unwrap_or(env.seed),
        n_samples: args.n_samples,
        workers: args.workers.or(env.max_workers),
    }
}

fn handle_preset(args: PresetArgs, env: &RuntimeEnv) -> Result<(), AppError> {
    let opts = generation_options(&args.generation, env);
    let config = args.preset.config()?;
    let out = pipeline::generate_and_save(args.preset.name(), config, &opts)?;
    print_generation(&out);
    Ok(())
}

fn handle_config(args: ConfigArgs, env: &RuntimeEnv) -> Result<(), AppError> {
    let opts = generation_options(&args.generation, env);
    let config = read_config_json(&args.config)?;
    let label = pipeline::label_for_config(&args.config, args.label.as_deref());
    let out = pipeline::generate_and_save(&label, config, &opts)?;
    print_generation(&out);
    Ok(())
}

fn print_generation(out: &pipeline::GenerationOutput) {
    println!("{}", crate::report::format_prior_summary(&out.prior));
    println!("Wrote {}", out.config_path.display());
    println!("Wrote {}", out.prior_path.display());
}

fn handle_visualize(args: VisualizeArgs) -> Result<(), AppError> {
    let prior = Prior::load(&args.file, args.format)?;
    let mut text = crate::report::format_prior_summary(&prior);
    text.push('\n');
    text.push_str(&crate::report::format_prior_plots(&prior, args.width, args.height));

    print!("{text}");
    if let Some(dir) = &args.output_dir {
        let path = pipeline::save_summary(dir, &args.file, &text)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_infer(args: InferArgs) -> Result<(), AppError> {
    let mass_column = args.mass_column();
    let spin_column = args.spin_column();
    let req = pipeline::InferenceRequest {
        prior: &args.prior,
        observed: &args.observed,
        observed_format: args.observed_format,
        component: args.component,
        mass_column: &mass_column,
        spin_column: &spin_column,
        mass_tolerance: args.mass_tolerance,
        spin_tolerance: args.spin_tolerance,
        match_mode: args.match_mode,
        output: &args.output,
        format: args.format,
    };
    let posterior = pipeline::infer_and_save(&req)?;
    println!("{}", crate::report::format_posterior_summary(&posterior));
    println!("Wrote {}", args.output.display());
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let columns = args.columns()?;
    let comparison = pipeline::compare_priors(&pipeline::ComparisonRequest {
        prior: &args.prior,
        candidate: &args.candidate,
        posterior: &args.posterior,
        columns: &columns,
        bins: args.bins,
    })?;
    print!("{}", crate::report::format_prior_comparison(&comparison));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::TableFormat;
    use std::path::PathBuf;

    fn args(seed: Option<u64>, workers: Option<usize>) -> GenerationArgs {
        GenerationArgs {
            output_dir: PathBuf::from("out"),
            format: TableFormat::Json,
            seed,
            n_samples: None,
            workers,
        }
    }

    #[test]
    fn logging_can_be_initialised_twice() {
        let env = RuntimeEnv::default();
        init_logging(&env);
        init_logging(&env);
        tracing::info!("still logging");
    }

    #[test]
    fn flags_override_environment() {
        let env = RuntimeEnv {
            max_workers: Some(3),
            seed: 99,
            log: "info".to_string(),
        };
        let opts = generation_options(&args(Some(5), Some(8)), &env);
        assert_eq!((opts.seed, opts.workers), (5, Some(8)));

        let opts = generation_options(&args(None, None), &env);
        assert_eq!((opts.seed, opts.workers), (99, Some(3)));
        assert_eq!(opts.format, TableFormat::Json);
    }
}
