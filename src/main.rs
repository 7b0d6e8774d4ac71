//! CLI entry point for arxiv-latex.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use arxiv_latex_core::{
    HttpFetcher, Pipeline, PipelineError, ResolveOptions, parse_reference,
};
use clap::Parser;
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{LoadedConfig, load_default_file_config, merge_settings, resolve_default_log_level};
use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = match load_default_file_config() {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("Error: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = resolve_default_log_level(&args, loaded.config.as_ref());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, config = ?loaded.path, "CLI arguments parsed");

    match run(&args, loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

async fn run(args: &Args, loaded: LoadedConfig) -> Result<()> {
    // Fail fast on a bad reference before touching the network or disk.
    let id = parse_reference(&args.reference).map_err(PipelineError::from)?;

    let file_config = loaded.config.unwrap_or_default();
    let settings = merge_settings(args, &file_config)?;
    let config = settings.pipeline;

    let fetcher = HttpFetcher::with_options(
        &config.base_url,
        config.connect_timeout_secs,
        config.read_timeout_secs,
    )
    .map_err(PipelineError::from)?;
    let pipeline = Pipeline::new(config, Arc::new(fetcher))?;

    let options = ResolveOptions {
        workdir: args.workdir.clone(),
        strip_images: settings.strip_images,
        refresh: args.refresh,
    };
    let resolution = pipeline.resolve_id(id, &options).await?;

    info!(
        id = %resolution.id,
        entry = %resolution.entry_point.path.display(),
        method = resolution.entry_point.method.as_str(),
        from_cache = resolution.from_cache,
        markers = resolution.combined.stats.markers(),
        "resolution complete"
    );

    if let Some(output) = &args.output {
        tokio::fs::write(output, &resolution.combined.text)
            .await
            .with_context(|| format!("Failed to write output file '{}'", output.display()))?;
        info!(path = %output.display(), "combined source written");
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(resolution.combined.text.as_bytes())
            .context("Failed to write combined source to stdout")?;
        stdout.flush()?;
    }
    if let Some(workdir) = &resolution.workdir {
        info!(path = %workdir.display(), "extracted tree kept");
    }

    Ok(())
}

fn exit_code_for(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<PipelineError>()
        .map_or(1, |pipeline_error| pipeline_error.kind().exit_code())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use arxiv_latex_core::{FetchError, ParseError};

    #[test]
    fn test_exit_code_for_pipeline_errors() {
        let invalid = anyhow::Error::from(PipelineError::from(ParseError::empty()));
        assert_eq!(exit_code_for(&invalid), 2);

        let fetch = anyhow::Error::from(PipelineError::from(FetchError::timeout("http://x")));
        assert_eq!(exit_code_for(&fetch), 3);
    }

    #[test]
    fn test_exit_code_for_other_errors_is_one() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("disk full")), 1);
    }
}
