// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! depth-probe: measure depth-buffer precision for one encoding.
//!
//! Logs go to stderr; the report goes to stdout or `--output`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use depth_probe_config_fs::FsPresetStore;
use depth_probe_core::{
    BatchDriver, DepthOracle, PresetService, ProbeConfig, ReferenceOracle, RunReport,
};
use depth_probe_gpu::GpuOracle;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;

use cli::{Backend, Cli};
use output::ReportSink;

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn preset_service(cli: &Cli) -> Result<PresetService<FsPresetStore>> {
    let store = match &cli.preset_dir {
        Some(dir) => FsPresetStore::at(dir.clone()),
        None => FsPresetStore::new(),
    }
    .context("open preset store")?;
    Ok(PresetService::new(store))
}

fn resolve(cli: &Cli) -> Result<ProbeConfig> {
    let preset = match &cli.preset {
        Some(name) => {
            let loaded = preset_service(cli)?
                .load(name)
                .with_context(|| format!("load preset `{name}`"))?;
            let Some(config) = loaded else {
                anyhow::bail!("preset `{name}` not found");
            };
            info!(preset = %name, "preset loaded");
            Some(config)
        }
        None => None,
    };
    let config = cli.resolve_config(preset).unwrap_or_else(|e| e.exit());
    if let Some(name) = &cli.save_preset {
        preset_service(cli)?
            .save(name, &config)
            .with_context(|| format!("save preset `{name}`"))?;
        info!(preset = %name, "preset saved");
    }
    Ok(config)
}

fn oracle(cli: &Cli, config: &ProbeConfig) -> Result<Box<dyn DepthOracle>> {
    Ok(match cli.backend {
        Backend::Gpu => Box::new(
            GpuOracle::new(config.encoding).context("initialise GPU oracle")?,
        ),
        Backend::Soft => Box::new(ReferenceOracle::new(config.encoding)),
    })
}

fn report_writer(cli: &Cli) -> Result<Box<dyn Write>> {
    Ok(match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    })
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_presets {
        let mut out = io::stdout().lock();
        for name in preset_service(cli)?.list().context("list presets")? {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let config = resolve(cli)?;
    let mut driver = BatchDriver::new(config, oracle(cli, &config)?, cli.seed)
        .context("invalid probe configuration")?;

    let mut sink = ReportSink::new(report_writer(cli)?, cli.format);
    sink.begin(&config)?;
    let started = Instant::now();
    let results = driver
        .run_with(|index, result| sink.probe(index, result))
        .context("depth probe aborted")?;
    let elapsed_secs = started.elapsed().as_secs_f64();
    info!(elapsed_secs, probes = results.len(), "test finished");

    sink.finish(&RunReport {
        config,
        backend: cli.backend.name().to_owned(),
        seed: cli.seed,
        results,
        elapsed_secs,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    run(&cli)
}
