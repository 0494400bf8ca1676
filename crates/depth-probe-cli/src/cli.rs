// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface and config resolution.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use depth_probe_core::{DepthEncoding, ProbeConfig, DEFAULT_JITTER_SEED};

#[derive(Parser, Debug)]
#[command(
    name = "depth-probe",
    author,
    version,
    about = "Measure the smallest resolvable depth gap per distance for a depth encoding"
)]
pub struct Cli {
    /// Depth encoding: perspective, logfn or logcf
    #[arg(long = "depth-type", value_name = "TYPE")]
    pub depth_type: Option<DepthEncoding>,
    /// Near clip distance
    #[arg(long, allow_negative_numbers = true)]
    pub near: Option<f32>,
    /// Far clip distance
    #[arg(long, allow_negative_numbers = true)]
    pub far: Option<f32>,
    /// Compression parameter C of the logcf encoding
    #[arg(short = 'c', long = "param-c", allow_negative_numbers = true)]
    pub param_c: Option<f32>,
    /// Number of sample points N (N - 1 distances are probed)
    #[arg(long = "num-points")]
    pub num_points: Option<u32>,
    /// Jittered, order-reversed trials per candidate gap
    #[arg(long = "num-perturbed-samples")]
    pub num_perturbed_samples: Option<u32>,

    /// Oracle that answers the depth tests
    #[arg(long, value_enum, default_value_t = Backend::Gpu)]
    pub backend: Backend,
    /// Seed for the gap jitter
    #[arg(long, default_value_t = DEFAULT_JITTER_SEED)]
    pub seed: u64,
    /// Report layout
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start from a saved preset; explicit flags override its fields
    #[arg(long)]
    pub preset: Option<String>,
    /// Save the resolved configuration under this name before running
    #[arg(long = "save-preset", value_name = "NAME")]
    pub save_preset: Option<String>,
    /// Print the saved preset names and exit
    #[arg(long = "list-presets")]
    pub list_presets: bool,
    /// Preset directory (defaults to the platform config dir)
    #[arg(long = "preset-dir", value_name = "DIR")]
    pub preset_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// wgpu on the default adapter
    Gpu,
    /// CPU reference rasterizer
    Soft,
}

impl Backend {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Soft => "soft",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Tab-separated lines, streamed per probe
    Text,
    /// One JSON document
    Json,
    /// Box-drawn table
    Table,
}

fn missing(flag: &str) -> clap::Error {
    Cli::command().error(
        ErrorKind::MissingRequiredArgument,
        format!("{flag} is required (or pass --preset)"),
    )
}

impl Cli {
    /// Default tracing directive for the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    /// Merge explicit flags over `preset` and validate the result.
    pub fn resolve_config(&self, preset: Option<ProbeConfig>) -> Result<ProbeConfig, clap::Error> {
        let config = ProbeConfig {
            encoding: self
                .depth_type
                .or(preset.map(|p| p.encoding))
                .ok_or_else(|| missing("--depth-type"))?,
            near: self
                .near
                .or(preset.map(|p| p.near))
                .ok_or_else(|| missing("--near"))?,
            far: self
                .far
                .or(preset.map(|p| p.far))
                .ok_or_else(|| missing("--far"))?,
            param_c: self
                .param_c
                .or(preset.map(|p| p.param_c))
                .ok_or_else(|| missing("--param-c"))?,
            num_sample_points: self
                .num_points
                .or(preset.map(|p| p.num_sample_points))
                .ok_or_else(|| missing("--num-points"))?,
            num_perturbed_trials: self
                .num_perturbed_samples
                .or(preset.map(|p| p.num_perturbed_trials))
                .ok_or_else(|| missing("--num-perturbed-samples"))?,
        };
        if config.param_c == 0.0 {
            return Err(Cli::command().error(
                ErrorKind::ValueValidation,
                "--param-c must be non-zero",
            ));
        }
        config
            .validate()
            .map_err(|e| Cli::command().error(ErrorKind::ValueValidation, e))?;
        Ok(config)
    }
}
