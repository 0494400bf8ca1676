// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Run reports: the tab-separated text log, its parser, and the JSON document.
//!
//! The text form is line oriented so partial runs stay readable:
//!
//! ```text
//! Testing Log depth ((log(-z)-log(n)) / (log(f)-log(n)) type).
//! Parameters:
//!     near: 1
//!     ...
//! sample point [0]:	1.7782794	0.00012207031
//! sample point [1]:	3.1622777	0.00024414062
//! Test finished in 4.2 seconds.
//! ```
//!
//! Only lines starting with [`LINE_PREFIX`] carry data; everything else is
//! ignored by [`parse_text`].

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::ProbeResult;
use crate::config::ProbeConfig;

/// Marker at the start of every data line.
pub const LINE_PREFIX: &str = "sample point";

/// Error type for report encoding and decoding.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error while reading or writing a report.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// JSON encoding/decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A data line did not carry a distance and a gap.
    #[error("malformed sample line {line}: {reason}")]
    Malformed {
        /// 1-based line number in the input.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// One data line read back from a text report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParsedSample {
    /// Distance field.
    pub sample_distance: f32,
    /// Gap field.
    pub resolved_gap: f32,
}

/// Format one probe as a data line (no trailing newline).
pub fn format_line(index: usize, result: &ProbeResult) -> String {
    format!(
        "{LINE_PREFIX} [{index}]:\t{}\t{}",
        result.sample_distance, result.resolved_gap
    )
}

/// Read every data line from `reader`, in order.
pub fn parse_text<R: BufRead>(reader: R) -> Result<Vec<ParsedSample>, ReportError> {
    let mut samples = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.starts_with(LINE_PREFIX) {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let (Some(distance), Some(gap)) = (fields.get(1), fields.get(2)) else {
            return Err(ReportError::Malformed {
                line: i + 1,
                reason: format!("expected 3 tab-separated fields, found {}", fields.len()),
            });
        };
        let parse = |field: &str, what: &str| {
            field
                .trim()
                .parse::<f32>()
                .map_err(|err| ReportError::Malformed {
                    line: i + 1,
                    reason: format!("bad {what} `{}`: {err}", field.trim()),
                })
        };
        samples.push(ParsedSample {
            sample_distance: parse(distance, "distance")?,
            resolved_gap: parse(gap, "gap")?,
        });
    }
    Ok(samples)
}

/// Complete record of one run, as written by `--format json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Parameters of the run.
    pub config: ProbeConfig,
    /// Oracle backend that answered the depth tests.
    pub backend: String,
    /// Seed of the jitter stream.
    pub seed: u64,
    /// One entry per sample distance, in distance order.
    pub results: Vec<ProbeResult>,
    /// Wall-clock duration of the batch.
    pub elapsed_secs: f64,
}

impl RunReport {
    /// Parameter banner printed ahead of the data lines.
    pub fn write_banner<W: Write>(config: &ProbeConfig, out: &mut W) -> io::Result<()> {
        writeln!(out, "Testing {}.", config.encoding.describe())?;
        writeln!(out, "Parameters:")?;
        writeln!(out, "    near: {}", config.near)?;
        writeln!(out, "    far: {}", config.far)?;
        writeln!(out, "    param C: {}", config.param_c)?;
        writeln!(out, "    test points: {}", config.num_sample_points)?;
        writeln!(
            out,
            "    num_perturbed_samples: {}",
            config.num_perturbed_trials
        )
    }

    /// Whole report in the text form.
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        Self::write_banner(&self.config, out)?;
        for (index, result) in self.results.iter().enumerate() {
            writeln!(out, "{}", format_line(index, result))?;
        }
        writeln!(out, "Test finished in {} seconds.", self.elapsed_secs)
    }

    /// Whole report as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }

    /// Decode a JSON report.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ReportError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
