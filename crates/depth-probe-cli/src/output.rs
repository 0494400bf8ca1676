// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Report rendering for the three output formats.

use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use depth_probe_core::report::format_line;
use depth_probe_core::{ProbeConfig, ProbeResult, RunReport};

use crate::cli::Format;

/// Writes the report; the text format streams probe lines as they arrive.
pub struct ReportSink<W: Write> {
    out: W,
    format: Format,
    deferred_error: Option<io::Error>,
}

impl<W: Write> ReportSink<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self {
            out,
            format,
            deferred_error: None,
        }
    }

    pub fn begin(&mut self, config: &ProbeConfig) -> io::Result<()> {
        if self.format == Format::Text {
            RunReport::write_banner(config, &mut self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    /// Per-probe observer. Errors are held until [`ReportSink::finish`].
    pub fn probe(&mut self, index: usize, result: &ProbeResult) {
        if self.format != Format::Text || self.deferred_error.is_some() {
            return;
        }
        let written = writeln!(self.out, "{}", format_line(index, result))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            self.deferred_error = Some(err);
        }
    }

    pub fn finish(mut self, report: &RunReport) -> anyhow::Result<()> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err.into());
        }
        match self.format {
            Format::Text => writeln!(
                self.out,
                "Test finished in {} seconds.",
                report.elapsed_secs
            )?,
            Format::Json => report.write_json(&mut self.out)?,
            Format::Table => writeln!(self.out, "{}", table(report))?,
        }
        self.out.flush()?;
        Ok(())
    }
}

fn table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "sample distance", "resolved gap", "gap / distance"]);
    for (i, r) in report.results.iter().enumerate() {
        let ratio = if r.out_of_range {
            "out of range".to_owned()
        } else {
            format!("{:.3e}", r.resolved_gap / r.sample_distance)
        };
        table.add_row(vec![
            Cell::new(i).set_alignment(CellAlignment::Right),
            Cell::new(r.sample_distance).set_alignment(CellAlignment::Right),
            Cell::new(r.resolved_gap).set_alignment(CellAlignment::Right),
            Cell::new(ratio).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
