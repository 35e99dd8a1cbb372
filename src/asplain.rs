// Copyright (c) 2025  Energy aware production data authors

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/*!
Salida en formato simple
========================

Compact plain text reports of the batch runs, shown by the command line tool.
*/

use crate::makespans::MakespanSummary;
use crate::package::{AnnotateReport, Failure, TransformReport};
use crate::pv::PvScaling;
use crate::stats::{mean, median};

/// Muestra en formato simple
///
/// Plain text representation
pub trait AsPlain {
    /// Get in plain format
    fn to_plain(&self) -> String;
}

fn failures_to_plain(failures: &[Failure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let lines = failures
        .iter()
        .map(|f| format!("- {}: {}", f.path.display(), f.message))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n** Failed ({})\n{}", failures.len(), lines)
}

impl AsPlain for TransformReport {
    fn to_plain(&self) -> String {
        let written = self.written.len();
        let failed = self.failures.len();
        let failures = failures_to_plain(&self.failures);
        format!(
            "** Instance transformation

Records written: {written}
Instances failed: {failed}{failures}
",
            written = written,
            failed = failed,
            failures = failures
        )
    }
}

fn scaling_to_plain(s: &PvScaling) -> String {
    format!(
        "- {}: jobs = {}, stages = {}, machines = {}, running = {:.2}, load = {:.2}, pv = {:.3}",
        s.instance,
        s.number_of_jobs,
        s.number_of_stages,
        s.number_of_available_machines,
        s.average_running_machines,
        s.typical_load,
        s.pv_scaling_factor
    )
}

impl AsPlain for AnnotateReport {
    fn to_plain(&self) -> String {
        let factors: Vec<f64> = self.stats.iter().map(|s| s.pv_scaling_factor).collect();
        let records = self
            .stats
            .iter()
            .map(scaling_to_plain)
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "** PV scaling

Records annotated: {count}
PV scaling factor: mean = {mean:.3}, median = {median:.3}

{records}{failures}
",
            count = self.stats.len(),
            mean = mean(&factors).unwrap_or(0.0),
            median = median(&factors).unwrap_or(0.0),
            records = records,
            failures = failures_to_plain(&self.failures)
        )
    }
}

impl AsPlain for MakespanSummary {
    fn to_plain(&self) -> String {
        let by_jobs = self
            .mean_by_jobs
            .iter()
            .map(|(jobs, mean)| format!("- {}: {:.1}", jobs, mean))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "** Best known makespans

Instances: {count}
Makespan: mean = {mean:.1}, median = {median:.1}

* mean by number of jobs:
{by_jobs}
",
            count = self.count,
            mean = self.mean,
            median = self.median,
            by_jobs = by_jobs
        )
    }
}
