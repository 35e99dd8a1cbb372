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
Tabla de makespans conocidos
============================

Best known makespan of each benchmark instance, read from a whitespace separated text file:

```text
20 5 1 1278
20 5 2 1359
```

The first three tokens (jobs, stages, instance id) are kept as text and form the key, the
fourth one is the makespan. Lines with a different number of tokens, or with a makespan that
isn't an integer, are skipped. A repeated key replaces the previous value.
*/

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use failure::{Error, ResultExt};
use itertools::Itertools;
use log::{debug, warn};
use serde::Serialize;

use crate::stats::{mean, median};

/// Clave de instancia: (trabajos, etapas, id)
pub type InstanceKey = (String, String, String);

/// Makespans conocidos por instancia
///
/// Best known makespan by instance key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MakespanTable {
    values: HashMap<InstanceKey, u64>,
}

impl MakespanTable {
    /// Build the table from the text of a makespan file. Never fails.
    pub fn from_text(s: &str) -> Self {
        let mut values = HashMap::new();
        for (lineno, line) in s.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() != 4 {
                if !parts.is_empty() {
                    debug!("Skipping makespan line {}: {} tokens", lineno + 1, parts.len());
                }
                continue;
            }
            match parts[3].parse::<u64>() {
                Ok(makespan) => {
                    let key = (parts[0].to_string(), parts[1].to_string(), parts[2].to_string());
                    values.insert(key, makespan);
                }
                Err(_) => warn!(
                    "Skipping makespan line {}: \"{}\" is not an integer",
                    lineno + 1,
                    parts[3]
                ),
            }
        }
        MakespanTable { values }
    }

    /// Read the table from a makespan file
    pub fn read(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .context(format!("Could not read makespan file {}", path.display()))?;
        Ok(Self::from_text(&content))
    }

    /// Best known makespan of an instance
    pub fn get(&self, jobs: &str, stages: &str, instance: &str) -> Option<u64> {
        self.values
            .get(&(jobs.to_string(), stages.to_string(), instance.to_string()))
            .cloned()
    }

    /// Best known makespan by key
    pub fn get_key(&self, key: &InstanceKey) -> Option<u64> {
        self.values.get(key).cloned()
    }

    /// Number of instances in the table
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Table without entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Summary statistics of the table
    pub fn summary(&self) -> MakespanSummary {
        let values: Vec<f64> = self.values.values().map(|&m| m as f64).collect();
        let by_jobs = self
            .values
            .iter()
            .filter_map(|((jobs, _, _), &makespan)| {
                jobs.parse::<u64>().ok().map(|j| (j, makespan as f64))
            })
            .into_group_map()
            .into_iter()
            .map(|(jobs, values)| (jobs, mean(&values).unwrap_or(0.0)))
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect();
        MakespanSummary {
            count: values.len(),
            mean: mean(&values).unwrap_or(0.0),
            median: median(&values).unwrap_or(0.0),
            mean_by_jobs: by_jobs,
        }
    }
}

/// Resumen de la tabla de makespans
///
/// Summary of the best known makespans
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MakespanSummary {
    /// Number of instances
    pub count: usize,
    /// Mean makespan
    pub mean: f64,
    /// Median makespan
    pub median: f64,
    /// Mean makespan for each number of jobs, ascending by number of jobs
    pub mean_by_jobs: Vec<(u64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TMAKESPANS: &str = "20 5 1 1278
20 5 2 1359
20 5
50 10 1 3025 extra
50 10 2 29x1

50 10 3 3000
";

    #[test]
    fn malformed_lines_are_skipped() {
        let table = MakespanTable::from_text(TMAKESPANS);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("20", "5", "1"), Some(1278));
        assert_eq!(table.get("50", "10", "3"), Some(3000));
        assert_eq!(table.get("50", "10", "1"), None);
        assert_eq!(table.get("50", "10", "2"), None);
    }

    #[test]
    fn keys_are_text() {
        let table = MakespanTable::from_text("020 5 1 10\n");
        assert_eq!(table.get("20", "5", "1"), None);
        assert_eq!(table.get("020", "5", "1"), Some(10));
    }

    #[test]
    fn repeated_key_overwrites() {
        let table = MakespanTable::from_text("2 2 1 30\n2 2 1 31\n");
        assert_eq!(table.get("2", "2", "1"), Some(31));
    }

    #[test]
    fn empty_text_gives_empty_table() {
        assert!(MakespanTable::from_text("").is_empty());
        assert!(MakespanTable::from_text("a b c\n1 2\n").is_empty());
    }

    #[test]
    fn summary() {
        let summary = MakespanTable::from_text(TMAKESPANS).summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.median, 1359.0);
        assert_eq!(summary.mean, (1278.0 + 1359.0 + 3000.0) / 3.0);
        assert_eq!(summary.mean_by_jobs, vec![(20, 1318.5), (50, 3000.0)]);
    }
}
