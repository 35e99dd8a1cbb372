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
Trabajos y tareas
=================

- SpeedUp: accelerated processing time -> energy per unit time
- Task: one job operation on a stage
- Job: ordered list of tasks, one per stage
*/

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tabla de aceleración de una tarea
///
/// Speed-up table of a task: maps each achievable (accelerated) processing time to the
/// energy cost per unit time at that duration. Keys are integer times (string keys on the
/// wire), ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SpeedUp(pub BTreeMap<u64, u64>);

impl SpeedUp {
    /// Energy per unit time for an accelerated processing time
    pub fn get(&self, processing_time: u64) -> Option<u64> {
        self.0.get(&processing_time).cloned()
    }

    /// Insert an entry, returning the replaced energy value if the time was already there
    pub fn insert(&mut self, processing_time: u64, energy: u64) -> Option<u64> {
        self.0.insert(processing_time, energy)
    }

    /// Accelerated processing times, ascending
    pub fn times(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.keys().cloned()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Table without entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tarea
///
/// Operation of a job on one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    /// Task id, increasing across the whole instance
    pub id: usize,
    /// Stage index
    pub stage: usize,
    /// Nominal processing time at unit velocity
    pub processing_time: u64,
    /// Accelerated processing time -> energy per unit time
    pub speed_up: SpeedUp,
}

/// Trabajo
///
/// Job with its tasks in stage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    /// Job id
    pub id: usize,
    /// One task per stage
    pub tasks: Vec<Task>,
}

impl Job {
    /// Sum of the nominal processing times of the job
    pub fn total_processing_time(&self) -> u64 {
        self.tasks.iter().map(|t| t.processing_time).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn task_wire_names() {
        let mut speed_up = SpeedUp::default();
        speed_up.insert(10, 10);
        speed_up.insert(5, 8);
        let task = Task {
            id: 0,
            stage: 1,
            processing_time: 10,
            speed_up,
        };
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(
            json,
            r#"{"Id":0,"Stage":1,"ProcessingTime":10,"SpeedUp":{"5":8,"10":10}}"#
        );
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn job_total_processing_time() {
        let job = Job {
            id: 0,
            tasks: vec![
                Task { id: 0, stage: 0, processing_time: 10, speed_up: SpeedUp::default() },
                Task { id: 1, stage: 1, processing_time: 15, speed_up: SpeedUp::default() },
            ],
        };
        assert_eq!(job.total_processing_time(), 25);
    }
}
