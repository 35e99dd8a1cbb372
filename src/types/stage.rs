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
Etapas y máquinas
=================
*/

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Máquina
///
/// Machine, identified across the whole instance and assigned to one stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Machine {
    /// Machine id, increasing across stages
    pub machine_id: usize,
    /// Stage the machine belongs to
    pub stage_number: usize,
}

/// Etapa
///
/// Stage of the flow shop. A job must finish stage k before starting stage k + 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    /// Parallel machines of the stage
    pub machines: Vec<Machine>,
}

/// Build stages from the machine count of each one, numbering machines consecutively
pub fn stages_from_machine_counts(machines_per_stage: &[usize]) -> Vec<Stage> {
    let mut machine_id = 0;
    machines_per_stage
        .iter()
        .enumerate()
        .map(|(stage_number, &count)| {
            let machines = (machine_id..machine_id + count)
                .map(|machine_id| Machine {
                    machine_id,
                    stage_number,
                })
                .collect();
            machine_id += count;
            Stage { machines }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn machine_ids_increase_across_stages() {
        let stages = stages_from_machine_counts(&[2, 1, 3]);
        let ids: Vec<(usize, usize)> = stages
            .iter()
            .flat_map(|s| s.machines.iter().map(|m| (m.machine_id, m.stage_number)))
            .collect();
        assert_eq!(ids, vec![(0, 0), (1, 0), (2, 1), (3, 2), (4, 2), (5, 2)]);
        assert_eq!(
            serde_json::to_string(&stages[1]).unwrap(),
            r#"{"Machines":[{"MachineId":2,"StageNumber":1}]}"#
        );
    }
}
