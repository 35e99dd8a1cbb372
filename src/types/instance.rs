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
Instancia de problema
=====================

ProblemInstance is the aggregate root of a scheduling record: metadata of the benchmark
instance, energy model (amplifiers, alpha, beta), ground truth (best known makespan and
energy), topology (stages) and jobs.

Only `pv_scaling_factor` changes after construction.
*/

use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::EapError;
use crate::types::{Amplifiers, Job, Stage};

// relativa
const ENERGY_TOLERANCE: f64 = 1e-9;

/// Identificador de instancia
///
/// Numeric identifiers are written as JSON numbers, anything else as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum InstanceId {
    /// Numeric id (benchmark index)
    Number(u64),
    /// Free form id
    Name(String),
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(n) => InstanceId::Number(n),
            Err(_) => InstanceId::Name(s.to_string()),
        }
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceId::Number(n) => write!(f, "{}", n),
            InstanceId::Name(s) => write!(f, "{}", s),
        }
    }
}

/// Instancia de problema de flow shop con datos energéticos
///
/// Energy annotated flow shop problem instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ProblemInstance {
    /// Number of jobs (equals `job_list.len()`)
    pub number_of_jobs: usize,
    /// Number of stages (equals `stage_list.len()`)
    pub number_of_stages: usize,
    /// Benchmark instance identifier
    pub instance: InstanceId,
    /// Velocity -> energy amplification factor
    pub amplifiers: Amplifiers,
    /// Energy model scale constant
    pub alpha: f64,
    /// Energy model exponent
    pub beta: f64,
    /// Required PV capacity in multiples of the reference system, unset until annotated
    #[serde(default)]
    pub pv_scaling_factor: Option<f64>,
    /// Externally supplied best known makespan
    pub best_known_makespan: u64,
    /// best_known_makespan * alpha
    pub best_known_energy: f64,
    /// Stages in flow order
    pub stage_list: Vec<Stage>,
    /// Jobs
    pub job_list: Vec<Job>,
}

impl ProblemInstance {
    /// Key of the instance in the makespan table: (jobs, stages, instance)
    pub fn key(&self) -> (String, String, String) {
        (
            self.number_of_jobs.to_string(),
            self.number_of_stages.to_string(),
            self.instance.to_string(),
        )
    }

    /// Sum of the nominal processing times of every task
    pub fn total_processing_time(&self) -> u64 {
        self.job_list.iter().map(Job::total_processing_time).sum()
    }

    /// Machines across all stages
    pub fn number_of_available_machines(&self) -> usize {
        self.stage_list.iter().map(|s| s.machines.len()).sum()
    }

    /// Check the structural invariants of the record
    ///
    /// - stage and job counts match the declared ones
    /// - machine ids increase across stages and point to their own stage
    /// - every job has one task per stage, in stage order
    /// - job ids are unique in the instance, task ids unique in each job
    /// - every speed-up table is non empty with positive times
    /// - amplifiers are defined and alpha is positive
    /// - best_known_energy == best_known_makespan * alpha
    pub fn validate(&self) -> Result<(), EapError> {
        if self.stage_list.len() != self.number_of_stages {
            return Err(EapError::SchemaViolation(format!(
                "{} stages declared but {} defined",
                self.number_of_stages,
                self.stage_list.len()
            )));
        }
        if self.job_list.len() != self.number_of_jobs {
            return Err(EapError::SchemaViolation(format!(
                "{} jobs declared but {} defined",
                self.number_of_jobs,
                self.job_list.len()
            )));
        }
        let machines = self
            .stage_list
            .iter()
            .enumerate()
            .flat_map(|(idx, s)| s.machines.iter().map(move |m| (idx, m)));
        for (expected_id, (stage_idx, machine)) in machines.enumerate() {
            if machine.machine_id != expected_id || machine.stage_number != stage_idx {
                return Err(EapError::SchemaViolation(format!(
                    "machine {} in stage {} is out of sequence",
                    machine.machine_id, stage_idx
                )));
            }
        }
        let mut job_ids = HashSet::new();
        for job in &self.job_list {
            if !job_ids.insert(job.id) {
                return Err(EapError::SchemaViolation(format!("repeated job id {}", job.id)));
            }
            let mut task_ids = HashSet::new();
            if let Some(task) = job.tasks.iter().find(|t| !task_ids.insert(t.id)) {
                return Err(EapError::SchemaViolation(format!(
                    "repeated task id {} in job {}",
                    task.id, job.id
                )));
            }
            if job.tasks.len() != self.number_of_stages {
                return Err(EapError::SchemaViolation(format!(
                    "job {} has {} tasks for {} stages",
                    job.id,
                    job.tasks.len(),
                    self.number_of_stages
                )));
            }
            for (stage, task) in job.tasks.iter().enumerate() {
                if task.stage != stage {
                    return Err(EapError::SchemaViolation(format!(
                        "task {} of job {} is at stage {} instead of {}",
                        task.id, job.id, task.stage, stage
                    )));
                }
                if task.processing_time == 0 {
                    return Err(EapError::SchemaViolation(format!(
                        "task {} of job {} has no processing time",
                        task.id, job.id
                    )));
                }
                if task.speed_up.is_empty() || task.speed_up.times().any(|t| t == 0) {
                    return Err(EapError::SchemaViolation(format!(
                        "task {} of job {} needs a speed-up table with positive times",
                        task.id, job.id
                    )));
                }
            }
        }
        if self.amplifiers.is_empty() {
            return Err(EapError::SchemaViolation("no amplifiers defined".into()));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(EapError::SchemaViolation(format!(
                "alpha must be positive and is {}",
                self.alpha
            )));
        }
        let expected_energy = self.best_known_makespan as f64 * self.alpha;
        let tolerance = ENERGY_TOLERANCE * expected_energy.abs().max(1.0);
        if (self.best_known_energy - expected_energy).abs() > tolerance {
            return Err(EapError::SchemaViolation(format!(
                "best known energy {} differs from makespan * alpha = {}",
                self.best_known_energy, expected_energy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{stages_from_machine_counts, SpeedUp, Task, Velocity};
    use pretty_assertions::assert_eq;

    fn sample() -> ProblemInstance {
        let mut speed_up = SpeedUp::default();
        speed_up.insert(4, 1);
        let task = |id, stage| Task {
            id,
            stage,
            processing_time: 4,
            speed_up: speed_up.clone(),
        };
        ProblemInstance {
            number_of_jobs: 1,
            number_of_stages: 2,
            instance: "7".into(),
            amplifiers: vec![(Velocity::from_hundredths(100), 1.0)].into_iter().collect(),
            alpha: 1.0,
            beta: 2.0,
            pv_scaling_factor: None,
            best_known_makespan: 8,
            best_known_energy: 8.0,
            stage_list: stages_from_machine_counts(&[1, 2]),
            job_list: vec![Job {
                id: 0,
                tasks: vec![task(0, 0), task(1, 1)],
            }],
        }
    }

    #[test]
    fn instance_id_from_text() {
        assert_eq!(InstanceId::from("12"), InstanceId::Number(12));
        assert_eq!(InstanceId::from("ta001"), InstanceId::Name("ta001".into()));
        assert_eq!(serde_json::to_string(&InstanceId::from("12")).unwrap(), "12");
        assert_eq!(serde_json::to_string(&InstanceId::from("a")).unwrap(), r#""a""#);
    }

    #[test]
    fn valid_sample_and_aggregates() {
        let pi = sample();
        assert_eq!(pi.validate(), Ok(()));
        assert_eq!(pi.total_processing_time(), 8);
        assert_eq!(pi.number_of_available_machines(), 3);
        assert_eq!(pi.key(), ("1".into(), "2".into(), "7".into()));
    }

    #[test]
    fn validate_detects_broken_structure() {
        let mut pi = sample();
        pi.number_of_stages = 3;
        assert!(matches!(pi.validate(), Err(EapError::SchemaViolation(_))));

        let mut pi = sample();
        pi.job_list[0].tasks.swap(0, 1);
        assert!(matches!(pi.validate(), Err(EapError::SchemaViolation(_))));

        let mut pi = sample();
        pi.job_list[0].tasks[1].speed_up = SpeedUp::default();
        assert!(matches!(pi.validate(), Err(EapError::SchemaViolation(_))));
    }

    #[test]
    fn validate_detects_repeated_job_ids() {
        let mut pi = sample();
        let mut second = pi.job_list[0].clone();
        second.tasks[0].id = 2;
        second.tasks[1].id = 3;
        pi.job_list.push(second);
        pi.number_of_jobs = 2;
        assert_eq!(
            pi.validate(),
            Err(EapError::SchemaViolation("repeated job id 0".into()))
        );
        pi.job_list[1].id = 1;
        assert_eq!(pi.validate(), Ok(()));
    }

    #[test]
    fn validate_detects_repeated_task_ids() {
        let mut pi = sample();
        pi.job_list[0].tasks[1].id = 0;
        assert_eq!(
            pi.validate(),
            Err(EapError::SchemaViolation("repeated task id 0 in job 0".into()))
        );
    }

    #[test]
    fn validate_checks_energy_identity() {
        let mut pi = sample();
        pi.best_known_energy = 999.0;
        assert!(matches!(pi.validate(), Err(EapError::SchemaViolation(_))));

        pi.alpha = 0.1;
        pi.best_known_energy = 8.0 * 0.1;
        assert_eq!(pi.validate(), Ok(()));
    }

    #[test]
    fn unset_scaling_factor_is_null_on_the_wire() {
        let json = serde_json::to_value(&sample()).unwrap();
        assert_eq!(json["PvScalingFactor"], serde_json::Value::Null);
        assert_eq!(json["BestKnownEnergy"], serde_json::json!(8.0));
        assert_eq!(json["Instance"], serde_json::json!(7));
    }
}
