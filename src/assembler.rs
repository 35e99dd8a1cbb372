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
Lectura y ensamblado de instancias
==================================

Raw benchmark instances are plain text:

```text
2 2          <- number of jobs, number of stages
1 1          <- machines of each stage
10 20        <- processing times of stage 0, one per job
15 5         <- processing times of stage 1, one per job
```

The processing time matrix is stage-major in the file and job-major in the record.

The file name carries the instance key: `instancia_20_5_1.txt` is instance `20_5_1`, looked
up as (`20`, `5`, `1`) in the makespan table, with `1` as the instance id of the record.

An instance is all or nothing: any parse error, a missing makespan or a broken invariant
fails the whole instance.
*/

use std::str;

use log::{debug, warn};
use schemars::schema::RootSchema;

use crate::amplifiers::{calculate_amplifiers, resolve_alpha, velocity_range};
use crate::error::EapError;
use crate::makespans::{InstanceKey, MakespanTable};
use crate::speedup::calculate_speedup;
use crate::types::{
    stages_from_machine_counts, InstanceId, Job, Parameters, ProblemInstance, Task, Velocity,
};

/// Prefijo de los archivos de instancias
pub const INSTANCE_FILE_PREFIX: &str = "instancia_";
/// Sufijo de los archivos de instancias
pub const INSTANCE_FILE_SUFFIX: &str = ".txt";

/// Instancia en bruto
///
/// Raw instance as read from a benchmark text file
#[derive(Debug, Clone, PartialEq)]
pub struct RawInstance {
    /// Number of jobs
    pub number_of_jobs: usize,
    /// Number of stages
    pub number_of_stages: usize,
    /// Parallel machines of each stage
    pub machines_per_stage: Vec<usize>,
    /// Processing times, one row per job with one value per stage
    pub processing_times: Vec<Vec<u64>>,
}

fn parse_line<T>(line: &str) -> Result<Vec<T>, EapError>
where
    T: str::FromStr,
    EapError: From<T::Err>,
{
    line.split_whitespace()
        .map(|token| token.parse::<T>().map_err(EapError::from))
        .collect()
}

impl str::FromStr for RawInstance {
    type Err = EapError;

    fn from_str(s: &str) -> Result<RawInstance, Self::Err> {
        let s_nobom = s.trim_start_matches('\u{feff}');
        let mut lines = s_nobom.trim().lines().map(str::trim);

        let header: Vec<usize> = parse_line(lines.next().unwrap_or(""))?;
        if header.len() != 2 {
            return Err(EapError::MalformedInput(format!(
                "header needs 2 values (jobs, stages) and has {}",
                header.len()
            )));
        }
        let (number_of_jobs, number_of_stages) = (header[0], header[1]);

        let machines_per_stage: Vec<usize> = parse_line(lines.next().unwrap_or(""))?;
        if machines_per_stage.len() != number_of_stages {
            return Err(EapError::MalformedInput(format!(
                "{} machine counts for {} stages",
                machines_per_stage.len(),
                number_of_stages
            )));
        }
        if let Some(stage) = machines_per_stage.iter().position(|&m| m == 0) {
            return Err(EapError::MalformedInput(format!("stage {} has no machines", stage)));
        }

        let by_stage = lines
            .filter(|l| !l.is_empty())
            .map(parse_line::<u64>)
            .collect::<Result<Vec<_>, _>>()?;
        if by_stage.len() != number_of_stages {
            return Err(EapError::MalformedInput(format!(
                "{} rows of processing times for {} stages",
                by_stage.len(),
                number_of_stages
            )));
        }
        if let Some((stage, row)) = by_stage
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != number_of_jobs)
        {
            return Err(EapError::MalformedInput(format!(
                "stage {} has {} processing times for {} jobs",
                stage,
                row.len(),
                number_of_jobs
            )));
        }
        if by_stage.iter().flatten().any(|&pt| pt == 0) {
            return Err(EapError::MalformedInput(
                "processing times must be positive".into(),
            ));
        }

        let processing_times = (0..number_of_jobs)
            .map(|job| by_stage.iter().map(|row| row[job]).collect())
            .collect();

        Ok(RawInstance {
            number_of_jobs,
            number_of_stages,
            machines_per_stage,
            processing_times,
        })
    }
}

/// Identificador de instancia a partir del nombre de archivo
///
/// `instancia_20_5_1.txt` -> `20_5_1`
pub fn instance_identifier(file_name: &str) -> String {
    let name = file_name.strip_suffix(INSTANCE_FILE_SUFFIX).unwrap_or(file_name);
    name.strip_prefix(INSTANCE_FILE_PREFIX)
        .unwrap_or(name)
        .to_string()
}

/// Clave de la tabla de makespans a partir del identificador
///
/// `20_5_1` -> (`20`, `5`, `1`)
pub fn instance_key(identifier: &str) -> Result<InstanceKey, EapError> {
    let parts: Vec<&str> = identifier.split('_').collect();
    match parts.as_slice() {
        [jobs, stages, id] if !id.is_empty() => {
            Ok((jobs.to_string(), stages.to_string(), id.to_string()))
        }
        _ => Err(EapError::MalformedInput(format!(
            "instance identifier \"{}\" is not <jobs>_<stages>_<id>",
            identifier
        ))),
    }
}

/// Esquema JSON del registro de instancia
pub fn instance_schema() -> RootSchema {
    schemars::schema_for!(ProblemInstance)
}

/// Ensamblador de instancias
///
/// Builds energy annotated records from raw instances. The makespan table and the
/// parameters are shared, read only, by every instance of a batch.
#[derive(Debug)]
pub struct Assembler<'a> {
    makespans: &'a MakespanTable,
    params: Parameters,
    velocities: Vec<Velocity>,
}

impl<'a> Assembler<'a> {
    /// Assembler for a makespan table and a set of (validated) parameters
    pub fn new(makespans: &'a MakespanTable, params: Parameters) -> Result<Self, EapError> {
        params.validate()?;
        let velocities = velocity_range(params.v_min, params.v_max, params.v_step)?;
        Ok(Assembler {
            makespans,
            params,
            velocities,
        })
    }

    /// Parameters used by the assembler
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Parse and assemble the raw text of the instance with the given identifier
    pub fn assemble_text(&self, raw: &str, identifier: &str) -> Result<ProblemInstance, EapError> {
        let raw: RawInstance = raw.parse()?;
        self.assemble(&raw, identifier)
    }

    /// Assemble a parsed raw instance
    pub fn assemble(&self, raw: &RawInstance, identifier: &str) -> Result<ProblemInstance, EapError> {
        let key = instance_key(identifier)?;
        if key.0 != raw.number_of_jobs.to_string() || key.1 != raw.number_of_stages.to_string() {
            warn!(
                "Instance {} declares {} jobs and {} stages",
                identifier, raw.number_of_jobs, raw.number_of_stages
            );
        }
        let best_known_makespan = self
            .makespans
            .get_key(&key)
            .ok_or_else(|| EapError::MissingGroundTruth(identifier.to_string()))?;

        let alpha = resolve_alpha(&self.params, best_known_makespan)?;
        let best_known_energy = best_known_makespan as f64 * alpha;
        let amplifiers = calculate_amplifiers(&self.velocities, alpha, self.params.beta);

        let stage_list = stages_from_machine_counts(&raw.machines_per_stage);

        let mut task_id = 0;
        let mut job_list = Vec::with_capacity(raw.number_of_jobs);
        for (job_id, job_times) in raw.processing_times.iter().enumerate() {
            let mut tasks = Vec::with_capacity(job_times.len());
            for (stage, &processing_time) in job_times.iter().enumerate() {
                tasks.push(Task {
                    id: task_id,
                    stage,
                    processing_time,
                    speed_up: calculate_speedup(&amplifiers, processing_time)?,
                });
                task_id += 1;
            }
            job_list.push(Job { id: job_id, tasks });
        }

        let instance = ProblemInstance {
            number_of_jobs: raw.number_of_jobs,
            number_of_stages: raw.number_of_stages,
            instance: InstanceId::from(key.2.as_str()),
            amplifiers,
            alpha,
            beta: self.params.beta,
            pv_scaling_factor: None,
            best_known_makespan,
            best_known_energy,
            stage_list,
            job_list,
        };
        instance.validate()?;
        debug!(
            "Assembled instance {}: {} jobs, {} stages, makespan {}",
            identifier, instance.number_of_jobs, instance.number_of_stages, best_known_makespan
        );
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRAW: &str = "2 2\n1 1\n10 20\n15 5\n";

    fn params() -> Parameters {
        Parameters {
            v_min: 1.0,
            v_max: 2.0,
            v_step: 1.0,
            alpha: 1.0,
            beta: 2.0,
            ..Parameters::default()
        }
    }

    #[test]
    fn raw_instance_is_transposed() {
        let raw: RawInstance = TRAW.parse().unwrap();
        assert_eq!(raw.number_of_jobs, 2);
        assert_eq!(raw.number_of_stages, 2);
        assert_eq!(raw.machines_per_stage, vec![1, 1]);
        assert_eq!(raw.processing_times, vec![vec![10, 15], vec![20, 5]]);
    }

    #[test]
    fn raw_instance_errors() {
        assert!(matches!(
            "2 2 2\n1 1\n10 20\n15 5\n".parse::<RawInstance>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "2 x\n1 1\n10 20\n15 5\n".parse::<RawInstance>(),
            Err(EapError::Parse { .. })
        ));
        assert!(matches!(
            "2 2\n1\n10 20\n15 5\n".parse::<RawInstance>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "2 2\n1 1\n10 20\n15\n".parse::<RawInstance>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "2 2\n1 1\n10 20\n".parse::<RawInstance>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "2 2\n1 1\n10 0\n15 5\n".parse::<RawInstance>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!("".parse::<RawInstance>().is_err());
    }

    #[test]
    fn identifiers_from_file_names() {
        assert_eq!(instance_identifier("instancia_20_5_1.txt"), "20_5_1");
        assert_eq!(instance_identifier("2_2_1"), "2_2_1");
        assert_eq!(
            instance_key("20_5_1").unwrap(),
            ("20".to_string(), "5".to_string(), "1".to_string())
        );
        assert!(instance_key("20_5").is_err());
        assert!(instance_key("20_5_1_b").is_err());
    }

    #[test]
    fn assemble_small_instance() {
        let table = MakespanTable::from_text("2 2 1 30\n");
        let assembler = Assembler::new(&table, params()).unwrap();
        let pi = assembler.assemble_text(TRAW, "2_2_1").unwrap();

        assert_eq!(pi.number_of_jobs, 2);
        assert_eq!(pi.number_of_stages, 2);
        assert_eq!(pi.instance, InstanceId::Number(1));
        assert_eq!(pi.best_known_makespan, 30);
        assert_eq!(pi.best_known_energy, 30.0);
        assert_eq!(pi.pv_scaling_factor, None);
        assert_eq!(pi.stage_list.len(), 2);
        assert!(pi.stage_list.iter().all(|s| s.machines.len() == 1));
        assert_eq!(pi.amplifiers.get_by_key("1.0").unwrap(), 1.0);
        assert_eq!(pi.amplifiers.get_by_key("2.0").unwrap(), 4.0);

        let job0 = &pi.job_list[0];
        assert_eq!(
            job0.tasks.iter().map(|t| (t.id, t.stage, t.processing_time)).collect::<Vec<_>>(),
            vec![(0, 0, 10), (1, 1, 15)]
        );
        assert_eq!(job0.tasks[0].speed_up.get(10), Some(1));
        assert_eq!(job0.tasks[0].speed_up.get(5), Some(8));
        assert_eq!(pi.job_list[1].tasks[1].id, 3);
    }

    #[test]
    fn missing_makespan_is_fatal() {
        let table = MakespanTable::from_text("2 2 2 30\n");
        let assembler = Assembler::new(&table, params()).unwrap();
        assert_eq!(
            assembler.assemble_text(TRAW, "2_2_1"),
            Err(EapError::MissingGroundTruth("2_2_1".into()))
        );
    }

    #[test]
    fn derived_alpha_sets_energy() {
        let table = MakespanTable::from_text("2 2 1 30\n");
        let p = Parameters {
            average_input_energy: Some(12.0),
            input_energy_coverage: 0.8,
            ..params()
        };
        let pi = Assembler::new(&table, p).unwrap().assemble_text(TRAW, "2_2_1").unwrap();
        // 30 * 0.8 / 12
        assert_eq!(pi.alpha, 2.0);
        assert_eq!(pi.best_known_energy, 60.0);
        assert_eq!(pi.amplifiers.get_by_key("2.0").unwrap(), 8.0);
    }

    #[test]
    fn schema_describes_wire_names() {
        let schema = serde_json::to_value(instance_schema()).unwrap();
        let properties = &schema["properties"];
        for name in &["NumberOfJobs", "Amplifiers", "PvScalingFactor", "StageList", "JobList"] {
            assert!(properties.get(name).is_some(), "missing {}", name);
        }
    }
}
