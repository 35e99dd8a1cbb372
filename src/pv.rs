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
Escalado de la instalación fotovoltaica
=======================================

Links the typical energy load of an instance to the size of the PV system that feeds it:

- total_processing_time = sum of the nominal processing times of every task
- number_of_available_machines = machines across all stages
- average_running_machines = total_processing_time / best_known_makespan
- typical_load = amplifier(reference velocity) * average_running_machines
- pv_scaling_factor = round(typical_load / assumed_peak_capacity, 3)

The scaling factor is the only value written back into an existing record.

Over a whole corpus no instance may need more running machines, on average, than it has.
*/

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::EapError;
use crate::rounding::round_to;
use crate::types::{Parameters, ProblemInstance};

/// Decimales del factor de escala
pub const PV_SCALING_PRECISION: usize = 3;

/// Indicadores de escala PV de una instancia
///
/// PV scaling indicators of an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvScaling {
    /// Instance name (file identifier)
    pub instance: String,
    /// Number of jobs
    pub number_of_jobs: usize,
    /// Number of stages
    pub number_of_stages: usize,
    /// Machines across all stages
    pub number_of_available_machines: usize,
    /// Sum of nominal processing times
    pub total_processing_time: u64,
    /// Makespan used for the average concurrency
    pub best_known_makespan: u64,
    /// Expected concurrently running machines in the best known schedule
    pub average_running_machines: f64,
    /// Energy load at the reference velocity
    pub typical_load: f64,
    /// typical_load / assumed_peak_capacity, rounded
    pub pv_scaling_factor: f64,
}

impl PvScaling {
    /// Check that the average concurrency fits in the available machines
    pub fn check_machines(&self) -> Result<(), EapError> {
        if self.average_running_machines > self.number_of_available_machines as f64 {
            Err(EapError::CorpusInvariantViolation {
                instance: self.instance.clone(),
                average_running_machines: self.average_running_machines,
                number_of_available_machines: self.number_of_available_machines,
            })
        } else {
            Ok(())
        }
    }
}

/// Comprueba que ninguna instancia necesita más máquinas de las disponibles
///
/// Corpus invariant: fails on the first instance with more running than available machines
pub fn check_corpus(stats: &[PvScaling]) -> Result<(), EapError> {
    stats.iter().try_for_each(PvScaling::check_machines)
}

/// Anotador de escala PV
///
/// PV scaling annotator
#[derive(Debug, Clone, PartialEq)]
pub struct PvScalingAnnotator {
    assumed_peak_capacity: f64,
    reference_amplifier_key: String,
}

impl PvScalingAnnotator {
    /// Annotator for a peak capacity and a reference velocity ("1.8")
    pub fn new<T: Into<String>>(
        assumed_peak_capacity: f64,
        reference_amplifier_key: T,
    ) -> Result<Self, EapError> {
        if !(assumed_peak_capacity.is_finite() && assumed_peak_capacity > 0.0) {
            return Err(EapError::InvalidParameter(format!(
                "assumed_peak_capacity must be a positive number and is {}",
                assumed_peak_capacity
            )));
        }
        Ok(PvScalingAnnotator {
            assumed_peak_capacity,
            reference_amplifier_key: reference_amplifier_key.into(),
        })
    }

    /// Annotator configured from the batch parameters
    pub fn from_parameters(params: &Parameters) -> Result<Self, EapError> {
        Self::new(params.assumed_peak_capacity, params.reference_amplifier_key.as_str())
    }

    /// Indicators of an instance, using the given best known makespan
    pub fn scaling_with_makespan(
        &self,
        name: &str,
        pi: &ProblemInstance,
        best_known_makespan: u64,
    ) -> Result<PvScaling, EapError> {
        if best_known_makespan == 0 {
            return Err(EapError::SchemaViolation(format!(
                "instance {} has a best known makespan of 0",
                name
            )));
        }
        let total_processing_time = pi.total_processing_time();
        let number_of_available_machines = pi.number_of_available_machines();
        let average_running_machines = total_processing_time as f64 / best_known_makespan as f64;
        let amplifier = pi.amplifiers.get_by_key(&self.reference_amplifier_key)?;
        let typical_load = amplifier * average_running_machines;
        let pv_scaling_factor =
            round_to(typical_load / self.assumed_peak_capacity, PV_SCALING_PRECISION);
        debug!(
            "Instance {}: {:.3} running machines, typical load {:.3}, PV scaling {}",
            name, average_running_machines, typical_load, pv_scaling_factor
        );
        Ok(PvScaling {
            instance: name.to_string(),
            number_of_jobs: pi.number_of_jobs,
            number_of_stages: pi.number_of_stages,
            number_of_available_machines,
            total_processing_time,
            best_known_makespan,
            average_running_machines,
            typical_load,
            pv_scaling_factor,
        })
    }

    /// Indicators of an instance with its own best known makespan
    pub fn scaling(&self, name: &str, pi: &ProblemInstance) -> Result<PvScaling, EapError> {
        self.scaling_with_makespan(name, pi, pi.best_known_makespan)
    }

    /// Compute the indicators and store the scaling factor in the instance
    pub fn annotate(&self, name: &str, pi: &mut ProblemInstance) -> Result<PvScaling, EapError> {
        let scaling = self.scaling(name, pi)?;
        pi.pv_scaling_factor = Some(scaling.pv_scaling_factor);
        Ok(scaling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::makespans::MakespanTable;
    use pretty_assertions::assert_eq;

    // 1 job, 2 stages with 1 and 3 machines, pt 60 + 40 = 100
    const TRAW: &str = "1 2\n1 3\n60\n40\n";

    fn instance(makespan: u64) -> ProblemInstance {
        let table = MakespanTable::from_text(&format!("1 2 1 {}\n", makespan));
        Assembler::new(&table, Parameters::default())
            .unwrap()
            .assemble_text(TRAW, "1_2_1")
            .unwrap()
    }

    #[test]
    fn scaling_indicators() {
        let annotator = PvScalingAnnotator::new(1000.0, "1.8").unwrap();
        let mut pi = instance(50);
        let scaling = annotator.annotate("1_2_1", &mut pi).unwrap();
        assert_eq!(scaling.total_processing_time, 100);
        assert_eq!(scaling.number_of_available_machines, 4);
        assert_eq!(scaling.average_running_machines, 2.0);
        // 3.24 * 2
        assert_eq!(scaling.typical_load, 6.48);
        assert_eq!(scaling.pv_scaling_factor, 0.006);
        assert_eq!(pi.pv_scaling_factor, Some(0.006));
        assert_eq!(check_corpus(&[scaling]), Ok(()));
    }

    #[test]
    fn annotation_is_idempotent() {
        let annotator = PvScalingAnnotator::new(1.0, "1.8").unwrap();
        let mut pi = instance(50);
        let first = annotator.annotate("1_2_1", &mut pi).unwrap();
        let annotated = pi.clone();
        let second = annotator.annotate("1_2_1", &mut pi).unwrap();
        assert_eq!(first, second);
        assert_eq!(pi, annotated);
        assert_eq!(pi.pv_scaling_factor, Some(6.48));
    }

    #[test]
    fn too_many_running_machines() {
        let annotator = PvScalingAnnotator::new(1000.0, "1.8").unwrap();
        // 100 / 20 = 5 running machines for 4 available
        let pi = instance(20);
        let scaling = annotator.scaling("1_2_1", &pi).unwrap();
        assert_eq!(scaling.average_running_machines, 5.0);
        assert_eq!(
            check_corpus(&[scaling]),
            Err(EapError::CorpusInvariantViolation {
                instance: "1_2_1".into(),
                average_running_machines: 5.0,
                number_of_available_machines: 4,
            })
        );
    }

    #[test]
    fn unknown_reference_velocity() {
        let annotator = PvScalingAnnotator::new(1000.0, "2.5").unwrap();
        let pi = instance(50);
        assert_eq!(
            annotator.scaling("1_2_1", &pi),
            Err(EapError::UnknownAmplifier("2.5".into()))
        );
        assert!(PvScalingAnnotator::new(0.0, "1.8").is_err());
    }
}
