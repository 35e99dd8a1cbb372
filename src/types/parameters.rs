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
Parámetros de generación
========================

Configuration used to build and annotate a batch of instances. The same structure is
written as `parameters.json` next to the records, as the reproducibility record of the batch.
*/

use serde::{Deserialize, Serialize};

use crate::error::EapError;
use crate::types::Velocity;

/// Velocidad mínima por defecto
pub const V_MIN_DEFAULT: f64 = 1.0;
/// Velocidad máxima por defecto
pub const V_MAX_DEFAULT: f64 = 2.0;
/// Paso de velocidad por defecto
pub const V_STEP_DEFAULT: f64 = 0.1;
/// Fracción de la energía cubierta por la fuente externa
pub const INPUT_ENERGY_COVERAGE_DEFAULT: f64 = 0.8;
/// Capacidad de referencia del perfil PV de muestra
pub const ASSUMED_PEAK_CAPACITY_DEFAULT: f64 = 1000.0;
/// Velocidad cuyo amplificador define la carga típica
pub const REFERENCE_AMPLIFIER_KEY_DEFAULT: &str = "1.8";

/// Parámetros del lote
///
/// Batch parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Lowest velocity of the sweep
    pub v_min: f64,
    /// Highest velocity of the sweep (inclusive)
    pub v_max: f64,
    /// Velocity step
    pub v_step: f64,
    /// Energy model scale, replaced by a derived value when `average_input_energy` is set
    pub alpha: f64,
    /// Energy model exponent
    pub beta: f64,
    /// Fraction of the schedule duration the external source is expected to cover
    pub input_energy_coverage: f64,
    /// Average external energy input driving a derived alpha
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_input_energy: Option<f64>,
    /// PV capacity the raw sample profile corresponds to
    pub assumed_peak_capacity: f64,
    /// Velocity (text form) whose amplifier defines the typical load
    pub reference_amplifier_key: String,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            v_min: V_MIN_DEFAULT,
            v_max: V_MAX_DEFAULT,
            v_step: V_STEP_DEFAULT,
            alpha: 1.0,
            beta: 2.0,
            input_energy_coverage: INPUT_ENERGY_COVERAGE_DEFAULT,
            average_input_energy: None,
            assumed_peak_capacity: ASSUMED_PEAK_CAPACITY_DEFAULT,
            reference_amplifier_key: REFERENCE_AMPLIFIER_KEY_DEFAULT.to_string(),
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), EapError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EapError::InvalidParameter(format!(
            "{} must be a positive number and is {}",
            name, value
        )))
    }
}

impl Parameters {
    /// Check the domain of every value
    pub fn validate(&self) -> Result<(), EapError> {
        positive("v_min", self.v_min)?;
        positive("v_step", self.v_step)?;
        positive("v_max", self.v_max)?;
        if self.v_max < self.v_min {
            return Err(EapError::InvalidParameter(format!(
                "v_max ({}) is lower than v_min ({})",
                self.v_max, self.v_min
            )));
        }
        positive("alpha", self.alpha)?;
        if !self.beta.is_finite() {
            return Err(EapError::InvalidParameter(format!(
                "beta must be a finite number and is {}",
                self.beta
            )));
        }
        positive("input_energy_coverage", self.input_energy_coverage)?;
        if self.input_energy_coverage > 1.0 {
            return Err(EapError::InvalidParameter(format!(
                "input_energy_coverage must be at most 1.0 and is {}",
                self.input_energy_coverage
            )));
        }
        if let Some(avg) = self.average_input_energy {
            positive("average_input_energy", avg)?;
        }
        positive("assumed_peak_capacity", self.assumed_peak_capacity)?;
        self.reference_amplifier_key
            .parse::<Velocity>()
            .map_err(|_| {
                EapError::InvalidParameter(format!(
                    "reference_amplifier_key \"{}\" is not a velocity",
                    self.reference_amplifier_key
                ))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Parameters::default().validate(), Ok(()));
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let params: Parameters =
            serde_json::from_str(r#"{"alpha": 1000, "beta": 2.0, "v_step": 0.1}"#).unwrap();
        assert_eq!(params.alpha, 1000.0);
        assert_eq!(params.v_max, 2.0);
        assert_eq!(params.reference_amplifier_key, "1.8");
        assert_eq!(params.average_input_energy, None);
    }

    #[test]
    fn out_of_domain_values() {
        let mut params = Parameters::default();
        params.v_min = 0.0;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.v_max = 0.5;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.input_energy_coverage = 1.5;
        assert!(params.validate().is_err());

        let mut params = Parameters::default();
        params.reference_amplifier_key = "typical".into();
        assert!(params.validate().is_err());
    }
}
