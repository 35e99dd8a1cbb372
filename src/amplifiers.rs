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
Curva de amplificación de energía
=================================

Running a machine at velocity v shortens a task by a factor v and multiplies its energy use
by an amplifier:

amplifier(v) = round(v^beta * alpha, 2)

The velocity sweep is generated in integer hundredths, so `v_min..=v_max` with step
`v_step` never drifts or gains an extra element. Velocities are strictly positive by
construction.
*/

use log::debug;

use crate::error::EapError;
use crate::rounding::round_to;
use crate::types::{Amplifiers, Parameters, Velocity};

/// Decimales del factor de amplificación
pub const AMPLIFIER_PRECISION: usize = 2;

/// Velocidades entre `v_min` y `v_max` (ambas incluidas) con paso `v_step`
///
/// Velocity sweep, ascending
pub fn velocity_range(v_min: f64, v_max: f64, v_step: f64) -> Result<Vec<Velocity>, EapError> {
    let start = Velocity::from_f64(v_min)?.hundredths();
    let end = Velocity::from_f64(v_max)?.hundredths();
    let step = Velocity::from_f64(v_step)
        .map_err(|_| {
            EapError::InvalidParameter(format!(
                "velocity step must be at least 0.01 and is {}",
                v_step
            ))
        })?
        .hundredths();
    if end < start {
        return Err(EapError::InvalidParameter(format!(
            "v_max ({}) is lower than v_min ({})",
            v_max, v_min
        )));
    }
    Ok((start..=end)
        .step_by(step as usize)
        .map(Velocity::from_hundredths)
        .collect())
}

/// Factor de amplificación para cada velocidad
///
/// Amplifier curve: round(v^beta * alpha, 2) for each velocity
pub fn calculate_amplifiers(velocities: &[Velocity], alpha: f64, beta: f64) -> Amplifiers {
    velocities
        .iter()
        .map(|&v| (v, round_to(v.value().powf(beta) * alpha, AMPLIFIER_PRECISION)))
        .collect()
}

/// Alpha derivada de la energía externa media
///
/// alpha = best_known_makespan * coverage / average_input_energy
pub fn derive_alpha(
    best_known_makespan: u64,
    input_energy_coverage: f64,
    average_input_energy: f64,
) -> Result<f64, EapError> {
    if !(average_input_energy.is_finite() && average_input_energy > 0.0) {
        return Err(EapError::InvalidParameter(format!(
            "average_input_energy must be a positive number and is {}",
            average_input_energy
        )));
    }
    Ok(best_known_makespan as f64 * input_energy_coverage / average_input_energy)
}

/// Alpha de una instancia: la indicada o la derivada de la energía externa media
pub fn resolve_alpha(params: &Parameters, best_known_makespan: u64) -> Result<f64, EapError> {
    match params.average_input_energy {
        Some(avg) => {
            let alpha = derive_alpha(best_known_makespan, params.input_energy_coverage, avg)?;
            debug!(
                "Derived alpha {} (makespan {}, coverage {}, input {})",
                alpha, best_known_makespan, params.input_energy_coverage, avg
            );
            Ok(alpha)
        }
        None => Ok(params.alpha),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_sweep_has_eleven_velocities() {
        let range = velocity_range(1.0, 2.0, 0.1).unwrap();
        assert_eq!(range.len(), 11);
        assert_eq!(range[0].to_string(), "1.0");
        assert_eq!(range[8].to_string(), "1.8");
        assert_eq!(range[10].to_string(), "2.0");
    }

    #[test]
    fn sweep_stops_before_overshooting() {
        let range = velocity_range(1.0, 2.0, 0.3).unwrap();
        let texts: Vec<String> = range.iter().map(|v| v.to_string()).collect();
        assert_eq!(texts, vec!["1.0", "1.3", "1.6", "1.9"]);
    }

    #[test]
    fn sweep_rejects_bad_bounds() {
        assert!(velocity_range(0.0, 2.0, 0.1).is_err());
        assert!(velocity_range(2.0, 1.0, 0.1).is_err());
        assert!(velocity_range(1.0, 2.0, 0.0).is_err());
    }

    #[test]
    fn quadratic_amplifiers() {
        let range = velocity_range(1.0, 2.0, 0.1).unwrap();
        let amplifiers = calculate_amplifiers(&range, 1.0, 2.0);
        assert_eq!(amplifiers.len(), 11);
        assert_eq!(amplifiers.get_by_key("1.0").unwrap(), 1.0);
        assert_eq!(amplifiers.get_by_key("1.1").unwrap(), 1.21);
        assert_eq!(amplifiers.get_by_key("1.8").unwrap(), 3.24);
        assert_eq!(amplifiers.get_by_key("2.0").unwrap(), 4.0);
    }

    #[test]
    fn amplifiers_grow_with_velocity() {
        let range = velocity_range(1.0, 3.0, 0.05).unwrap();
        for &(alpha, beta) in &[(1.0, 2.0), (1000.0, 1.5), (0.3, 0.5)] {
            let amplifiers = calculate_amplifiers(&range, alpha, beta);
            let values: Vec<f64> = amplifiers.iter().map(|(_, &a)| a).collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn alpha_from_external_energy() {
        assert_eq!(derive_alpha(1000, 0.8, 400.0).unwrap(), 2.0);
        assert!(derive_alpha(1000, 0.8, 0.0).is_err());

        let mut params = Parameters::default();
        params.alpha = 3.0;
        assert_eq!(resolve_alpha(&params, 1000).unwrap(), 3.0);
        params.average_input_energy = Some(400.0);
        assert_eq!(resolve_alpha(&params, 1000).unwrap(), 2.0);
    }
}
