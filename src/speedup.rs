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
Aceleración de tareas
=====================

For every (velocity, amplifier) pair of the amplifier curve a task of nominal processing
time `pt` gets:

1. accelerated time `t = round(pt / v, 3)`
2. total energy `pt * amplifier`, computed on the nominal time (the energy budget of the
   task doesn't depend on its speed)
3. energy per unit time `e = round(pt * amplifier / t, 3)`
4. entry `trunc(t) -> trunc(e)` of the speed-up table

Velocities are visited in ascending order, so when two of them truncate to the same time the
faster one wins. Accelerated times below one time unit truncate to zero and are left out.
*/

use log::{trace, warn};

use crate::error::EapError;
use crate::rounding::round_to;
use crate::types::{Amplifiers, SpeedUp};

/// Decimales por defecto del tiempo acelerado
pub const PRECISION_TIME: usize = 3;
/// Decimales por defecto de la energía por unidad de tiempo
pub const PRECISION_ENERGY: usize = 3;

/// Tabla de aceleración de una tarea con la precisión por defecto
pub fn calculate_speedup(amplifiers: &Amplifiers, processing_time: u64) -> Result<SpeedUp, EapError> {
    calculate_speedup_with_precision(amplifiers, processing_time, PRECISION_ENERGY, PRECISION_TIME)
}

/// Tabla de aceleración de una tarea
///
/// Speed-up table (accelerated time -> energy per unit time) of a task
pub fn calculate_speedup_with_precision(
    amplifiers: &Amplifiers,
    processing_time: u64,
    precision_energy: usize,
    precision_time: usize,
) -> Result<SpeedUp, EapError> {
    if processing_time == 0 {
        return Err(EapError::MalformedInput(
            "processing times must be positive".into(),
        ));
    }
    let pt = processing_time as f64;
    let mut speed_up = SpeedUp::default();
    for (velocity, &amplifier) in amplifiers.iter() {
        let pt_speedup = round_to(pt / velocity.value(), precision_time);
        if pt_speedup < 1.0 {
            trace!("Velocity {} takes time {} below one unit", velocity, pt_speedup);
            continue;
        }
        let total_energy_cost = pt * amplifier;
        let energy_per_pt = round_to(total_energy_cost / pt_speedup, precision_energy);
        if energy_per_pt < 0.0 {
            return Err(EapError::InvalidParameter(format!(
                "negative energy ({}) for velocity {}",
                energy_per_pt, velocity
            )));
        }
        if let Some(previous) = speed_up.insert(pt_speedup as u64, energy_per_pt as u64) {
            warn!(
                "Processing time {}: velocity {} replaces energy {} of time {}",
                processing_time, velocity, previous, pt_speedup as u64
            );
        }
    }
    if speed_up.is_empty() {
        return Err(EapError::SchemaViolation(format!(
            "no velocity gives a processing time of at least one unit for {}",
            processing_time
        )));
    }
    Ok(speed_up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amplifiers::{calculate_amplifiers, velocity_range};
    use pretty_assertions::assert_eq;

    fn amplifiers(v_min: f64, v_max: f64, v_step: f64, alpha: f64, beta: f64) -> Amplifiers {
        calculate_amplifiers(&velocity_range(v_min, v_max, v_step).unwrap(), alpha, beta)
    }

    #[test]
    fn two_velocities() {
        let amps = amplifiers(1.0, 2.0, 1.0, 1.0, 2.0);
        let speed_up = calculate_speedup(&amps, 10).unwrap();
        assert_eq!(speed_up.len(), 2);
        // 10 * 1 / 10
        assert_eq!(speed_up.get(10), Some(1));
        // 10 * 4 / 5
        assert_eq!(speed_up.get(5), Some(8));
    }

    #[test]
    fn truncation_to_integers() {
        // v = 1.5: t = 4.667, e = 7 * 2.25 / 4.667 = 3.375 -> (4, 3)
        let amps = amplifiers(1.0, 1.5, 0.5, 1.0, 2.0);
        let speed_up = calculate_speedup(&amps, 7).unwrap();
        assert_eq!(speed_up.0.into_iter().collect::<Vec<_>>(), vec![(4, 3), (7, 1)]);
    }

    #[test]
    fn colliding_times_keep_the_last_velocity() {
        // pt = 3: v = 1.0 -> 3, v = 1.1 -> 2.727, v = 1.2 -> 2.5, v = 1.5 -> 2
        let amps = amplifiers(1.0, 1.5, 0.1, 1.0, 2.0);
        let speed_up = calculate_speedup(&amps, 3).unwrap();
        assert_eq!(speed_up.times().collect::<Vec<_>>(), vec![2, 3]);
        // 3 * 2.25 / 2 = 3.375
        assert_eq!(speed_up.get(2), Some(3));
    }

    #[test]
    fn keys_positive_for_unit_tasks() {
        let amps = amplifiers(1.0, 2.0, 0.1, 1.0, 2.0);
        let speed_up = calculate_speedup(&amps, 1).unwrap();
        assert_eq!(speed_up.times().collect::<Vec<_>>(), vec![1]);
        for pt in 1..60 {
            let speed_up = calculate_speedup(&amps, pt).unwrap();
            assert!(speed_up.times().all(|t| t > 0));
        }
    }

    #[test]
    fn zero_processing_time_is_rejected() {
        let amps = amplifiers(1.0, 2.0, 0.1, 1.0, 2.0);
        assert!(matches!(
            calculate_speedup(&amps, 0),
            Err(EapError::MalformedInput(_))
        ));
    }
}
