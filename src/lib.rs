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
EapData
=======

This crate provides a library and binary that **prepare flow shop scheduling benchmarks for
energy aware production research**: raw plain text instances are turned into validated JSON
records annotated with an energy model, and each record is linked to the size of the
photovoltaic (PV) system that would feed it.

The pipeline:

1. best known makespans are read from a text table (`MakespanTable`)
2. an amplifier curve maps each velocity v to an energy factor `round(v^beta * alpha, 2)`
3. every task gets a speed-up table: accelerated processing time -> energy per unit time
4. raw instances are parsed and assembled into `ProblemInstance` records (`Assembler`)
5. the PV annotator computes the typical load of each record and stores its
   `pv_scaling_factor` (`PvScalingAnnotator`)

It also holds the following assumptions:

- processing times and makespans are integers, and so are speed-up tables (times and energy
  are truncated)
- the best known makespan is external ground truth, it is never computed
- an instance is all or nothing: no partial record is ever written

# Example

```rust
use eapdata::*;

let makespans = MakespanTable::from_text("2 2 1 30\n");
let params = Parameters { v_step: 1.0, ..Parameters::default() };
let assembler = Assembler::new(&makespans, params).unwrap();

let mut instance = assembler
    .assemble_text("2 2\n1 1\n10 20\n15 5\n", "2_2_1")
    .unwrap();
assert_eq!(instance.job_list[0].tasks[0].speed_up.get(5), Some(8));

let annotator = PvScalingAnnotator::new(1.0, "2.0").unwrap();
let scaling = annotator.annotate("2_2_1", &mut instance).unwrap();
assert_eq!(scaling.average_running_machines, 50.0 / 30.0);
```

*/

#![deny(missing_docs)]

pub mod amplifiers;
pub mod asplain;
pub mod assembler;
pub mod error;
pub mod makespans;
pub mod package;
pub mod pv;
pub mod pvprofile;
pub mod rounding;
pub mod speedup;
pub mod stats;
pub mod types;

pub use amplifiers::{calculate_amplifiers, derive_alpha, resolve_alpha, velocity_range};
pub use assembler::{instance_identifier, instance_key, instance_schema, Assembler, RawInstance};
pub use error::EapError;
pub use makespans::{InstanceKey, MakespanSummary, MakespanTable};
pub use pv::{check_corpus, PvScaling, PvScalingAnnotator};
pub use pvprofile::{DailyEnergy, Statistic};
pub use speedup::{calculate_speedup, calculate_speedup_with_precision};
pub use types::*;

/// Número de versión de la librería
///
/// Version number
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
