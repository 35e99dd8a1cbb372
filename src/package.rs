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
Paquete de datos
================

Layout of the data package and batch runs over its directories.

```text
<root>/
  pv/pvgis_data/<city>.csv                           PV generation profiles
  scheduling/raw_input/instances/instancia_<id>.txt  raw benchmark instances
  scheduling/raw_input/best_makespans.txt            best known makespans
  scheduling/instances/<id>.json                     energy annotated records
  scheduling/instances/parameters.json               batch parameters
  scheduling/schema.json                             JSON schema of the records
```

Instances of a batch are processed in file name order. Each one succeeds or fails on its
own: failures are collected with the name of their file, unless the run is fail-fast.
The PV annotation pass writes nothing unless the whole corpus passes the running machines
check.
*/

use std::fs;
use std::path::{Path, PathBuf};

use failure::{Error, ResultExt};
use itertools::Itertools;
use log::{error, info, warn};

use crate::assembler::{instance_identifier, instance_schema, Assembler};
use crate::error::EapError;
use crate::makespans::MakespanTable;
use crate::pv::{check_corpus, PvScaling, PvScalingAnnotator};
use crate::types::{Parameters, ProblemInstance, Velocity};

/// Nombre del archivo de parámetros
pub const PARAMETERS_FILE: &str = "parameters.json";
/// Nombre del archivo de esquema
pub const SCHEMA_FILE: &str = "schema.json";

/// Rutas del paquete de datos
///
/// Paths of the data package
#[derive(Debug, Clone, PartialEq)]
pub struct DataPackage {
    root: PathBuf,
}

impl DataPackage {
    /// Data package rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DataPackage { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// PV data directory
    pub fn pv(&self) -> PathBuf {
        self.root.join("pv")
    }

    /// PVGIS generation profiles
    pub fn pv_pvgis_data(&self) -> PathBuf {
        self.pv().join("pvgis_data")
    }

    /// Scheduling data directory
    pub fn scheduling(&self) -> PathBuf {
        self.root.join("scheduling")
    }

    /// Raw scheduling input
    pub fn raw_input(&self) -> PathBuf {
        self.scheduling().join("raw_input")
    }

    /// Raw benchmark instances
    pub fn raw_instances(&self) -> PathBuf {
        self.raw_input().join("instances")
    }

    /// Best known makespans
    pub fn makespans(&self) -> PathBuf {
        self.raw_input().join("best_makespans.txt")
    }

    /// Energy annotated records
    pub fn json_instances(&self) -> PathBuf {
        self.scheduling().join("instances")
    }

    /// Schema of the records
    pub fn schema_json(&self) -> PathBuf {
        self.scheduling().join(SCHEMA_FILE)
    }

    /// Batch parameters
    pub fn parameters_json(&self) -> PathBuf {
        self.json_instances().join(PARAMETERS_FILE)
    }
}

/// Archivo que no se ha podido procesar
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// File that failed
    pub path: PathBuf,
    /// Error description
    pub message: String,
}

impl Failure {
    /// Failure of a skipped file. Bad input data is a warning, anything else an error.
    pub fn skipped(path: PathBuf, err: &Error) -> Self {
        let input_error = err.iter_chain().any(|cause| {
            cause
                .downcast_ref::<EapError>()
                .map_or(false, EapError::is_input_error)
        });
        let message = err.iter_chain().map(|cause| cause.to_string()).join(": ");
        if input_error {
            warn!("Skipping {}: {}", path.display(), message);
        } else {
            error!("Skipping {}: {}", path.display(), message);
        }
        Failure { path, message }
    }
}

/// Resultado de la transformación de un directorio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformReport {
    /// Written records
    pub written: Vec<PathBuf>,
    /// Instances that couldn't be transformed
    pub failures: Vec<Failure>,
}

/// Resultado de la anotación de un directorio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotateReport {
    /// Indicators of every annotated record, in file name order
    pub stats: Vec<PvScaling>,
    /// Records that couldn't be read
    pub failures: Vec<Failure>,
}

/// Files of a directory with the given extension, sorted by name
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).context(format!("Could not read directory {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == extension) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn writefile(path: &Path, content: &[u8]) -> Result<(), Error> {
    fs::write(path, content).context(format!("Could not write {}", path.display()))?;
    Ok(())
}

/// Read batch parameters from a JSON document
pub fn read_parameters(path: &Path) -> Result<Parameters, Error> {
    let content = fs::read_to_string(path)
        .context(format!("Could not read parameters file {}", path.display()))?;
    let params: Parameters = serde_json::from_str(&content)
        .context(format!("Wrong parameters format in {}", path.display()))?;
    Ok(params)
}

/// Write batch parameters as a JSON document
pub fn write_parameters(path: &Path, params: &Parameters) -> Result<(), Error> {
    writefile(path, serde_json::to_string_pretty(params)?.as_bytes())
}

/// Read a record and check its invariants
pub fn read_instance(path: &Path) -> Result<ProblemInstance, Error> {
    let content = fs::read_to_string(path).context(format!("Could not read {}", path.display()))?;
    let pi: ProblemInstance = serde_json::from_str(&content)
        .context(format!("Wrong record format in {}", path.display()))?;
    pi.validate()
        .context(format!("Invalid record {}", path.display()))?;
    Ok(pi)
}

/// Write a record, replacing any previous content
pub fn write_instance(path: &Path, pi: &ProblemInstance) -> Result<(), Error> {
    writefile(path, serde_json::to_string(pi)?.as_bytes())
}

/// Transforma todas las instancias en bruto de un directorio
///
/// Transform every `*.txt` raw instance of `input_dir` into `<output_dir>/<id>.json`, then
/// write the schema to `schema_path` and the parameters to `<output_dir>/parameters.json`.
pub fn transform_dir(
    assembler: &Assembler<'_>,
    input_dir: &Path,
    output_dir: &Path,
    schema_path: &Path,
    fail_fast: bool,
) -> Result<TransformReport, Error> {
    fs::create_dir_all(output_dir)
        .context(format!("Could not create directory {}", output_dir.display()))?;
    let mut report = TransformReport::default();
    for path in list_files(input_dir, "txt")? {
        let identifier = instance_identifier(&file_name(&path));
        let result = fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|raw| Ok(assembler.assemble_text(&raw, &identifier)?));
        match result {
            Ok(pi) => {
                let target = output_dir.join(format!("{}.json", identifier));
                write_instance(&target, &pi)?;
                report.written.push(target);
            }
            Err(err) if fail_fast => {
                return Err(err
                    .context(format!("Instance file {}", path.display()))
                    .into())
            }
            Err(err) => {
                report.failures.push(Failure::skipped(path, &err));
            }
        }
    }
    if let Some(parent) = schema_path.parent() {
        fs::create_dir_all(parent)
            .context(format!("Could not create directory {}", parent.display()))?;
    }
    writefile(schema_path, serde_json::to_string_pretty(&instance_schema())?.as_bytes())?;
    write_parameters(&output_dir.join(PARAMETERS_FILE), assembler.parameters())?;
    info!(
        "Transformed {} instances from {} ({} failed)",
        report.written.len(),
        input_dir.display(),
        report.failures.len()
    );
    Ok(report)
}

/// Parámetros de generación deducidos de los registros
///
/// Parameters that built a set of records, when all of them share alpha, beta and the
/// velocity sweep. Values the records don't carry (coverage, PV settings) come from
/// `params`. `None` for an empty set or records built with different energy models.
pub fn parameters_from_records(
    records: &[&ProblemInstance],
    params: &Parameters,
) -> Option<Parameters> {
    let first = records.first()?;
    let velocities: Vec<Velocity> = first.amplifiers.iter().map(|(v, _)| *v).collect();
    let same_model = records.iter().all(|pi| {
        pi.alpha == first.alpha
            && pi.beta == first.beta
            && pi.amplifiers.iter().map(|(v, _)| *v).eq(velocities.iter().cloned())
    });
    if !same_model {
        return None;
    }
    let (v_min, v_max) = (velocities.first()?, velocities.last()?);
    let v_step = match velocities.get(1) {
        Some(second) => {
            Velocity::from_hundredths(second.hundredths() - v_min.hundredths()).value()
        }
        None => params.v_step,
    };
    Some(Parameters {
        v_min: v_min.value(),
        v_max: v_max.value(),
        v_step,
        alpha: first.alpha,
        beta: first.beta,
        average_input_energy: None,
        ..params.clone()
    })
}

/// Anota con el factor de escala PV todas las instancias de un directorio
///
/// Annotate every record of `dir` with its PV scaling factor. When a makespan table is given,
/// the key of each record must be in it and its value is used as best known makespan.
///
/// The records are only written back after the whole corpus passes the running machines
/// check. `parameters.json` is updated with the annotator configuration. Without it, the
/// document is rebuilt from the records (see `parameters_from_records`) or left out.
pub fn annotate_dir(
    annotator: &PvScalingAnnotator,
    params: &Parameters,
    dir: &Path,
    makespans: Option<&MakespanTable>,
    fail_fast: bool,
) -> Result<AnnotateReport, Error> {
    let mut report = AnnotateReport::default();
    let mut annotated = Vec::new();
    for path in list_files(dir, "json")? {
        let name = file_name(&path);
        if name == PARAMETERS_FILE || name == SCHEMA_FILE {
            continue;
        }
        let identifier = file_stem(&path);
        let result = read_instance(&path).and_then(|pi| {
            let scaling = match makespans {
                Some(table) => {
                    let makespan = table.get_key(&pi.key()).ok_or_else(|| {
                        EapError::MissingGroundTruth(identifier.clone())
                    })?;
                    annotator.scaling_with_makespan(&identifier, &pi, makespan)?
                }
                None => annotator.scaling(&identifier, &pi)?,
            };
            Ok((pi, scaling))
        });
        match result {
            Ok(item) => annotated.push((path, item)),
            Err(err) if fail_fast => {
                return Err(err.context(format!("Record {}", path.display())).into())
            }
            Err(err) => {
                report.failures.push(Failure::skipped(path, &err));
            }
        }
    }

    let stats: Vec<PvScaling> = annotated.iter().map(|(_, (_, s))| s.clone()).collect();
    check_corpus(&stats)?;

    let params_path = dir.join(PARAMETERS_FILE);
    let recorded = if params_path.exists() {
        Some(read_parameters(&params_path)?)
    } else {
        let records: Vec<&ProblemInstance> = annotated.iter().map(|(_, (pi, _))| pi).collect();
        let recovered = parameters_from_records(&records, params);
        if recovered.is_none() {
            warn!(
                "No {} in {} and the records don't share one energy model: it won't be written",
                PARAMETERS_FILE,
                dir.display()
            );
        }
        recovered
    };

    for (path, (mut pi, scaling)) in annotated {
        pi.pv_scaling_factor = Some(scaling.pv_scaling_factor);
        write_instance(&path, &pi)?;
    }

    if let Some(mut recorded) = recorded {
        recorded.assumed_peak_capacity = params.assumed_peak_capacity;
        recorded.reference_amplifier_key = params.reference_amplifier_key.clone();
        write_parameters(&params_path, &recorded)?;
    }

    info!(
        "Annotated {} records in {} ({} failed)",
        stats.len(),
        dir.display(),
        report.failures.len()
    );
    report.stats = stats;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn package_layout() {
        let dp = DataPackage::new("/data");
        assert_eq!(dp.raw_instances(), PathBuf::from("/data/scheduling/raw_input/instances"));
        assert_eq!(dp.makespans(), PathBuf::from("/data/scheduling/raw_input/best_makespans.txt"));
        assert_eq!(dp.json_instances(), PathBuf::from("/data/scheduling/instances"));
        assert_eq!(dp.schema_json(), PathBuf::from("/data/scheduling/schema.json"));
        assert_eq!(
            dp.parameters_json(),
            PathBuf::from("/data/scheduling/instances/parameters.json")
        );
        assert_eq!(dp.pv_pvgis_data(), PathBuf::from("/data/pv/pvgis_data"));
    }

    #[test]
    fn failures_keep_their_causes() {
        let err: Result<(), EapError> = Err(EapError::MissingGroundTruth("2_2_9".into()));
        let err = Error::from(err.context("Instance file instancia_2_2_9.txt").unwrap_err());
        let failure = Failure::skipped(PathBuf::from("instancia_2_2_9.txt"), &err);
        assert!(failure.message.starts_with("Instance file instancia_2_2_9.txt: "));
        assert!(failure.message.contains("2_2_9"));
    }

    #[test]
    fn parameters_of_no_records() {
        let params = Parameters::default();
        assert_eq!(parameters_from_records(&[], &params), None);
    }
}
