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

#[macro_use]
extern crate clap;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use failure::{Error, ResultExt};
use log::{info, LevelFilter};

use eapdata::asplain::AsPlain;
use eapdata::package::{self, DataPackage};
use eapdata::*;

// Funciones auxiliares -----------------------------------------------------------------------

fn readfile(path: &Path) -> Result<String, Error> {
    let contents = fs::read_to_string(path)
        .context(format!("File {} not found or not readable", path.display()))?;
    Ok(contents)
}

fn writefile(path: &Path, content: &[u8]) {
    if let Err(err) = fs::write(path, content) {
        eprintln!("ERROR: could not write to \"{}\": {}", path.display(), err);
        exit(exitcode::IOERR);
    }
}

/// Exit code for an error of a batch run
fn exit_code(err: &Error) -> i32 {
    let cause = err.find_root_cause();
    if cause.downcast_ref::<std::io::Error>().is_some() {
        exitcode::IOERR
    } else if let Some(EapError::InvalidParameter(_)) = cause.downcast_ref::<EapError>() {
        exitcode::CONFIG
    } else {
        exitcode::DATAERR
    }
}

fn exit_with(err: &Error, verbosity: u64) -> ! {
    eprintln!("ERROR: {}", err);
    for cause in err.iter_causes() {
        eprintln!("  caused by: {}", cause);
    }
    if verbosity > 2 {
        eprintln!("{}", err.backtrace());
    }
    exit(exit_code(err));
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

/// Numeric option, exits with a data error when it isn't a number
fn f64_arg(matches: &ArgMatches<'_>, name: &str) -> Option<f64> {
    if !matches.is_present(name) {
        return None;
    }
    Some(value_t!(matches, name, f64).unwrap_or_else(|_| {
        eprintln!(
            "ERROR: the value of {} is not a valid number: {}",
            name,
            matches.value_of(name).unwrap_or("")
        );
        exit(exitcode::DATAERR);
    }))
}

/// Data package from the --data option, if any
fn get_package(matches: &ArgMatches<'_>) -> Option<DataPackage> {
    let dp = matches.value_of("data").map(DataPackage::new);
    if let Some(ref dp) = dp {
        info!("Data package: \"{}\"", dp.root().display());
    }
    dp
}

/// Path from an option, falling back to the data package layout
fn get_path(
    matches: &ArgMatches<'_>,
    name: &str,
    dp: &Option<DataPackage>,
    from_package: fn(&DataPackage) -> PathBuf,
) -> PathBuf {
    if let Some(value) = matches.value_of(name) {
        PathBuf::from(value)
    } else if let Some(dp) = dp {
        from_package(dp)
    } else {
        eprintln!("ERROR: --{} or --data must be given", name);
        exit(exitcode::USAGE);
    }
}

/// Parámetros: argumentos de CLI > archivo de parámetros > valores por defecto
fn get_parameters(
    matches: &ArgMatches<'_>,
    dp: &Option<DataPackage>,
    verbosity: u64,
) -> Parameters {
    let mut params = if let Some(file) = matches.value_of("params") {
        let path = Path::new(file);
        match package::read_parameters(path) {
            Ok(params) => {
                println!("Parameters (file): \"{}\"", path.display());
                params
            }
            Err(err) => exit_with(&err, verbosity),
        }
    } else {
        Parameters::default()
    };

    if let Some(v) = f64_arg(matches, "v_min") {
        params.v_min = v;
    }
    if let Some(v) = f64_arg(matches, "v_max") {
        params.v_max = v;
    }
    if let Some(v) = f64_arg(matches, "v_step") {
        params.v_step = v;
    }
    if let Some(v) = f64_arg(matches, "alpha") {
        params.alpha = v;
    }
    if let Some(v) = f64_arg(matches, "beta") {
        params.beta = v;
    }
    if let Some(v) = f64_arg(matches, "coverage") {
        params.input_energy_coverage = v;
    }
    if let Some(v) = f64_arg(matches, "average_input_energy") {
        params.average_input_energy = Some(v);
    }
    if let Some(v) = f64_arg(matches, "peak_capacity") {
        params.assumed_peak_capacity = v;
    }
    if let Some(key) = matches.value_of("reference_key") {
        params.reference_amplifier_key = key.to_string();
    }

    // Energía externa media a partir de un perfil PV
    if let Some(file) = matches.value_of("pv_profile") {
        let path = pv_profile_path(file, dp);
        let path = path.as_path();
        let statistic = matches
            .value_of("pv_statistic")
            .unwrap_or("median")
            .parse::<Statistic>()
            .unwrap_or_else(|_| {
                eprintln!("ERROR: unknown PV statistic");
                exit(exitcode::USAGE);
            });
        let daily = readfile(path)
            .and_then(|s| Ok(s.parse::<DailyEnergy>()?))
            .unwrap_or_else(|err| exit_with(&err, verbosity));
        match daily.statistic(statistic) {
            Some(value) => {
                println!(
                    "Average input energy ({} of {} days in \"{}\"): {:.3}",
                    statistic,
                    daily.days.len(),
                    path.display(),
                    value
                );
                params.average_input_energy = Some(value);
            }
            None => {
                eprintln!("ERROR: the PV profile \"{}\" has no samples", path.display());
                exit(exitcode::DATAERR);
            }
        }
    }

    if let Err(err) = params.validate() {
        eprintln!("ERROR: {}", err);
        exit(exitcode::CONFIG);
    }
    if verbosity > 1 {
        println!("Parameters: {:?}", params);
    }
    params
}

/// Perfil PV: la ruta indicada o, con --data, el perfil con ese nombre en pv/pvgis_data
fn pv_profile_path(value: &str, dp: &Option<DataPackage>) -> PathBuf {
    let path = PathBuf::from(value);
    match dp {
        Some(dp) if !path.exists() => {
            let mut in_package = dp.pv_pvgis_data().join(value);
            if in_package.extension().is_none() {
                in_package.set_extension("csv");
            }
            in_package
        }
        _ => path,
    }
}

fn get_makespans(path: &Path, verbosity: u64) -> MakespanTable {
    let table = MakespanTable::read(path).unwrap_or_else(|err| exit_with(&err, verbosity));
    println!(
        "Best known makespans: \"{}\" ({} instances)",
        path.display(),
        table.len()
    );
    table
}

// Subcomandos ----------------------------------------------------------------------------------

fn run_transform(matches: &ArgMatches<'_>, verbosity: u64) {
    let dp = get_package(matches);
    let input_dir = get_path(matches, "instances", &dp, DataPackage::raw_instances);
    let makespans_path = get_path(matches, "makespans", &dp, DataPackage::makespans);
    let output_dir = get_path(matches, "output", &dp, DataPackage::json_instances);
    let schema_path = matches
        .value_of("schema")
        .map(PathBuf::from)
        .or_else(|| dp.as_ref().map(DataPackage::schema_json))
        .unwrap_or_else(|| output_dir.join(package::SCHEMA_FILE));

    let params = get_parameters(matches, &dp, verbosity);
    let makespans = get_makespans(&makespans_path, verbosity);
    let assembler = Assembler::new(&makespans, params).unwrap_or_else(|err| {
        eprintln!("ERROR: {}", err);
        exit(exitcode::CONFIG);
    });

    println!("Raw instances: \"{}\"", input_dir.display());
    let report = package::transform_dir(
        &assembler,
        &input_dir,
        &output_dir,
        &schema_path,
        matches.is_present("fail_fast"),
    )
    .unwrap_or_else(|err| exit_with(&err, verbosity));

    if verbosity > 0 {
        println!("Records: \"{}\"", output_dir.display());
        println!("Schema: \"{}\"", schema_path.display());
    }
    println!("{}", report.to_plain());
    if !report.failures.is_empty() {
        exit(exitcode::DATAERR);
    }
}

fn run_annotate(matches: &ArgMatches<'_>, verbosity: u64) {
    let dp = get_package(matches);
    let dir = get_path(matches, "output", &dp, DataPackage::json_instances);
    let params = get_parameters(matches, &dp, verbosity);
    let makespans = matches
        .value_of("makespans")
        .map(|m| get_makespans(Path::new(m), verbosity));

    let annotator = PvScalingAnnotator::from_parameters(&params).unwrap_or_else(|err| {
        eprintln!("ERROR: {}", err);
        exit(exitcode::CONFIG);
    });
    println!(
        "PV reference: peak capacity {:.1}, velocity {}",
        params.assumed_peak_capacity, params.reference_amplifier_key
    );

    let report = package::annotate_dir(
        &annotator,
        &params,
        &dir,
        makespans.as_ref(),
        matches.is_present("fail_fast"),
    )
    .unwrap_or_else(|err| exit_with(&err, verbosity));

    if let Some(file) = matches.value_of("stats") {
        let path = Path::new(file);
        let json = serde_json::to_string_pretty(&report.stats).unwrap_or_else(|err| {
            eprintln!("ERROR: could not convert the statistics to JSON: {}", err);
            exit(exitcode::SOFTWARE);
        });
        writefile(path, json.as_bytes());
        if verbosity > 0 {
            println!("Statistics: \"{}\"", path.display());
        }
    }
    println!("{}", report.to_plain());
    if !report.failures.is_empty() {
        exit(exitcode::DATAERR);
    }
}

fn run_makespans(matches: &ArgMatches<'_>, verbosity: u64) {
    let dp = get_package(matches);
    let path = get_path(matches, "makespans", &dp, DataPackage::makespans);
    let table = get_makespans(&path, verbosity);
    println!("{}", table.summary().to_plain());
}

// Función principal ------------------------------------------------------------------------------

fn main() {
    let data_arg = Arg::with_name("data")
        .short("d")
        .long("data")
        .value_name("DATA_DIR")
        .help("Root of the data package (pv/, scheduling/)")
        .takes_value(true)
        .display_order(1);
    let makespans_arg = Arg::with_name("makespans")
        .short("m")
        .long("makespans")
        .value_name("MAKESPANS_FILE")
        .help("Best known makespans (jobs stages instance makespan)")
        .takes_value(true)
        .display_order(2);
    let output_arg = Arg::with_name("output")
        .short("o")
        .long("output")
        .value_name("RECORDS_DIR")
        .help("Directory of the JSON instance records")
        .takes_value(true)
        .display_order(3);
    let params_arg = Arg::with_name("params")
        .short("p")
        .long("params")
        .value_name("PARAMETERS_FILE")
        .help("JSON parameters document, overridden by the options below")
        .takes_value(true)
        .display_order(4);
    let fail_fast_arg = Arg::with_name("fail_fast")
        .long("fail_fast")
        .help("Stop at the first instance that fails");
    let number_arg = |name: &'static str, help: &'static str| {
        Arg::with_name(name)
            .long(name)
            .value_name("NUMBER")
            .help(help)
            .takes_value(true)
    };

    let matches = App::new("EapData")
        .bin_name("eapdata")
        .version(env!("CARGO_PKG_VERSION"))
        .about("EapData - Energy aware flow shop scheduling instances and PV coupling.")
        .setting(AppSettings::NextLineHelp)
        .arg(Arg::with_name("showlicense")
            .short("L")
            .long("license")
            .help("Shows the license of the program (MIT)"))
        .arg(Arg::with_name("v")
            .short("v")
            .multiple(true)
            .global(true)
            .help("Sets the level of verbosity"))
        .subcommand(SubCommand::with_name("transform")
            .about("Transforms raw benchmark instances into energy annotated JSON records")
            .arg(data_arg.clone())
            .arg(Arg::with_name("instances")
                .short("i")
                .long("instances")
                .value_name("RAW_DIR")
                .help("Directory of the raw instances (instancia_<jobs>_<stages>_<id>.txt)")
                .takes_value(true)
                .display_order(2))
            .arg(makespans_arg.clone())
            .arg(output_arg.clone())
            .arg(Arg::with_name("schema")
                .long("schema")
                .value_name("SCHEMA_FILE")
                .help("Output JSON schema of the records")
                .takes_value(true))
            .arg(params_arg.clone())
            .arg(number_arg("v_min", "Lowest velocity"))
            .arg(number_arg("v_max", "Highest velocity (inclusive)"))
            .arg(number_arg("v_step", "Velocity step"))
            .arg(number_arg("alpha", "Energy model scale"))
            .arg(number_arg("beta", "Energy model exponent"))
            .arg(number_arg("coverage", "Fraction of the schedule covered by the external energy"))
            .arg(number_arg("average_input_energy", "Average external energy input (derives alpha)")
                .conflicts_with("pv_profile"))
            .arg(Arg::with_name("pv_profile")
                .long("pv_profile")
                .value_name("PV_CSV")
                .help("PV generation profile (ds, power) whose daily energy derives alpha. With --data, a bare name (e.g. madrid) is looked up in pv/pvgis_data")
                .takes_value(true))
            .arg(Arg::with_name("pv_statistic")
                .long("pv_statistic")
                .value_name("STATISTIC")
                .possible_values(&["mean", "median"])
                .requires("pv_profile")
                .help("Statistic of the daily PV energy")
                .takes_value(true))
            .arg(fail_fast_arg.clone()))
        .subcommand(SubCommand::with_name("annotate")
            .about("Adds the PV scaling factor to the JSON records of a directory")
            .arg(data_arg.clone())
            .arg(output_arg)
            .arg(makespans_arg.clone())
            .arg(params_arg)
            .arg(number_arg("peak_capacity", "PV capacity of the reference profile"))
            .arg(Arg::with_name("reference_key")
                .long("reference_key")
                .value_name("VELOCITY")
                .help("Velocity whose amplifier defines the typical load (e.g. 1.8)")
                .takes_value(true))
            .arg(Arg::with_name("stats")
                .long("stats")
                .value_name("STATS_FILE")
                .help("Output JSON file with the indicators of every record")
                .takes_value(true))
            .arg(fail_fast_arg))
        .subcommand(SubCommand::with_name("makespans")
            .about("Summary of the best known makespans")
            .arg(data_arg)
            .arg(makespans_arg))
        .get_matches();

    if matches.is_present("showlicense") {
        println!(
            "
Copyright (c) 2025  Energy aware production data authors

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the 'Software'), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in
all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED 'AS IS', WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE."
        );
        exit(exitcode::OK);
    }

    // Prólogo ------------------------------------------------------------------------------------

    let verbosity = match matches.subcommand() {
        (_, Some(sub)) => sub.occurrences_of("v").max(matches.occurrences_of("v")),
        _ => matches.occurrences_of("v"),
    };
    init_logging(verbosity);

    if verbosity > 2 {
        println!("Options: ----------");
        println!("{:#?}", matches);
        println!("------------------------------");
    }

    match matches.subcommand() {
        ("transform", Some(sub)) => run_transform(sub, verbosity),
        ("annotate", Some(sub)) => run_annotate(sub, verbosity),
        ("makespans", Some(sub)) => run_makespans(sub, verbosity),
        _ => {
            eprintln!("ERROR: a subcommand is needed (transform, annotate, makespans)");
            exit(exitcode::USAGE);
        }
    }
}
