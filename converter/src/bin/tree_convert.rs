//! Conversion tool for light-injection calibration runs.
//!
//! Reads a simulation file, converts raw or digitized hits into PMT-relative
//! observables and writes the four-table store consumed by the calibration
//! fit.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info, warn, LevelFilter};

use converter::convert::{run_conversion, ConvertConfig, ConvertError};
use converter::geometry::GeometryError;
use converter::hits::HitMode;
use converter::input::SimulationFile;

const DEFAULT_WAVELENGTH_NM: f64 = 400.0;
const DEFAULT_ABWFF: f64 = 1.3;
const DEFAULT_RAYFF: f64 = 0.75;

#[derive(Parser, Debug)]
#[command(
    name = "tree_convert",
    about = "Converts simulated light-injection events into PMT-relative observables",
    long_about = None
)]
struct Args {
    /// Input file
    #[arg(short = 'f')]
    input: Option<PathBuf>,

    /// Output file
    #[arg(short = 'o', default_value = "out.json")]
    output: PathBuf,

    /// Laser wavelength in nm
    #[arg(short = 'l', default_value_t = DEFAULT_WAVELENGTH_NM, allow_negative_numbers = true)]
    wavelength: f64,

    /// Apply diffuser profile reweight
    #[arg(short = 'w')]
    diffuser_profile: bool,

    /// Reweight the attenuation factor with the given linear z slope
    #[arg(short = 'z', allow_negative_numbers = true)]
    slope: Option<f64>,

    /// Water parameters for the attenuation reweight, "ABWFF,RAYFF"
    #[arg(short = 'p')]
    water_params: Option<String>,

    /// Use only the standalone large PMTs
    #[arg(short = 'b')]
    no_modular: bool,

    /// Use raw Cherenkov hits and perform ad-hoc digitization
    #[arg(short = 'd')]
    raw_hits: bool,

    /// Use separated triggers
    #[arg(short = 't')]
    separated_triggers: bool,

    /// Verbose
    #[arg(short = 'v')]
    verbose: bool,

    /// Start event
    #[arg(short = 's', default_value_t = 0, allow_negative_numbers = true)]
    start_event: i64,

    /// End event
    #[arg(short = 'e', default_value_t = 0, allow_negative_numbers = true)]
    end_event: i64,

    /// RNG seed
    #[arg(short = 'r', default_value_t = 0, allow_negative_numbers = true)]
    seed: i64,
}

/// Parse the "ABWFF,RAYFF" override pair. Non-positive or unparsable values
/// are skipped, leaving the defaults in place.
fn parse_water_params(arg: Option<&str>) -> (f64, f64) {
    let mut abwff = DEFAULT_ABWFF;
    let mut rayff = DEFAULT_RAYFF;
    if let Some(list) = arg {
        for (i, item) in list.split(',').take(2).enumerate() {
            match item.trim().parse::<f64>() {
                Ok(val) if val > 0.0 => {
                    if i == 0 {
                        abwff = val;
                    } else {
                        rayff = val;
                    }
                }
                _ => debug!("ignoring water parameter entry {i}: {item:?}"),
            }
        }
        info!("water parameters: ABWFF = {abwff}, RAYFF = {rayff}");
    }
    (abwff, rayff)
}

fn config_from_args(args: &Args) -> ConvertConfig {
    let mut wavelength = args.wavelength;
    if wavelength < 0.0 {
        warn!("wavelength < 0, using default = {DEFAULT_WAVELENGTH_NM} nm");
        wavelength = DEFAULT_WAVELENGTH_NM;
    }

    let slope = args.slope.filter(|s| s.abs() > 1e-9);
    if let Some(s) = slope {
        info!("reweighing attenuation factor with linear z-dependence, slope = {s}");
    }

    let (abwff, rayff) = parse_water_params(args.water_params.as_deref());

    ConvertConfig {
        wavelength_nm: wavelength,
        diffuser_profile: args.diffuser_profile,
        attenuation_slope: slope,
        abwff,
        rayff,
        modular_enabled: !args.no_modular,
        mode: if args.raw_hits {
            HitMode::Raw
        } else {
            HitMode::Digitized
        },
        separated_triggers: args.separated_triggers,
        start_event: args.start_event.max(0) as usize,
        end_event: (args.end_event > 0).then_some(args.end_event as usize),
        seed: args.seed.max(0) as u64,
    }
}

// Exit codes follow the conversion tool's convention: 9 when the mandatory
// geometry or options metadata is empty, 255 when the input file is
// missing or unreadable.
const EXIT_EMPTY_METADATA: u8 = 9;
const EXIT_BAD_INPUT: u8 = 255;

fn run(args: &Args) -> Result<(), u8> {
    let Some(input) = &args.input else {
        error!("no input file given");
        return Err(EXIT_BAD_INPUT);
    };

    let text = fs::read_to_string(input).map_err(|e| {
        error!("could not open input file {}: {e}", input.display());
        EXIT_BAD_INPUT
    })?;
    let file: SimulationFile = serde_json::from_str(&text).map_err(|e| {
        error!("could not parse input file {}: {e}", input.display());
        EXIT_BAD_INPUT
    })?;

    let config = config_from_args(args);
    let tables = run_conversion(&file, &config).map_err(|e| {
        error!("{e}");
        match e {
            ConvertError::Geometry(GeometryError::EmptyGeometry) | ConvertError::EmptyOptions => {
                EXIT_EMPTY_METADATA
            }
            _ => 1,
        }
    })?;

    let out = fs::File::create(&args.output).map_err(|e| {
        error!("could not open output file {}: {e}", args.output.display());
        1u8
    })?;
    serde_json::to_writer(std::io::BufWriter::new(out), &tables).map_err(|e| {
        error!("could not write output: {e}");
        1u8
    })?;
    info!("wrote {}", args.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_params_accept_positive_pairs() {
        assert_eq!(parse_water_params(Some("1.1,0.9")), (1.1, 0.9));
    }

    #[test]
    fn water_params_skip_non_positive_entries() {
        assert_eq!(
            parse_water_params(Some("-1.0,0.9")),
            (DEFAULT_ABWFF, 0.9)
        );
        assert_eq!(
            parse_water_params(Some("0,0")),
            (DEFAULT_ABWFF, DEFAULT_RAYFF)
        );
        assert_eq!(
            parse_water_params(None),
            (DEFAULT_ABWFF, DEFAULT_RAYFF)
        );
    }

    #[test]
    fn negative_wavelength_resets_to_default() {
        let args = Args::parse_from(["tree_convert", "-f", "in.json", "-l", "-20"]);
        let config = config_from_args(&args);
        assert_eq!(config.wavelength_nm, DEFAULT_WAVELENGTH_NM);
    }

    #[test]
    fn tiny_slope_leaves_attenuation_disabled() {
        let args = Args::parse_from(["tree_convert", "-f", "in.json", "-z", "1e-12"]);
        let config = config_from_args(&args);
        assert!(config.attenuation_slope.is_none());
    }

    #[test]
    fn missing_input_reports_bad_input() {
        let args = Args::parse_from(["tree_convert", "-f", "/nonexistent/in.json"]);
        assert_eq!(run(&args), Err(EXIT_BAD_INPUT));
    }

    #[test]
    fn run_converts_a_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");

        let file = serde_json::json!({
            "geometry": {
                "half_length": 100.0,
                "radius": [1.0, 1.0],
                "single": [
                    {"position": [0.0, 0.0, -85.0], "orientation": [0.0, 0.0, 1.0]}
                ],
                "modular": []
            },
            "options": {"generator": "laser"},
            "events": [{
                "vertex": [0.0, 0.0, -95.0],
                "banks": [
                    {"raw_hits": [{"tube_id": 0, "photons": [
                        {"true_time": 100.0, "start_time": 0.0}
                    ]}]},
                    {}
                ]
            }]
        });
        fs::write(&input, serde_json::to_string(&file).unwrap()).unwrap();

        let args = Args::parse_from([
            "tree_convert",
            "-f",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-d",
        ]);
        assert_eq!(run(&args), Ok(()));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["pmt_type0"].as_array().unwrap().len(), 1);
        assert_eq!(written["hitRate_pmtType0"].as_array().unwrap().len(), 1);
        assert_eq!(written["hitRate_pmtType0"][0]["nPE"], 1.0);
    }

    #[test]
    fn start_event_and_seed_clamp_to_zero() {
        let args = Args::parse_from([
            "tree_convert",
            "-f",
            "in.json",
            "-s",
            "-5",
            "-r",
            "-3",
            "-e",
            "7",
        ]);
        let config = config_from_args(&args);
        assert_eq!(config.start_event, 0);
        assert_eq!(config.seed, 0);
        assert_eq!(config.end_event, Some(7));
    }
}
