mod config_reader;
mod io_preflib;
mod report;

use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use tied_stv::*;

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::election::config_reader::*;
use crate::election::io_preflib::*;
use crate::election::report::*;

#[derive(Debug, Snafu)]
pub enum TiedStvError {
    #[snafu(display("Error opening dataset {path}"))]
    OpeningDataset {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Line {lineno}: could not parse the preferences {content:?}"))]
    ParsingPreference { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: the ballot count {content:?} is not a positive integer"))]
    ParsingCount { lineno: usize, content: String },
    #[snafu(display("Line {lineno}: could not read the alternative name {content:?}"))]
    ParsingAlternative { lineno: usize, content: String },
    #[snafu(display("Error opening json file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Missing parent directory for {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid election: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TsResult<T> = Result<T, TiedStvError>;

/// The options of a run, once the command line and the configuration file are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub contest_name: String,
    pub input: String,
    pub out: Option<String>,
    pub reference: Option<String>,
    pub search: bool,
    pub search_mode: SearchMode,
}

pub fn resolve_settings(args: &Args) -> TsResult<RunSettings> {
    let config: Option<TiedStvConfig> = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    debug!("resolve_settings: config: {:?}", config);

    let input: String = match (&args.input, &config, &args.config) {
        (Some(i), _, _) => i.clone(),
        (None, Some(c), Some(config_path)) => {
            match c.dataset_source.provider.as_deref() {
                None | Some("preflib") => {}
                Some(x) => whatever!("Provider not implemented {:?}", x),
            }
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?;
            root_p
                .join(c.dataset_source.file_path.as_str())
                .display()
                .to_string()
        }
        _ => whatever!("No dataset to read: use the --input or the --config option"),
    };

    let search_settings = config.as_ref().and_then(|c| c.search.clone());
    let search = !args.no_search
        && search_settings
            .as_ref()
            .and_then(|s| s.enabled)
            .unwrap_or(true);
    let parallel = args.parallel
        || search_settings
            .as_ref()
            .and_then(|s| s.parallel)
            .unwrap_or(false);

    Ok(RunSettings {
        contest_name: config
            .as_ref()
            .map(|c| c.output_settings.contest_name.clone())
            .unwrap_or_else(|| simplify_file_name(input.as_str())),
        out: args.out.clone().or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.output_settings.output_path.clone())
        }),
        reference: args.reference.clone(),
        search,
        search_mode: if parallel {
            SearchMode::Parallel
        } else {
            SearchMode::Sequential
        },
        input,
    })
}

fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn run_election(settings: &RunSettings) -> TsResult<()> {
    info!("run_election: settings: {:?}", settings);
    let dataset = read_preflib(settings.input.as_str())?;
    info!(
        "run_election: {} candidates, {} ballot types",
        dataset.candidates.len(),
        dataset.ballots.len()
    );

    let result = tabulate(&dataset.candidates, &dataset.ballots).context(VotingSnafu {})?;
    print_tabulation(&result, &dataset.names);

    let manipulation: Option<Option<ManipulationResult>> = if settings.search {
        let start = Instant::now();
        let found = find_smallest_coalition_with(
            &dataset.candidates,
            &dataset.ballots,
            settings.search_mode,
        )
        .context(VotingSnafu {})?;
        let runtime = start.elapsed();
        print_manipulation(&result, found.as_ref(), &dataset.names, runtime);
        Some(found)
    } else {
        info!("run_election: manipulation search skipped");
        None
    };

    // Assemble the final json
    let result_js = build_summary_js(
        settings.contest_name.as_str(),
        &dataset,
        &result,
        manipulation.as_ref().map(|m| m.as_ref()),
    )?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match settings.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            fs::write(path, pretty_js_stats.as_bytes()).context(WritingOutputSnafu { path })?;
            info!("run_election: summary written to {}", path);
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        let summary_ref: JSValue = read_summary(summary_p.as_str())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_election_test(test_name: &str) -> TsResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
        let args = Args {
            config: Some(format!("{}/{}_config.json", test_dir, test_name)),
            reference: Some(format!("{}/{}_expected_summary.json", test_dir, test_name)),
            ..Args::default()
        };
        let settings = resolve_settings(&args)?;
        run_election(&settings)
    }

    fn test_wrapper(test_name: &str) {
        if let Err(e) = run_election_test(test_name) {
            panic!("Test {} failed: {}", test_name, e);
        }
    }

    #[test]
    fn three_way() {
        test_wrapper("three_way");
    }

    #[test]
    fn coalition() {
        test_wrapper("coalition");
    }

    #[test]
    fn settings_from_config() {
        let test_dir = format!("{}/tests/data/coalition", env!("CARGO_MANIFEST_DIR"));
        let args = Args {
            config: Some(format!("{}/coalition_config.json", test_dir)),
            ..Args::default()
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.contest_name, "Coalition");
        assert_eq!(settings.input, format!("{}/coalition.toi", test_dir));
        assert!(settings.search);
        assert_eq!(settings.search_mode, SearchMode::Parallel);
        assert_eq!(settings.out, None);
    }

    #[test]
    fn command_line_overrides_config() {
        let test_dir = format!("{}/tests/data/coalition", env!("CARGO_MANIFEST_DIR"));
        let args = Args {
            config: Some(format!("{}/coalition_config.json", test_dir)),
            input: Some("other.toi".to_string()),
            out: Some("stdout".to_string()),
            no_search: true,
            ..Args::default()
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.input, "other.toi");
        assert_eq!(settings.out, Some("stdout".to_string()));
        assert!(!settings.search);
    }

    #[test]
    fn input_without_config() {
        let args = Args {
            input: Some("data/board_2021.toi".to_string()),
            ..Args::default()
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.contest_name, "board_2021");
        assert_eq!(settings.search_mode, SearchMode::Sequential);
        assert!(settings.search);
    }

    #[test]
    fn missing_input() {
        assert!(resolve_settings(&Args::default()).is_err());
    }
}
