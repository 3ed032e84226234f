use log::{debug, info, warn};

use ranked_pairs::builder::Builder;
use ranked_pairs::election::Election;
use ranked_pairs::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rp::config_reader::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_json;

#[derive(Debug, Snafu)]
pub enum RpError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in the Excel file"))]
    EmptyExcel {},
    #[snafu(display(
        "Found {count} worksheets in {path}, the name of the worksheet must be provided"
    ))]
    AmbiguousExcelWorksheet { path: String, count: usize },
    #[snafu(display("Unexpected cell on line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error parsing JSON on line {lineno}"))]
    ParsingJsonLine {
        source: serde_json::Error,
        lineno: usize,
    },
    #[snafu(display("Expected a positive number or a column name"))]
    ParsingJsonNumber {},
    #[snafu(display("The votes must be a list of objects"))]
    VotesNotAList {},
    #[snafu(display("Ballot {ballot} is not an object: {content}"))]
    BallotNotAnObject { ballot: String, content: String },
    #[snafu(display("Ballot {ballot}: invalid rank {value} for candidate {candidate}"))]
    InvalidRank {
        ballot: String,
        candidate: String,
        value: String,
    },
    #[snafu(display("Ballot {ballot}: invalid count {value}"))]
    InvalidCount { ballot: String, value: String },
    #[snafu(display("Error opening the CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error parsing a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineToShort { lineno: usize },
    #[snafu(display("Missing header row"))]
    MissingHeader {},
    #[snafu(display("Missing parent directory"))]
    MissingParentDir {},
    #[snafu(display("Unknown input type {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("No input was provided, use --config or --input"))]
    MissingInput {},
    #[snafu(display("Tabulation failed: {source}"))]
    Voting { source: VotingErrors },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type RpResult<T> = Result<T, RpError>;
type BRpResult<T> = Result<T, Box<RpError>>;

/// The content of a ballot, as read from a file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ParsedChoices {
    /// The names of the choices, most preferred first.
    Ordered(Vec<String>),
    /// The rank of each candidate (higher is preferred).
    Ranked(Vec<(String, Rank)>),
}

/// A ballot, as parsed by the readers
/// This is before dropping unknown or excluded candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: Option<String>,
    pub count: Option<u64>,
    pub choices: ParsedChoices,
}

fn result_stats_to_json(rs: &RankedPairsResult<String>, full_order: bool) -> JSValue {
    let pairs: Vec<JSValue> = rs
        .ranked_pairs
        .iter()
        .map(|p| {
            json!({
                "winner": p.winner,
                "loser": p.loser,
                "strength": p.strength,
                "opposition": p.opposition
            })
        })
        .collect();

    // Only the first round decides the winners.
    let num_rounds = if full_order { rs.round_stats.len() } else { 1 };
    let rounds: Vec<JSValue> = rs
        .round_stats
        .iter()
        .take(num_rounds)
        .map(|round_stat| {
            let locked: Vec<JSValue> = round_stat
                .locked
                .iter()
                .map(|(w, l)| json!({"winner": w, "loser": l}))
                .collect();
            json!({
                "round": round_stat.round,
                "winners": round_stat.winners,
                "locked": locked
            })
        })
        .collect();

    let mut res = json!({
        "winners": rs.winners,
        "pairs": pairs,
        "rounds": rounds
    });
    if full_order {
        res["finishOrder"] = json!(rs.finish_order);
    }
    res
}

fn build_summary_js(config: &RpConfig, rv: &RankedPairsResult<String>, full_order: bool) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_juridiction.clone(),
        office: config.output_settings.contest_office.clone(),
    };
    json!({
        "config": c,
        "results": result_stats_to_json(rv, full_order) })
}

fn read_ranking_data(root_path: &Path, cfs: &FileSource) -> BRpResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    match cfs.provider.as_str() {
        "json" => io_json::read_json(p2),
        "jsonl" => io_json::read_jsonl(p2),
        "csv" => io_csv::read_csv_ranking(p2, cfs),
        "csv_scores" => io_csv::read_csv_scores(p2, cfs),
        "xlsx_scores" => io_excel::read_excel_scores(p2, cfs),
        x => Err(Box::new(RpError::UnknownProvider {
            provider: x.to_string(),
        })),
    }
}

// Drops the blank entries, and the candidates that are not part of the election.
fn keep_choice(ballot_id: &Option<String>, name: &str, candidates: Option<&[String]>) -> bool {
    if name.is_empty() {
        return false;
    }
    match candidates {
        Some(cands) if !cands.iter().any(|c| c == name) => {
            warn!(
                "validate_ballots: ballot_id {:?}: skipping choice {:?}",
                ballot_id, name
            );
            false
        }
        _ => true,
    }
}

/// Turns the parsed ballots into votes.
///
/// `candidates` are the registered candidates, if any. Entries naming someone
/// else are dropped.
fn validate_ballots(
    parsed_ballots: &[ParsedBallot],
    candidates: Option<&[String]>,
) -> RpResult<Vec<Ballot<String>>> {
    let mut builder: Builder<String> = match candidates {
        Some(cands) => Builder::new().candidates(cands).context(VotingSnafu {})?,
        None => Builder::new(),
    };

    for pb in parsed_ballots.iter() {
        // Default of 1 if not specified
        let count = pb.count.unwrap_or(1);
        let added = match &pb.choices {
            ParsedChoices::Ordered(names) => {
                let kept: Vec<String> = names
                    .iter()
                    .filter(|n| keep_choice(&pb.id, n, candidates))
                    .cloned()
                    .collect();
                debug!("Choices for ballot {:?}: {:?}", pb.id, kept);
                builder.add_vote_ordered_weighted(&kept, count)
            }
            ParsedChoices::Ranked(ranks) => {
                let kept: Vec<(String, Rank)> = ranks
                    .iter()
                    .filter(|(n, _)| keep_choice(&pb.id, n, candidates))
                    .cloned()
                    .collect();
                debug!("Ranks for ballot {:?}: {:?}", pb.id, kept);
                builder.add_vote_weighted(&kept, count)
            }
        };
        added.context(VotingSnafu {})?;
    }
    Ok(builder.votes().to_vec())
}

fn validate_rules(rules: &Option<RpRules>) -> RpResult<bool> {
    let rules = match rules {
        Some(r) => r,
        None => return Ok(false),
    };
    match rules.voting_method.as_deref() {
        None | Some("rankedPairs") => {}
        Some(x) => {
            whatever!("Cannot use voting method {:?}: only rankedPairs is supported", x)
        }
    }
    Ok(rules.compute_full_order.unwrap_or(false))
}

/// Registered candidates, without the excluded ones.
fn registered_candidates(config: &RpConfig) -> Option<Vec<String>> {
    config.candidates.as_ref().map(|cands| {
        cands
            .iter()
            .filter(|c| !c.excluded.unwrap_or(false))
            .map(|c| c.name.clone())
            .collect()
    })
}

/// Runs the election described by the configuration and returns the summary.
///
/// The paths of the ballot files are relative to `root_path`.
pub fn run_election(config: &RpConfig, root_path: &Path) -> RpResult<JSValue> {
    info!("config: {:?}", config);
    let full_order = validate_rules(&config.rules)?;

    if config.cvr_file_sources.is_empty() {
        return MissingInputSnafu {}.fail();
    }

    let mut parsed: Vec<ParsedBallot> = Vec::new();
    for cfs in config.cvr_file_sources.iter() {
        let mut file_data = read_ranking_data(root_path, cfs).map_err(|e| *e)?;
        parsed.append(&mut file_data);
    }
    info!("Read {:?} ballots", parsed.len());

    let registered = registered_candidates(config);
    let votes = validate_ballots(&parsed, registered.as_deref())?;

    let (candidates, votes) = match registered {
        Some(cands) => (cands, votes),
        None => {
            let election = Election::with_votes(RankedPairs, votes);
            (election.candidates().to_vec(), election.votes().to_vec())
        }
    };

    let result = run_ranked_pairs_stats(&candidates, &votes).context(VotingSnafu {})?;
    info!("winners: {:?}", result.winners);

    Ok(build_summary_js(config, &result, full_order))
}

// Builds the configuration from the command line, or reads it from the config file
// and applies the overrides from the command line.
fn load_config(args: &Args) -> RpResult<(RpConfig, PathBuf)> {
    let (mut config, root_path) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path.clone()).map_err(|e| *e)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root_p)
        }
        None => (RpConfig::default(), PathBuf::new()),
    };

    if let Some(input) = &args.input {
        let provider = args.input_type.clone().unwrap_or_else(|| "json".to_string());
        let mut cfs = FileSource::new(provider, input.clone());
        cfs.excel_worksheet_name = args.excel_worksheet_name.clone();
        config.cvr_file_sources = vec![cfs];
    }

    if let Some(cands) = &args.candidates {
        config.candidates = Some(
            cands
                .iter()
                .map(|name| RpCandidate {
                    name: name.clone(),
                    code: None,
                    excluded: None,
                })
                .collect(),
        );
    }

    if args.full_order {
        let mut rules = config.rules.clone().unwrap_or_default();
        rules.compute_full_order = Some(true);
        config.rules = Some(rules);
    }

    if config.cvr_file_sources.is_empty() {
        return MissingInputSnafu {}.fail();
    }
    Ok((config, root_path))
}

/// Compares the summary with the reference. The differences are printed.
fn check_reference(pretty_js_stats: &str, summary_path: String) -> RpResult<()> {
    let summary_ref = read_summary(summary_path).map_err(|e| *e)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail();
    }
    info!("The summary matches the reference");
    Ok(())
}

pub fn run_election_cli(args: &Args) -> RpResult<()> {
    let (config, root_path) = load_config(args)?;
    let result_js = run_election(&config, &root_path)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(path) => {
            info!("Writing summary to {:?}", path);
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.clone() {
        check_reference(&pretty_js_stats, summary_p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    pub(crate) fn test_dir(test_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rptab-{}-{}", std::process::id(), test_name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn args_for(input: &Path, input_type: &str) -> Args {
        Args {
            config: None,
            reference: None,
            out: None,
            input: Some(input.display().to_string()),
            input_type: Some(input_type.to_string()),
            candidates: None,
            excel_worksheet_name: None,
            full_order: false,
            verbose: false,
        }
    }

    fn ordered(id: &str, names: &[&str]) -> ParsedBallot {
        ParsedBallot {
            id: Some(id.to_string()),
            count: None,
            choices: ParsedChoices::Ordered(names.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn unknown_and_blank_choices_are_dropped() {
        let candidates = vec!["A".to_string(), "B".to_string()];
        let ballots = vec![ordered("1", &["Z", "", "B", "A"])];
        let votes = validate_ballots(&ballots, Some(&candidates)).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].get("B"), Some(&2));
        assert_eq!(votes[0].get("A"), Some(&1));
        assert_eq!(votes[0].get("Z"), None);
    }

    #[test]
    fn counts_replicate_ballots() {
        let mut ballot = ordered("1", &["A", "B"]);
        ballot.count = Some(3);
        let votes = validate_ballots(&[ballot, ordered("2", &["B"])], None).unwrap();
        assert_eq!(votes.len(), 4);
    }

    #[test]
    fn only_ranked_pairs_is_supported() {
        let rules = RpRules {
            voting_method: Some("instantRunoff".to_string()),
            compute_full_order: None,
        };
        assert!(validate_rules(&Some(rules)).is_err());
        assert_eq!(validate_rules(&None).unwrap(), false);
    }

    #[test]
    fn run_from_config_with_excluded_candidate() {
        let dir = test_dir("config");
        fs::write(
            dir.join("ballots.json"),
            r#"[{"A": 3, "B": 2, "C": 1}, {"B": 3, "A": 2, "C": 1}, {"A": 3, "C": 2, "B": 1}]"#,
        )
        .unwrap();
        let config_path = dir.join("config.json");
        fs::write(
            &config_path,
            r#"{
                "outputSettings": {"contestName": "test"},
                "cvrFileSources": [{"provider": "json", "filePath": "ballots.json"}],
                "candidates": [{"name": "A"}, {"name": "B"}, {"name": "C", "excluded": true}],
                "rules": {"votingMethod": "rankedPairs", "computeFullOrder": true}
            }"#,
        )
        .unwrap();

        let config = read_config(config_path.display().to_string()).unwrap();
        let summary = run_election(&config, &dir).unwrap();
        assert_eq!(summary["config"]["contest"], json!("test"));
        assert_eq!(summary["results"]["winners"], json!(["A"]));
        assert_eq!(summary["results"]["finishOrder"], json!([["A"], ["B"]]));
        assert_eq!(
            summary["results"]["pairs"],
            json!([{"winner": "A", "loser": "B", "strength": 2, "opposition": 1}])
        );
    }

    #[test]
    fn candidates_are_derived_from_votes() {
        let dir = test_dir("derived");
        let input = dir.join("ballots.jsonl");
        fs::write(&input, "{\"A\": 1, \"B\": 2}\n\n{\"C\": 1}\n").unwrap();
        let mut args = args_for(&input, "jsonl");
        args.full_order = true;
        let (config, root) = load_config(&args).unwrap();
        let summary = run_election(&config, &root).unwrap();
        // C is never beaten: A and C are tied, B and C are tied.
        assert_eq!(summary["results"]["winners"], json!(["B", "C"]));
        let order: Vec<BTreeSet<String>> =
            serde_json::from_value(summary["results"]["finishOrder"].clone()).unwrap();
        assert_eq!(order.len(), 2);
        assert_eq!(order[1], BTreeSet::from(["A".to_string()]));
        assert_eq!(summary["results"]["rounds"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn reference_is_checked() {
        let dir = test_dir("reference");
        let input = dir.join("ballots.json");
        fs::write(&input, r#"[{"A": 2, "B": 1}]"#).unwrap();
        let out = dir.join("summary.json");
        let mut args = args_for(&input, "json");
        args.out = Some(out.display().to_string());
        run_election_cli(&args).unwrap();

        // The summary that was just written is its own reference.
        args.reference = Some(out.display().to_string());
        run_election_cli(&args).unwrap();

        let wrong = dir.join("wrong.json");
        fs::write(&wrong, r#"{"config": {}, "results": {"winners": ["B"]}}"#).unwrap();
        args.reference = Some(wrong.display().to_string());
        assert!(matches!(
            run_election_cli(&args),
            Err(RpError::ReferenceMismatch {})
        ));
    }

    #[test]
    fn no_votes_is_reported() {
        let dir = test_dir("novotes");
        let input = dir.join("ballots.json");
        fs::write(&input, "[]").unwrap();
        let mut args = args_for(&input, "json");
        args.candidates = Some(vec!["A".to_string()]);
        assert!(matches!(
            run_election_cli(&args),
            Err(RpError::Voting {
                source: VotingErrors::NoVotes
            })
        ));
    }

    #[test]
    fn missing_input_is_reported() {
        let mut args = args_for(Path::new("unused"), "json");
        args.input = None;
        assert!(matches!(load_config(&args), Err(RpError::MissingInput {})));
    }

    #[test]
    fn unknown_provider_is_reported() {
        let args = args_for(Path::new("ballots.txt"), "ods");
        let (config, root) = load_config(&args).unwrap();
        assert!(matches!(
            run_election(&config, &root),
            Err(RpError::UnknownProvider { .. })
        ));
    }
}
