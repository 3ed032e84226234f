// Reading ballots stored as JSON objects mapping candidate names to ranks.

use crate::rp::io_common::{make_default_id, parse_rank_js};
use crate::rp::*;

fn parse_ballot(id: String, js: &JSValue) -> RpResult<ParsedBallot> {
    let obj = js.as_object().context(BallotNotAnObjectSnafu {
        ballot: id.clone(),
        content: js.to_string(),
    })?;
    let mut ranks: Vec<(String, Rank)> = Vec::new();
    for (name, value) in obj.iter() {
        let r = parse_rank_js(&id, name, value)?;
        ranks.push((name.clone(), r));
    }
    Ok(ParsedBallot {
        id: Some(id),
        count: None,
        choices: ParsedChoices::Ranked(ranks),
    })
}

/// A JSON array of ballots.
pub fn read_json(path: String) -> BRpResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path: path.clone() })?;
    Ok(parse_json_str(&path, &contents)?)
}

pub fn parse_json_str(path: &str, contents: &str) -> RpResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let js: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    let arr = js.as_array().context(VotesNotAListSnafu {})?;
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, ballot_js) in arr.iter().enumerate() {
        res.push(parse_ballot(default_id(idx + 1), ballot_js)?);
    }
    debug!("parse_json_str: {:?} ballots", res.len());
    Ok(res)
}

/// One JSON ballot per line. Empty lines are skipped.
pub fn read_jsonl(path: String) -> BRpResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path: path.clone() })?;
    Ok(parse_jsonl_str(&path, &contents)?)
}

pub fn parse_jsonl_str(path: &str, contents: &str) -> RpResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let js: JSValue = serde_json::from_str(line).context(ParsingJsonLineSnafu { lineno })?;
        res.push(parse_ballot(default_id(lineno), &js)?);
    }
    debug!("parse_jsonl_str: {:?} ballots", res.len());
    Ok(res)
}
