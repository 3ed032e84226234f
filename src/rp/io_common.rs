use std::path::Path;

use crate::rp::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Ids for the ballots that do not carry one: the file name and the line number.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Parses the rank given to a candidate. Empty values mean that the candidate
/// was not ranked.
pub fn parse_rank(ballot: &str, candidate: &str, value: &str) -> RpResult<Option<Rank>> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    v.parse::<Rank>().ok().map(Some).context(InvalidRankSnafu {
        ballot,
        candidate,
        value,
    })
}

/// Ranks from JSON values. Floats are accepted when they hold an integer.
pub fn parse_rank_js(ballot: &str, candidate: &str, value: &JSValue) -> RpResult<Rank> {
    let r = match value {
        JSValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        _ => None,
    };
    r.and_then(|x| Rank::try_from(x).ok())
        .context(InvalidRankSnafu {
            ballot,
            candidate,
            value: value.to_string(),
        })
}

/// Each ballot is replicated `count` times, so larger counts are rejected.
pub const MAX_BALLOT_COUNT: u64 = 1_000_000;

pub fn parse_count(ballot: &str, value: &str) -> RpResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|c| *c <= MAX_BALLOT_COUNT)
        .context(InvalidCountSnafu { ballot, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_ids() {
        let f = make_default_id("/tmp/some/ballots.csv");
        assert_eq!(f(12), "ballots.csv-00000012");
    }

    #[test]
    fn ranks() {
        assert_eq!(parse_rank("b", "A", " 3 ").unwrap(), Some(3));
        assert_eq!(parse_rank("b", "A", "").unwrap(), None);
        assert!(matches!(
            parse_rank("b", "A", "-1"),
            Err(RpError::InvalidRank { .. })
        ));
        assert!(parse_rank("b", "A", "first").is_err());

        assert_eq!(parse_rank_js("b", "A", &json!(2)).unwrap(), 2);
        assert_eq!(parse_rank_js("b", "A", &json!(2.0)).unwrap(), 2);
        assert!(parse_rank_js("b", "A", &json!(2.5)).is_err());
        assert!(parse_rank_js("b", "A", &json!(-2)).is_err());
        assert!(parse_rank_js("b", "A", &json!("2")).is_err());
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("b", "20").unwrap(), 20);
        assert_eq!(parse_count("b", "1000000").unwrap(), MAX_BALLOT_COUNT);
        assert!(matches!(
            parse_count("b", "1000000000000"),
            Err(RpError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse_count("b", "x"),
            Err(RpError::InvalidCount { .. })
        ));
    }
}
