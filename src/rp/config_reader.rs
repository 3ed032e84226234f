use crate::rp::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName", default)]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The description of the contest, as reported in the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
}

/// A file containing ballots.
///
/// All the row and column indexes start at 1. Columns can also be given with
/// their Excel name ("A", "B", ..., "AA").
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
    #[serde(rename = "countColumnIndex")]
    pub count_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(provider: String, file_path: String) -> FileSource {
        FileSource {
            provider,
            file_path,
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
            count_column_index: None,
            excel_worksheet_name: None,
        }
    }

    /// The (0-based) column of the first choice.
    ///
    /// By default, the first column after the id and count columns.
    pub fn first_vote_column_index(&self) -> RpResult<usize> {
        if self._first_vote_column_index.is_some() {
            let x = read_js_int(&self._first_vote_column_index)?;
            return Ok(x - 1);
        }
        let after_id = self.id_column_index_int()?.map(|x| x + 1).unwrap_or(0);
        let after_count = self.count_column_index_int()?.map(|x| x + 1).unwrap_or(0);
        Ok(after_id.max(after_count))
    }

    /// The (0-based) row of the first ballot, or `default` (1-based) if not set.
    pub fn first_vote_row_index(&self, default: usize) -> RpResult<usize> {
        let x = match self._first_vote_row_index {
            Some(_) => read_js_int(&self._first_vote_row_index)?,
            None => default,
        };
        Ok(x - 1)
    }

    /// The (0-based) column of the ballot ids.
    pub fn id_column_index_int(&self) -> RpResult<Option<usize>> {
        match self.id_column_index {
            Some(_) => read_js_int(&self.id_column_index).map(|x| Some(x - 1)),
            None => Ok(None),
        }
    }

    /// The (0-based) column of the ballot counts.
    pub fn count_column_index_int(&self) -> RpResult<Option<usize>> {
        match self.count_column_index {
            Some(_) => read_js_int(&self.count_column_index).map(|x| Some(x - 1)),
            None => Ok(None),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RpCandidate {
    pub name: String,
    pub code: Option<String>,
    pub excluded: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpRules {
    #[serde(rename = "votingMethod")]
    pub voting_method: Option<String>,
    #[serde(rename = "computeFullOrder")]
    pub compute_full_order: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources", default)]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Option<Vec<RpCandidate>>,
    pub rules: Option<RpRules>,
}

pub fn read_config(path: String) -> BRpResult<RpConfig> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let config: RpConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> BRpResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Reads a 1-based index, either as a number, a string of digits, or an
/// Excel column name.
pub fn read_js_int(x: &Option<JSValue>) -> RpResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Parsing the Excel-style columns: A is 1, Z is 26, AA is 27
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            s.to_ascii_lowercase().chars().try_fold(0usize, |acc, c| {
                acc.checked_mul(26)?
                    .checked_add((c as usize) - ('a' as usize) + 1)
            })
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    res.filter(|x| *x >= 1).context(ParsingJsonNumberSnafu {})
}
