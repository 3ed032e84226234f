// Primitives for reading CSV files.

use std::fs::File;

use crate::rp::io_common::{make_default_id, parse_count, parse_rank};
use crate::rp::*;

// The id and the count of the ballot on a line.
fn read_id_count(
    line: &csv::StringRecord,
    lineno: usize,
    cfs: &FileSource,
    default_id: &impl Fn(usize) -> String,
) -> RpResult<(String, Option<u64>)> {
    let id = match cfs.id_column_index_int()? {
        Some(id_idx) => line
            .get(id_idx)
            .context(CsvLineToShortSnafu { lineno })?
            .to_string(),
        None => default_id(lineno),
    };
    let count = match cfs.count_column_index_int()? {
        Some(count_idx) => {
            let s = line.get(count_idx).context(CsvLineToShortSnafu { lineno })?;
            Some(parse_count(&id, s)?)
        }
        None => None,
    };
    Ok((id, count))
}

/// Each line is a ballot, listing the choices from the most preferred to
/// the least preferred.
pub fn read_csv_ranking(path: String, cfs: &FileSource) -> BRpResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(&path, cfs.first_vote_row_index(1)?)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let (id, count) = read_id_count(&line, lineno, cfs, &default_id)?;

        let choices_parsed: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.trim().to_string())
            .collect();
        debug!(
            "read_csv_ranking: lineno: {:?} row: {:?}",
            lineno, &choices_parsed
        );

        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices: ParsedChoices::Ordered(choices_parsed),
        });
    }
    Ok(res)
}

/// The first row holds the names of the candidates, and each cell the rank
/// given to this candidate (higher is preferred).
///
/// The header is the row just before the first ballot.
pub fn read_csv_scores(path: String, cfs: &FileSource) -> BRpResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index(2)?;
    if first_row == 0 {
        return Err(Box::new(RpError::MissingHeader {}));
    }

    let (mut records, _) = get_records(&path, first_row - 1)?;
    let header = records
        .next()
        .context(MissingHeaderSnafu {})?
        .context(CsvLineParseSnafu {})?;
    let names: Vec<(usize, String)> = header
        .iter()
        .enumerate()
        .skip(choices_start_col)
        .map(|(col, s)| (col, s.trim().to_string()))
        .filter(|(_, s)| !s.is_empty())
        .collect();
    debug!("read_csv_scores: candidates: {:?}", names);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + first_row + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let (id, count) = read_id_count(&line, lineno, cfs, &default_id)?;

        let mut ranks: Vec<(String, Rank)> = Vec::new();
        for (col, name) in names.iter() {
            // Short lines: the missing cells are empty.
            let cell = line.get(*col).unwrap_or("");
            if let Some(r) = parse_rank(&id, name, cell)? {
                ranks.push((name.clone(), r));
            }
        }
        debug!("read_csv_scores: lineno: {:?} ranks: {:?}", lineno, &ranks);

        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices: ParsedChoices::Ranked(ranks),
        });
    }
    Ok(res)
}

// The records, starting at the given (0-based) row.
fn get_records(path: &str, first_row: usize) -> RpResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    // Stops at the end of the file.
    if first_row > 0 {
        _ = records.nth(first_row - 1);
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_file(test_name: &str, content: &str) -> String {
        let dir = std::env::temp_dir().join(format!("rptab-csv-{}-{}", std::process::id(), test_name));
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("ballots.csv");
        fs::write(&p, content).unwrap();
        p.display().to_string()
    }

    fn source(path: &str, provider: &str) -> FileSource {
        FileSource::new(provider.to_string(), path.to_string())
    }

    #[test]
    fn ranking_with_id_and_count() {
        let p = write_file(
            "ranking",
            "id,count,c1,c2,c3\nid1,20,Alice,Bob,Charlie\nid2,15,Bob,Alice,\n",
        );
        let mut cfs: FileSource = serde_json::from_value(json!({
            "provider": "csv",
            "filePath": p,
            "firstVoteRowIndex": 2,
            "idColumnIndex": 1,
            "countColumnIndex": 2
        }))
        .unwrap();
        let res = read_csv_ranking(p.clone(), &cfs).unwrap();
        assert_eq!(
            res,
            vec![
                ParsedBallot {
                    id: Some("id1".to_string()),
                    count: Some(20),
                    choices: ParsedChoices::Ordered(vec![
                        "Alice".to_string(),
                        "Bob".to_string(),
                        "Charlie".to_string()
                    ]),
                },
                ParsedBallot {
                    id: Some("id2".to_string()),
                    count: Some(15),
                    choices: ParsedChoices::Ordered(vec![
                        "Bob".to_string(),
                        "Alice".to_string(),
                        "".to_string()
                    ]),
                },
            ]
        );

        cfs.count_column_index = Some(json!(1));
        assert!(matches!(
            read_csv_ranking(p, &cfs).map_err(|e| *e),
            Err(RpError::InvalidCount { .. })
        ));
    }

    #[test]
    fn ranking_without_header() {
        let p = write_file("noheader", "A,B\nB\n");
        let res = read_csv_ranking(p.clone(), &source(&p, "csv")).unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[1].id.as_deref(), Some("ballots.csv-00000002"));
        assert_eq!(res[1].count, None);
        assert_eq!(res[1].choices, ParsedChoices::Ordered(vec!["B".to_string()]));
    }

    #[test]
    fn first_row_past_the_end() {
        let p = write_file("pastend", "A,B\n");
        let cfs: FileSource = serde_json::from_value(json!({
            "provider": "csv",
            "filePath": p,
            "firstVoteRowIndex": 1000000000000u64
        }))
        .unwrap();
        assert!(read_csv_ranking(p.clone(), &cfs).unwrap().is_empty());
        assert!(matches!(
            read_csv_scores(p, &cfs).map_err(|e| *e),
            Err(RpError::MissingHeader {})
        ));
    }

    #[test]
    fn scores() {
        let p = write_file(
            "scores",
            "count,Alice,Bob,Charlie\n20,3,2,1\n15,1,3,\n2,,1\n",
        );
        let mut cfs = source(&p, "csv_scores");
        cfs.count_column_index = Some(json!(1));
        let res = read_csv_scores(p.clone(), &cfs).unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[0].count, Some(20));
        assert_eq!(
            res[1].choices,
            ParsedChoices::Ranked(vec![("Alice".to_string(), 1), ("Bob".to_string(), 3)])
        );
        assert_eq!(
            res[2].choices,
            ParsedChoices::Ranked(vec![("Bob".to_string(), 1)])
        );
    }

    #[test]
    fn scores_reject_invalid_ranks() {
        let p = write_file("badscores", "Alice,Bob\n1,yes\n");
        match read_csv_scores(p.clone(), &source(&p, "csv_scores")).map_err(|e| *e) {
            Err(RpError::InvalidRank {
                candidate, value, ..
            }) => {
                assert_eq!(candidate, "Bob");
                assert_eq!(value, "yes");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }
}
