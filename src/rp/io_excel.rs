use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::rp::io_common::{make_default_id, parse_count, parse_rank};
use crate::rp::*;

fn cell_to_string(cell: &DataType, lineno: usize) -> RpResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

/// Same layout as the `csv_scores` files: the header row holds the names of
/// the candidates, and each cell is the rank given to this candidate.
pub fn read_excel_scores(path: String, cfs: &FileSource) -> BRpResult<Vec<ParsedBallot>> {
    let wrange = get_range(&path, cfs)?;
    Ok(read_scores_range(&path, &wrange, cfs)?)
}

// The cell at the given (0-based) row and column, counted from A1 and not from
// the start of the used range. Cells outside of the range are empty.
fn cell_at(wrange: &Range<DataType>, row: usize, col: usize) -> RpResult<String> {
    let pos = match (u32::try_from(row), u32::try_from(col)) {
        (Ok(r), Ok(c)) => (r, c),
        _ => return Ok("".to_string()),
    };
    match wrange.get_value(pos) {
        Some(c) => cell_to_string(c, row + 1),
        None => Ok("".to_string()),
    }
}

fn read_scores_range(
    path: &str,
    wrange: &Range<DataType>,
    cfs: &FileSource,
) -> RpResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(path);
    let choices_start_col = cfs.first_vote_column_index()?;
    let first_row = cfs.first_vote_row_index(2)?;
    if first_row == 0 {
        return MissingHeaderSnafu {}.fail();
    }
    let id_idx_o = cfs.id_column_index_int()?;
    let count_idx_o = cfs.count_column_index_int()?;
    let (last_row, last_col) = wrange.end().context(EmptyExcelSnafu {})?;
    let (last_row, last_col) = (last_row as usize, last_col as usize);

    let mut names: Vec<(usize, String)> = Vec::new();
    for col in choices_start_col..=last_col {
        let name = cell_at(wrange, first_row - 1, col)?;
        if !name.is_empty() {
            names.push((col, name));
        }
    }
    debug!("read_excel_scores: candidates: {:?}", names);

    let mut res: Vec<ParsedBallot> = Vec::new();
    for row in first_row..=last_row {
        let lineno = row + 1;
        let id = match id_idx_o {
            Some(id_idx) => cell_at(wrange, row, id_idx)?,
            None => default_id(lineno),
        };
        let count = match count_idx_o {
            Some(count_idx) => Some(parse_count(&id, &cell_at(wrange, row, count_idx)?)?),
            None => None,
        };

        let mut ranks: Vec<(String, Rank)> = Vec::new();
        for (col, name) in names.iter() {
            if let Some(r) = parse_rank(&id, name, &cell_at(wrange, row, *col)?)? {
                ranks.push((name.clone(), r));
            }
        }
        debug!("read_excel_scores: lineno: {:?} ranks: {:?}", lineno, &ranks);

        res.push(ParsedBallot {
            id: Some(id),
            count,
            choices: ParsedChoices::Ranked(ranks),
        });
    }
    Ok(res)
}

fn get_range(path: &str, cfs: &FileSource) -> BRpResult<Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => Err(Box::new(RpError::EmptyExcel {})),
        [(worksheet_name, wrange)] => {
            debug!(
                "read_excel_file: path: {:?} worksheet: {:?}",
                &path, &worksheet_name
            );
            Ok(wrange.clone())
        }
        _ => Err(Box::new(RpError::AmbiguousExcelWorksheet {
            path: path.to_string(),
            count: all_worksheets.len(),
        })),
    }
}
