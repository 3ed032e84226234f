/*!

This is the long-form manual for `ranked_pairs` and `rptab`.

## The method

Ranked Pairs compares every pair of candidates. For candidates A and B, the
strength of (A, B) is the number of ballots that rank A strictly above B.
A pair (A, B) is a victory of A when its strength is greater than the
strength of (B, A). Ties are dropped in both directions.

The victories are sorted from the most decisive to the least decisive:
 - the larger strength first,
 - then, for equal strengths, the smaller opposition (the strength of the
   reverse pair) first,
 - then, for fully equal pairs, by the order of the candidates.

The victories are then locked in one by one. A victory (A, B) is locked when
A has not itself been beaten by a locked victory and (B, A) was not locked.
The winners are the candidates that no locked victory points to. There is
more than one winner only when the top of the election is tied.

The finish order is obtained by removing the winners and locking the same
sorted victories again among the remaining candidates, until no candidate is
left.

## Ballots

A ballot gives a rank to some of the candidates. **Higher ranks are
preferred**: on a ballot using 1 to 10, 10 is the favourite. Candidates that
are not on the ballot get the rank 0, which means that they are tied below
every candidate that the voter ranked.

## Input formats

The following formats are supported by `rptab`:
* `json` (default) A JSON array of objects
* `jsonl` One JSON object per line
* `csv` Comma Separated Values, one choice per column
* `csv_scores` Comma Separated Values, one candidate per column
* `xlsx_scores` An Excel spreadsheet, one candidate per column

### `json`

```text
[
  {"Alice": 3, "Bob": 2, "Charlie": 1},
  {"Bob": 3, "Alice": 1}
]
```

### `jsonl`

The same objects, one on each line. Empty lines are skipped.

```text
{"Alice": 3, "Bob": 2, "Charlie": 1}
{"Bob": 3, "Alice": 1}
```

### `csv`

Each column (in order) is a choice, the first choice being the favourite.
The name of the choice in the header is not significant.

```text
id,count,choice 1,choice 2,choice 3
id1,20,Alice,Bob,Charlie
id2,15,Bob,Alice,
```

The `id` and `count` columns are optional. A count is at most 1000000. See the
[Configuration section](#configuration) on controlling the optional rows and
columns.

### `csv_scores`

One column per candidate, with the name of the candidate in the first row.
Each cell is the rank of this candidate on this ballot (higher is preferred),
or empty if the candidate was not ranked.

```text
id,count,Alice,Bob,Charlie
id1,20,3,2,1
id2,15,1,3,
```

### `xlsx_scores`

Same layout as `csv_scores`, in an Excel (`.xlsx`) worksheet.

## Configuration

`rptab` can read an election description in JSON:

```text
{
  "outputSettings": {"contestName": "Board election"},
  "cvrFileSources": [
    {"provider": "csv", "filePath": "ballots.csv",
     "firstVoteColumnIndex": 3, "firstVoteRowIndex": 2,
     "idColumnIndex": 1, "countColumnIndex": 2}
  ],
  "candidates": [{"name": "Alice"}, {"name": "Bob"}, {"name": "Charlie", "excluded": true}],
  "rules": {"votingMethod": "rankedPairs", "computeFullOrder": true}
}
```

File paths are relative to the configuration file. Column and row indexes
start at 1. When `candidates` is missing, the candidates are everyone who
appears on a ballot.

 */
