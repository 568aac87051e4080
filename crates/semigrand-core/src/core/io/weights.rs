use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: WeightParseErrorKind,
    },
    #[error("Weight index {index} on line {line} is outside the table of {capacity} entries")]
    IndexOutOfRange {
        index: usize,
        line: usize,
        capacity: usize,
    },
}

#[derive(Debug, Error)]
pub enum WeightParseErrorKind {
    #[error("Invalid occupancy index '{0}'")]
    InvalidIndex(String),
    #[error("Invalid weight value '{0}'")]
    InvalidWeight(String),
    #[error("Expected exactly two columns, found {0}")]
    ColumnCount(usize),
}

/// One `(index, weight)` row of a weight table, with the line it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRow {
    pub index: usize,
    pub weight: f64,
    pub line: usize,
}

/// Reads a whitespace-separated two-column `(index, weight)` table.
///
/// Blank lines are skipped. Rows are returned in file order; later rows for
/// the same index win when applied in sequence.
pub fn read_weight_rows(reader: &mut impl BufRead) -> Result<Vec<WeightRow>, WeightFileError> {
    let mut rows = Vec::new();

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;

        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.is_empty() {
            continue;
        }
        if columns.len() != 2 {
            return Err(WeightFileError::Parse {
                line: line_num,
                kind: WeightParseErrorKind::ColumnCount(columns.len()),
            });
        }

        let index: usize = columns[0].parse().map_err(|_| WeightFileError::Parse {
            line: line_num,
            kind: WeightParseErrorKind::InvalidIndex(columns[0].to_string()),
        })?;
        let weight: f64 = columns[1].parse().map_err(|_| WeightFileError::Parse {
            line: line_num,
            kind: WeightParseErrorKind::InvalidWeight(columns[1].to_string()),
        })?;

        rows.push(WeightRow {
            index,
            weight,
            line: line_num,
        });
    }

    Ok(rows)
}

pub fn read_weight_rows_from_path(path: &Path) -> Result<Vec<WeightRow>, WeightFileError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_weight_rows(&mut reader)
}

/// Writes `index   weight` lines for every entry, ordered by index.
pub fn write_weight_table(writer: &mut impl Write, weights: &[f64]) -> io::Result<()> {
    for (index, weight) in weights.iter().enumerate() {
        writeln!(writer, "{}   {}", index, weight)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_rows_in_file_order() {
        let rows = read_weight_rows(&mut "3 1.5\n\n7   -2.0\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 3);
        assert_eq!(rows[0].weight, 1.5);
        assert_eq!(rows[1].index, 7);
        assert_eq!(rows[1].weight, -2.0);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn negative_index_is_a_parse_error() {
        let result = read_weight_rows(&mut "-1 0.5\n".as_bytes());
        assert!(matches!(
            result,
            Err(WeightFileError::Parse {
                line: 1,
                kind: WeightParseErrorKind::InvalidIndex(_)
            })
        ));
    }

    #[test]
    fn non_numeric_weight_is_a_parse_error() {
        let result = read_weight_rows(&mut "0 0.0\n1 abc\n".as_bytes());
        assert!(matches!(
            result,
            Err(WeightFileError::Parse {
                line: 2,
                kind: WeightParseErrorKind::InvalidWeight(_)
            })
        ));
    }

    #[test]
    fn extra_columns_are_rejected() {
        let result = read_weight_rows(&mut "0 0.0 1.0\n".as_bytes());
        assert!(matches!(
            result,
            Err(WeightFileError::Parse {
                kind: WeightParseErrorKind::ColumnCount(3),
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = read_weight_rows_from_path(&dir.path().join("absent.dat"));
        assert!(matches!(result, Err(WeightFileError::Io(_))));
    }

    #[test]
    fn written_table_reads_back_with_the_same_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.dat");
        let weights = [0.0, -1.25, 3.5];
        let mut file = fs::File::create(&path).unwrap();
        write_weight_table(&mut file, &weights).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some("0   0"));

        let rows = read_weight_rows_from_path(&path).unwrap();
        let values: Vec<f64> = rows.iter().map(|r| r.weight).collect();
        assert_eq!(values, weights);
    }
}
