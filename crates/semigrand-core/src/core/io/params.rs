use std::collections::HashMap;
use std::io::{self, BufRead};
use std::str::FromStr;
use thiserror::Error;

/// A parsed block of `key value` parameter lines.
///
/// Blank lines and everything after a `#` are ignored. Each remaining line
/// holds exactly one key followed by whitespace and a value; the value is the
/// rest of the line, trimmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBlock {
    entries: HashMap<String, ParamEntry>,
}

#[derive(Debug, Clone, PartialEq)]
struct ParamEntry {
    value: String,
    line: usize,
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Line {line}: expected 'key value', found '{content}'")]
    MalformedLine { line: usize, content: String },
    #[error("Line {line}: parameter '{key}' was already given on line {first_line}")]
    Duplicate {
        key: String,
        line: usize,
        first_line: usize,
    },
    #[error("Line {line}: invalid value '{value}' for parameter '{key}'")]
    InvalidValue {
        key: String,
        value: String,
        line: usize,
    },
}

impl ParamBlock {
    pub fn read_from(reader: &mut impl BufRead) -> Result<Self, ParamError> {
        let mut entries: HashMap<String, ParamEntry> = HashMap::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let Some((key, value)) = content.split_once(char::is_whitespace) else {
                return Err(ParamError::MalformedLine {
                    line: line_num,
                    content: content.to_string(),
                });
            };
            let value = value.trim();

            if let Some(existing) = entries.get(key) {
                return Err(ParamError::Duplicate {
                    key: key.to_string(),
                    line: line_num,
                    first_line: existing.line,
                });
            }
            entries.insert(
                key.to_string(),
                ParamEntry {
                    value: value.to_string(),
                    line: line_num,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn parse_str(content: &str) -> Result<Self, ParamError> {
        Self::read_from(&mut content.as_bytes())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Parses the value of `key` as `T`, returning `Ok(None)` if the key is absent.
    pub fn get<T: FromStr>(&self, key: &str) -> Result<Option<T>, ParamError> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        entry
            .value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ParamError::InvalidValue {
                key: key.to_string(),
                value: entry.value.clone(),
                line: entry.line,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_values_and_skips_comments() {
        let block = ParamBlock::parse_str(
            "probability   0.5\n\n# a comment\nspeciesId 2   # trailing\noutputFileName wl run\n",
        )
        .unwrap();

        assert_eq!(block.get::<f64>("probability").unwrap(), Some(0.5));
        assert_eq!(block.get::<usize>("speciesId").unwrap(), Some(2));
        assert_eq!(block.raw("outputFileName"), Some("wl run"));
        assert_eq!(block.get::<f64>("weightStep").unwrap(), None);
        assert_eq!(block.keys().count(), 3);
    }

    #[test]
    fn line_without_value_is_malformed() {
        let result = ParamBlock::parse_str("speciesId 0\nupperLimit\n");
        assert!(matches!(
            result,
            Err(ParamError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn duplicate_key_reports_both_lines() {
        let result = ParamBlock::parse_str("speciesId 0\n\nspeciesId 1\n");
        match result {
            Err(ParamError::Duplicate {
                key,
                line,
                first_line,
            }) => {
                assert_eq!(key, "speciesId");
                assert_eq!(line, 3);
                assert_eq!(first_line, 1);
            }
            other => panic!("Expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn unparsable_value_reports_key_and_line() {
        let block = ParamBlock::parse_str("upperLimit ten\n").unwrap();
        let result = block.get::<usize>("upperLimit");
        assert!(matches!(
            result,
            Err(ParamError::InvalidValue { line: 1, .. })
        ));
    }
}
