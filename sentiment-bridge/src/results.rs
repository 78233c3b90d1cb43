use leanscope_core::{CoreError, SentimentError, SentimentPair, StoreError};
use std::fs;
use std::path::Path;

/// One line of tool output: the echoed text and its rating.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLine {
    pub text: String,
    pub pair: SentimentPair,
}

/// Splits `<text>\t<positive>\t<negative>`, reading the ratings from the end.
pub fn parse_result_line(line: &str) -> Option<ResultLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut parts = line.rsplitn(3, '\t');
    let negative = parts.next()?.trim().parse::<i32>().ok()?;
    let positive = parts.next()?.trim().parse::<i32>().ok()?;
    let text = parts.next().unwrap_or("").to_string();

    Some(ResultLine {
        text,
        pair: SentimentPair::new(positive, negative),
    })
}

/// Reads a tool result file in order. An empty file rates as neutral.
pub fn read_results(path: &Path) -> Result<Vec<ResultLine>, CoreError> {
    let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;

    let mut results = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        match parse_result_line(line) {
            Some(result) => results.push(result),
            None => {
                return Err(SentimentError::MalformedLine {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                }
                .into())
            }
        }
    }

    if results.is_empty() {
        results.push(ResultLine {
            text: String::new(),
            pair: SentimentPair::NEUTRAL,
        });
    }
    Ok(results)
}
