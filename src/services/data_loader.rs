// Dataset Loading
// Known-erroneous sentences from .txt (one per line) or .json files, or the
// negative rows of a chinese_text_correction style export

use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDataset {
    List(Vec<String>),
    Wrapped { sentences: Vec<String> },
}

/// Row of a correction dataset export (`shibing624/chinese_text_correction`).
/// `type == "negative"` marks a source sentence that contains an error.
#[derive(Deserialize)]
struct CorrectionRow {
    source: String,
    #[serde(rename = "type")]
    kind: String,
}

const NEGATIVE_LABEL: &str = "negative";

#[derive(Debug, Default, Clone)]
pub struct DataLoader {
    sentences: Vec<String>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load sentences from a `.txt` or `.json` file, replacing anything loaded before.
    pub fn load_from_file(&mut self, path: &Path) -> Result<&[String]> {
        if !path.exists() {
            return Err(EvalError::dataset(format!(
                "data file not found: {}",
                path.display()
            )));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        self.sentences = match ext.as_str() {
            "txt" => load_txt(path)?,
            "json" => load_json(path)?,
            other => return Err(EvalError::UnsupportedFormat(format!(".{}", other))),
        };

        let non_chinese = self.sentences.iter().filter(|s| !contains_cjk(s)).count();
        if non_chinese > 0 {
            warn!(count = non_chinese, "dataset.non_chinese_sentences");
        }
        info!(path = %path.display(), count = self.sentences.len(), "dataset.loaded");

        Ok(&self.sentences)
    }

    /// Load the erroneous sentences of a correction dataset export.
    ///
    /// Rows are `{"source", "target", "type"}` records, either as a JSON array
    /// or one object per line (JSONL, which is also accepted under `.json`).
    /// `limit` caps the rows read before filtering, so `Some(1000)` matches a
    /// `train[0:1000]` slice; only the `source` of `negative` rows is kept.
    pub fn load_correction_dataset(
        &mut self,
        path: &Path,
        limit: Option<usize>,
    ) -> Result<&[String]> {
        if !path.exists() {
            return Err(EvalError::dataset(format!(
                "dataset file not found: {}",
                path.display()
            )));
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if ext != "json" && ext != "jsonl" {
            return Err(EvalError::UnsupportedFormat(format!(".{}", ext)));
        }

        let content = fs::read_to_string(path)?;
        let mut rows = parse_rows(path, &content)?;
        let total = rows.len();
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        let read = rows.len();

        self.sentences = rows
            .into_iter()
            .filter(|r| r.kind == NEGATIVE_LABEL)
            .map(|r| r.source)
            .collect();

        info!(
            path = %path.display(),
            total,
            read,
            negative = self.sentences.len(),
            "dataset.correction_loaded"
        );

        Ok(&self.sentences)
    }

    pub fn load_from_list(&mut self, sentences: Vec<String>) -> &[String] {
        self.sentences = sentences;
        &self.sentences
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn into_sentences(self) -> Vec<String> {
        self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.sentences.iter()
    }
}

impl<'a> IntoIterator for &'a DataLoader {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn load_txt(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn load_json(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let data: JsonDataset = serde_json::from_str(&content).map_err(|e| {
        EvalError::dataset(format!(
            "{}: expected a list of sentences or an object with a \"sentences\" key ({})",
            path.display(),
            e
        ))
    })?;
    Ok(match data {
        JsonDataset::List(s) => s,
        JsonDataset::Wrapped { sentences } => sentences,
    })
}

fn parse_rows(path: &Path, content: &str) -> Result<Vec<CorrectionRow>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).map_err(|e| {
            EvalError::dataset(format!(
                "{}: expected records with \"source\" and \"type\" ({})",
                path.display(),
                e
            ))
        });
    }

    let mut rows = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line).map_err(|e| {
            EvalError::dataset(format!("{} line {}: {}", path.display(), i + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_txt_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.txt");
        fs::write(&path, "今天天汽很好\n\n  我门一起去公园  \r\n\n").unwrap();

        let mut loader = DataLoader::new();
        let sentences = loader.load_from_file(&path).unwrap();
        assert_eq!(sentences, ["今天天汽很好", "我门一起去公园"]);
        assert_eq!(loader.len(), 2);
    }

    #[test]
    fn test_load_json_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.json");
        fs::write(&list, r#"["这个问提很难"]"#).unwrap();
        let wrapped = dir.path().join("wrapped.JSON");
        fs::write(
            &wrapped,
            r#"{"sentences": ["今天天汽很好", "我门一起去公园"]}"#,
        )
        .unwrap();

        let mut loader = DataLoader::new();
        assert_eq!(loader.load_from_file(&list).unwrap().len(), 1);
        assert_eq!(loader.load_from_file(&wrapped).unwrap().len(), 2);
    }

    #[test]
    fn test_load_json_bad_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"data": []}"#).unwrap();
        let err = DataLoader::new().load_from_file(&path).unwrap_err();
        assert!(matches!(err, EvalError::Dataset(_)));
    }

    #[test]
    fn test_missing_and_unsupported_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            DataLoader::new().load_from_file(&missing),
            Err(EvalError::Dataset(_))
        ));

        let csv = dir.path().join("data.csv");
        fs::write(&csv, "a,b").unwrap();
        assert!(matches!(
            DataLoader::new().load_from_file(&csv),
            Err(EvalError::UnsupportedFormat(_))
        ));
    }

    const MIXED_ROWS: [&str; 5] = [
        r#"{"source": "今天天汽很好", "target": "今天天气很好", "type": "negative"}"#,
        r#"{"source": "我们一起去公园", "target": "我们一起去公园", "type": "positive"}"#,
        r#"{"source": "这个问提很难", "target": "这个问题很难", "type": "negative"}"#,
        r#"{"source": "他很高兴", "target": "他很高兴", "type": "positive"}"#,
        r#"{"source": "我门一起去公园", "target": "我们一起去公园", "type": "negative"}"#,
    ];

    #[test]
    fn test_correction_dataset_keeps_negative_rows() {
        let dir = tempfile::tempdir().unwrap();
        let jsonl = dir.path().join("train.jsonl");
        fs::write(&jsonl, MIXED_ROWS.join("\n")).unwrap();
        let array = dir.path().join("train.json");
        fs::write(&array, format!("[{}]", MIXED_ROWS.join(",\n"))).unwrap();

        let mut loader = DataLoader::new();
        let from_lines = loader.load_correction_dataset(&jsonl, None).unwrap().to_vec();
        assert_eq!(from_lines, ["今天天汽很好", "这个问提很难", "我门一起去公园"]);

        let from_array = loader.load_correction_dataset(&array, None).unwrap();
        assert_eq!(from_array, from_lines.as_slice());
    }

    #[test]
    fn test_correction_dataset_limit_applies_before_filtering() {
        let dir = tempfile::tempdir().unwrap();
        // HF `to_json` writes JSONL under a .json name
        let path = dir.path().join("train.json");
        fs::write(&path, MIXED_ROWS.join("\n")).unwrap();

        let mut loader = DataLoader::new();
        let sentences = loader.load_correction_dataset(&path, Some(3)).unwrap();
        assert_eq!(sentences, ["今天天汽很好", "这个问提很难"]);

        let sentences = loader.load_correction_dataset(&path, Some(0)).unwrap();
        assert!(sentences.is_empty());
    }

    #[test]
    fn test_correction_dataset_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.jsonl");
        fs::write(&path, format!("{}\n{{\"source\": \"缺少类型\"}}", MIXED_ROWS[0])).unwrap();
        let err = DataLoader::new()
            .load_correction_dataset(&path, None)
            .unwrap_err();
        assert!(matches!(err, EvalError::Dataset(ref m) if m.contains("line 2")));

        let txt = dir.path().join("train.txt");
        fs::write(&txt, "今天天汽很好").unwrap();
        assert!(matches!(
            DataLoader::new().load_correction_dataset(&txt, None),
            Err(EvalError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_from_list() {
        let mut loader = DataLoader::new();
        loader.load_from_list(vec!["今天天汽很好".to_string()]);
        assert!(!loader.is_empty());
        assert_eq!((&loader).into_iter().count(), 1);
        assert!(contains_cjk("今天"));
        assert!(!contains_cjk("hello"));
    }
}
