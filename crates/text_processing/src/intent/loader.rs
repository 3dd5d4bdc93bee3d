//! Training data loaders
//!
//! YAML / JSON files hold a `label -> document` or `label -> [documents]`
//! mapping. Anything else is read as two-column text, one `document,label`
//! row per line.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::corpus::TrainingExample;
use crate::{Result, TextProcessingError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Documents {
    One(String),
    Many(Vec<String>),
}

impl Documents {
    fn into_vec(self) -> Vec<String> {
        match self {
            Documents::One(doc) => vec![doc],
            Documents::Many(docs) => docs,
        }
    }
}

/// Read labeled training examples from `path`
pub fn load_training_examples(path: impl AsRef<Path>) -> Result<Vec<TrainingExample>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| TextProcessingError::io(path, e))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let examples = match extension.as_deref() {
        Some("yaml") | Some("yml") => {
            let mapping: BTreeMap<String, Documents> = serde_yaml::from_str(&content)
                .map_err(|e| parse_error(path, e))?;
            from_mapping(mapping)
        }
        Some("json") => {
            let mapping: BTreeMap<String, Documents> =
                serde_json::from_str(&content).map_err(|e| parse_error(path, e))?;
            from_mapping(mapping)
        }
        _ => parse_two_column(&content)?,
    };

    if examples.is_empty() {
        return Err(TextProcessingError::Configuration(format!(
            "no training examples in {}",
            path.display()
        )));
    }

    tracing::info!(
        path = %path.display(),
        examples = examples.len(),
        "Loaded intent training data"
    );
    Ok(examples)
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> TextProcessingError {
    TextProcessingError::Configuration(format!("failed to parse {}: {}", path.display(), err))
}

fn from_mapping(mapping: BTreeMap<String, Documents>) -> Vec<TrainingExample> {
    mapping
        .into_iter()
        .flat_map(|(label, docs)| {
            docs.into_vec()
                .into_iter()
                .map(move |text| TrainingExample::new(text, label.clone()))
        })
        .collect()
}

/// Parse `document,label` rows; the label follows the final comma
pub fn parse_two_column(content: &str) -> Result<Vec<TrainingExample>> {
    let mut examples = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (document, label) = line.rsplit_once(',').ok_or_else(|| {
            TextProcessingError::Configuration(format!(
                "line {}: expected `document,label`",
                line_no + 1
            ))
        })?;

        let document = document.trim();
        let document = document
            .strip_prefix('"')
            .and_then(|d| d.strip_suffix('"'))
            .unwrap_or(document);
        let label = label.trim().trim_matches('"');

        examples.push(TrainingExample::new(document, label));
    }
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_mapping() {
        let file = write_temp(
            ".yaml",
            "greeting:\n  - hola buenas\n  - que onda\nfarewell: adios hasta luego\n",
        );
        let examples = load_training_examples(file.path()).unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[0], TrainingExample::new("adios hasta luego", "farewell"));
        assert!(examples.contains(&TrainingExample::new("que onda", "greeting")));
    }

    #[test]
    fn test_load_json_mapping() {
        let file = write_temp(".json", r#"{"greeting": "hola", "farewell": ["adios"]}"#);
        let examples = load_training_examples(file.path()).unwrap();
        assert_eq!(examples.len(), 2);
    }

    #[test]
    fn test_load_two_column() {
        let file = write_temp(
            ".csv",
            "hola buenas,greeting\n\n\"bueno, adios\",farewell\n",
        );
        let examples = load_training_examples(file.path()).unwrap();
        assert_eq!(
            examples,
            vec![
                TrainingExample::new("hola buenas", "greeting"),
                TrainingExample::new("bueno, adios", "farewell"),
            ]
        );
    }

    #[test]
    fn test_row_without_label_is_rejected() {
        assert!(matches!(
            parse_two_column("hola buenas\n"),
            Err(TextProcessingError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_file_is_configuration_error() {
        let file = write_temp(".csv", "\n\n");
        assert!(matches!(
            load_training_examples(file.path()),
            Err(TextProcessingError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_training_examples("/no/such/intents.yaml"),
            Err(TextProcessingError::Io { .. })
        ));
    }
}
