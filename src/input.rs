//! Target list loading

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};

/// Collect identifiers from CLI arguments and an optional file.
///
/// File entries are one per line; blank lines and `#` comments are
/// skipped. Order is preserved and duplicates are dropped.
pub fn load_targets(values: &[String], file: Option<&str>) -> Result<Vec<String>> {
    let mut targets: Vec<String> = values.iter().map(|v| v.trim().to_string()).collect();

    if let Some(path) = file {
        let path = PathBuf::from(path);
        let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
            path: path.clone(),
            source: e,
        })?;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            targets.push(line.to_string());
        }
        debug!(path = %path.display(), "Loaded targets from file");
    }

    // Order-preserving dedup
    let mut seen = std::collections::HashSet::new();
    targets.retain(|t| !t.is_empty() && seen.insert(t.clone()));

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_values_only() {
        let values = vec!["79001234567".to_string(), "user@example.com".to_string()];
        let targets = load_targets(&values, None).unwrap();
        assert_eq!(targets, values);
    }

    #[test]
    fn test_file_skips_blanks_and_comments() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# targets for tonight").unwrap();
        writeln!(file, "79001234567").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  user@example.com  ").unwrap();
        file.flush().unwrap();

        let targets = load_targets(&[], Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(targets, vec!["79001234567", "user@example.com"]);
    }

    #[test]
    fn test_dedup_preserves_order() {
        let values = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
        ];
        let targets = load_targets(&values, None).unwrap();
        assert_eq!(targets, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_targets(&[], Some("/nonexistent/targets.txt"));
        assert!(result.is_err());
    }
}
