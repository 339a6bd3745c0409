// Tue Jan 20 2026 - Alex

use crate::signature::SignatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    Function,
    #[default]
    Data,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "Function"),
            Self::Data => write!(f, "Data"),
        }
    }
}

/// A named pattern that is expected to identify one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default, alias = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pattern: String,
    /// Number of matches expected when they do not all resolve to one address.
    #[serde(default = "default_count")]
    pub count: usize,
    /// Which of `count` matches to pick.
    #[serde(default)]
    pub index: usize,
    /// Expression applied to every match, see [`Expression`](crate::signature::Expression).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<String>,
}

fn default_count() -> usize {
    1
}

impl Signature {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            category: Category::default(),
            description: None,
            pattern: pattern.to_string(),
            count: default_count(),
            index: 0,
            ops: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_ops(mut self, ops: &str) -> Self {
        self.ops = Some(ops.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureFile {
    #[serde(alias = "patterns")]
    pub signatures: Vec<Signature>,
}

impl SignatureFile {
    /// Loads a `.json` file as JSON and anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SignatureError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;

        let is_json = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text)
        } else {
            text.parse()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SignatureError> {
        let file: Self = serde_json::from_str(text)?;
        file.check()
    }

    fn check(self) -> Result<Self, SignatureError> {
        if self.signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl FromStr for SignatureFile {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let file: Self = serde_yaml::from_str(s)?;
        file.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let file: SignatureFile = "
signatures:
  - name: main
    pattern: 55 48 89 E5
".parse().unwrap();

        let signature = &file.signatures[0];
        assert_eq!(signature.pattern, "55 48 89 E5");
        assert_eq!(signature.category, Category::Data);
        assert_eq!(signature.count, 1);
        assert_eq!(signature.index, 0);
        assert_eq!(signature.ops, None);
        assert_eq!(signature.description, None);
    }

    #[test]
    fn test_pattern_file_layout() {
        let file: SignatureFile = r#"
patterns:
  - name: CreateThing
    category: Function
    desc: constructor
    pattern: "E8 ? ? ? ?"
    ops: "[$+1].r+4"
    count: 2
    index: 1
"#.parse().unwrap();

        let signature = &file.signatures[0];
        assert_eq!(signature.category, Category::Function);
        assert_eq!(signature.description.as_deref(), Some("constructor"));
        assert_eq!(signature.ops.as_deref(), Some("[$+1].r+4"));
        assert_eq!(signature.count, 2);
        assert_eq!(signature.index, 1);
    }

    #[test]
    fn test_json_accepted() {
        let file = SignatureFile::from_json(r#"{
            "signatures": [
                { "name": "gVersion", "pattern": "48 8B 05 ?? ?? ?? ??", "ops": "[$+3].r+4" }
            ]
        }"#).unwrap();
        assert_eq!(file.len(), 1);
        assert_eq!(file.signatures[0].ops.as_deref(), Some("[$+3].r+4"));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = std::env::temp_dir();
        let yaml = dir.join(format!("binpattern-{}-sigs.yml", std::process::id()));
        let json = dir.join(format!("binpattern-{}-sigs.json", std::process::id()));
        fs::write(&yaml, "patterns:\n  - name: a\n    pattern: C3\n").unwrap();
        fs::write(&json, r#"{ "patterns": [ { "name": "b", "pattern": "CC" } ] }"#).unwrap();

        assert_eq!(SignatureFile::load(&yaml).unwrap().signatures[0].name, "a");
        assert_eq!(SignatureFile::load(&json).unwrap().signatures[0].name, "b");

        fs::remove_file(yaml).unwrap();
        fs::remove_file(json).unwrap();
    }

    #[test]
    fn test_empty_file_rejected() {
        let result = "signatures: []".parse::<SignatureFile>();
        assert!(matches!(result, Err(SignatureError::NoSignatures)));
        let result = SignatureFile::from_json(r#"{ "signatures": [] }"#);
        assert!(matches!(result, Err(SignatureError::NoSignatures)));
    }

    #[test]
    fn test_missing_pattern_rejected() {
        let result = "signatures:\n  - name: x\n".parse::<SignatureFile>();
        assert!(matches!(result, Err(SignatureError::Yaml(_))));
        let result = SignatureFile::from_json(r#"{ "signatures": [ { "name": "x" } ] }"#);
        assert!(matches!(result, Err(SignatureError::Json(_))));
    }
}
