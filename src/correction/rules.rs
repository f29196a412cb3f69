use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CorrectionError;

/// Tag that switches a rule off without deleting it
pub const DISABLED_TAG: &str = "disabled";

// @struct: Rules file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    // @field: Regex rules, applied first
    #[serde(default)]
    pub regex: Vec<Rule>,

    // @field: Literal rules, applied after the regex rules
    #[serde(default)]
    pub string: Vec<Rule>,
}

// @struct: Single find/replace rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub find: String,

    #[serde(default)]
    pub replace: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, alias = "wholeWord")]
    pub whole_word: bool,

    #[serde(default, alias = "caseSensitive")]
    pub case_sensitive: bool,

    /// Literal rules only
    #[serde(default, alias = "preserveCase")]
    pub preserve_case: bool,
}

impl Rule {
    pub fn is_disabled(&self) -> bool {
        self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(DISABLED_TAG))
    }
}

impl RuleSet {
    /// Parse a rules document
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a rules file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorrectionError> {
        let path = path.as_ref();
        let rules_error = |message: String| CorrectionError::RulesFile {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| rules_error(e.to_string()))?;
        Self::from_json_str(&content).map_err(|e| rules_error(e.to_string()))
    }

    /// Number of rules that will actually run
    pub fn active_count(&self) -> usize {
        self.regex.iter().chain(&self.string).filter(|r| !r.is_disabled()).count()
    }
}
