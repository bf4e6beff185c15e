use std::path::Path;

use serde_json::Value;

use crate::error::BenchError;

/// Ordered prompt texts. Keys of the source mapping are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSet {
    prompts: Vec<String>,
}

impl PromptSet {
    pub fn new(prompts: Vec<String>) -> Self {
        Self { prompts }
    }

    pub fn from_path(path: &Path) -> Result<Self, BenchError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Prompts(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse a JSON object of `id -> prompt text`, keeping file order.
    pub fn from_json_str(raw: &str) -> Result<Self, BenchError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| BenchError::Prompts(format!("invalid JSON: {e}")))?;
        let Value::Object(map) = value else {
            return Err(BenchError::Prompts(
                "expected a JSON object mapping prompt ids to text".into(),
            ));
        };

        let prompts = map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => Ok(text),
                other => Err(BenchError::Prompts(format!(
                    "prompt {key:?} is not a string (got {})",
                    json_type_name(&other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { prompts })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
