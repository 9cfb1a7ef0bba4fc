use serde::{Deserialize, Serialize};

/// Context bundle assembly configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Character budget for one bundle, before the truncation marker
    pub max_chars: usize,

    /// How far related types are followed through fields
    pub type_depth: usize,

    /// Include the source of methods called by the entry method
    pub collect_called: bool,

    /// How far calls are followed
    pub called_depth: usize,

    /// Annotations marking a type as an entity (simple or qualified names)
    pub annotation_whitelist: Vec<String>,

    /// Package fragments marking entity packages, matched case-insensitively
    pub package_keywords: Vec<String>,

    /// Simple-name suffixes marking entity types
    pub type_suffixes: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: 20_000,
            type_depth: 2,
            collect_called: true,
            called_depth: 1,
            annotation_whitelist: vec![
                "Entity".to_string(),
                "Table".to_string(),
                "TableName".to_string(),
                "Document".to_string(),
            ],
            package_keywords: vec![".dto".to_string(), ".vo".to_string()],
            type_suffixes: vec![
                "DTO".to_string(),
                "Dto".to_string(),
                "VO".to_string(),
                "Vo".to_string(),
            ],
        }
    }
}

impl ContextConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chars == 0 {
            return Err("max_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}
