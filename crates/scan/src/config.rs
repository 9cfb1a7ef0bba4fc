use serde::{Deserialize, Serialize};

/// Entry point scanning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Target annotations, separated by comma, semicolon, whitespace or newline.
    /// A leading `@` is optional.
    pub annotation: String,

    /// MyBatis mapper support
    pub mybatis: MyBatisConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            annotation: "RestController,Controller,Service".to_string(),
            mybatis: MyBatisConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Normalised target annotation names
    #[must_use]
    pub fn target_annotations(&self) -> Vec<String> {
        self.annotation
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(|item| item.trim().trim_start_matches('@').trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.target_annotations().is_empty() && !self.mybatis.enabled {
            return Err("no target annotations configured and MyBatis scanning disabled".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MyBatisConfig {
    /// Scan XML mappers and MyBatis-Plus base mappers
    pub enabled: bool,

    /// Emit inherited BaseMapper CRUD methods as entry points
    pub include_mybatis_plus_base_methods: bool,

    /// Only keep XML mappers related to classes that already produced entry points
    pub strict_service_mapping: bool,
}

impl Default for MyBatisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_mybatis_plus_base_methods: true,
            strict_service_mapping: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalises_annotation_list() {
        let config = ScanConfig {
            annotation: " @Service;RestController\n\t@org.acme.Entry ,, ".to_string(),
            ..ScanConfig::default()
        };
        assert_eq!(
            config.target_annotations(),
            vec!["Service", "RestController", "org.acme.Entry"]
        );
    }

    #[test]
    fn rejects_empty_configuration() {
        let config = ScanConfig {
            annotation: " ; ".to_string(),
            mybatis: MyBatisConfig {
                enabled: false,
                ..MyBatisConfig::default()
            },
        };
        assert!(config.validate().is_err());
        assert!(ScanConfig::default().validate().is_ok());
    }
}
