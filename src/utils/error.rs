use crate::domain::model::TaxCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Rule catalog has no current rule for category '{category}'")]
    CatalogIncomplete { category: TaxCategory },

    #[error("Rule '{rule_id}' is invalid: {reason}")]
    CatalogInvalid { rule_id: String, reason: String },

    #[error("Invalid date for '{field}': '{value}' ({reason})")]
    InvalidDate {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 規則表或設定檔錯誤 (啟動時檢查)
    Configuration,
    /// 呼叫端提供的值無法用於計算
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PrescriptionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CatalogIncomplete { .. } | Self::CatalogInvalid { .. } | Self::ConfigParse { .. } => {
                ErrorCategory::Configuration
            }
            Self::InvalidDate { .. } | Self::MissingField { .. } | Self::InvalidValue { .. } => {
                ErrorCategory::Input
            }
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Medium,
        }
    }

    /// 出錯的欄位名稱 (如果有的話)
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidDate { field, .. }
            | Self::MissingField { field }
            | Self::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::CatalogIncomplete { category } => format!(
                "Add a [[rules]] entry with category = \"{}\" to the rule catalog",
                category.key()
            ),
            Self::CatalogInvalid { rule_id, .. } => {
                format!("Fix the definition of rule '{}' in the rule catalog", rule_id)
            }
            Self::InvalidDate { field, .. } => {
                format!("Provide '{}' as an ISO-8601 date such as 2023-01-10", field)
            }
            Self::MissingField { field } => format!("Provide a value for '{}'", field),
            Self::InvalidValue { field, .. } => format!("Check the value given for '{}'", field),
            Self::ConfigParse { .. } => "Check the TOML syntax of the rule catalog file".to_string(),
            Self::Io(_) => "Check that the file exists and is readable".to_string(),
            Self::Serialization(_) => "Check that the input is valid JSON".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("The rule catalog could not be loaded: {}", self),
            ErrorCategory::Input => format!("The calculation inputs are invalid: {}", self),
            ErrorCategory::System => format!("An unexpected system error occurred: {}", self),
        }
    }

    pub(crate) fn invalid_rule(rule_id: &str, reason: impl Into<String>) -> Self {
        Self::CatalogInvalid {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrescriptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_critical() {
        let err = PrescriptionError::CatalogIncomplete {
            category: TaxCategory::Vat,
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.recovery_suggestion().contains("vat"));
    }

    #[test]
    fn test_input_errors_name_the_field() {
        let err = PrescriptionError::InvalidDate {
            field: "notice_date".to_string(),
            value: "31/02/2023".to_string(),
            reason: "not a calendar date".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.field(), Some("notice_date"));
        assert!(err.to_string().contains("notice_date"));
    }
}
