use crate::core::catalog::RuleCatalog;
use crate::domain::model::PrescriptionRule;
use crate::utils::error::{PrescriptionError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 從 TOML 檔案載入的規則表 (取代內建的摩洛哥規則表)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub catalog: CatalogInfo,
    #[serde(default)]
    pub rules: Vec<PrescriptionRule>,
    #[serde(default)]
    pub historical: Vec<PrescriptionRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

impl CatalogFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PrescriptionError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VAR})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PrescriptionError::ConfigParse {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("catalog.name", &self.catalog.name)?;
        validate_non_empty_string("catalog.version", &self.catalog.version)?;

        for rule in self.rules.iter().chain(&self.historical) {
            validate_range(
                &format!("rules.{}.prescription_years", rule.id),
                rule.prescription_years,
                1,
                100,
            )?;
        }
        Ok(())
    }

    /// 驗證檔案並建立規則表 (同時檢查完整性)
    pub fn into_catalog(self) -> Result<RuleCatalog> {
        self.validate()?;
        tracing::info!(
            name = %self.catalog.name,
            version = %self.catalog.version,
            rules = self.rules.len(),
            historical = self.historical.len(),
            "loading rule catalog"
        );
        RuleCatalog::new(self.rules, self.historical)
    }
}

impl Validate for CatalogFile {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// 載入指定的規則表檔案，未指定時使用內建規則表
pub fn load_catalog(path: Option<&Path>) -> Result<RuleCatalog> {
    match path {
        Some(path) => {
            tracing::info!("📁 Loading rule catalog from: {}", path.display());
            CatalogFile::from_file(path)?.into_catalog()
        }
        None => RuleCatalog::moroccan(),
    }
}
