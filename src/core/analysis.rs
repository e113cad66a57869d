//! 外部文件分析服務從稅務通知書擷取出的欄位

use crate::core::calculator::PrescriptionInput;
use crate::core::letter::TaxpayerDetails;
use crate::domain::model::TaxCategory;
use crate::utils::error::Result;
use crate::utils::validation::{parse_iso_date, parse_optional_date, validate_required_field};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 通知書分析服務回傳的 JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    #[serde(default, alias = "category")]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub notice_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub taxpayer_name: Option<String>,
    #[serde(default)]
    pub taxpayer_id: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
}

impl AnalysisPayload {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_json_str(&content)
    }

    /// 轉換稅種；缺少或無法辨識時使用 [`TaxCategory::Other`]
    pub fn category(&self) -> TaxCategory {
        match self.tax_type.as_deref() {
            Some(raw) => {
                let category = TaxCategory::coerce(raw);
                if category == TaxCategory::Other && TaxCategory::parse(raw).is_none() {
                    tracing::warn!(tax_type = raw, "analysis returned an unknown tax type, using 'other'");
                }
                category
            }
            None => TaxCategory::Other,
        }
    }

    /// 轉成計算輸入 (例外旗標不從通知書讀取，預設為 false)
    pub fn to_input(&self) -> Result<PrescriptionInput> {
        let notice_raw = validate_required_field("noticeDate", &self.notice_date)?;
        let notice_date = parse_iso_date("noticeDate", notice_raw)?;
        let due_date = parse_optional_date("dueDate", self.due_date.as_deref())?.unwrap_or(notice_date);
        Ok(PrescriptionInput::new(self.category(), notice_date, due_date))
    }

    /// 納稅人資料 (需要姓名與參考編號)
    pub fn taxpayer(&self) -> Option<TaxpayerDetails> {
        let name = non_blank(self.taxpayer_name.as_deref())?;
        let reference_number = non_blank(self.reference_number.as_deref())?;
        Some(TaxpayerDetails {
            name: name.to_string(),
            tax_id: non_blank(self.taxpayer_id.as_deref()).map(str::to_string),
            reference_number: reference_number.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
