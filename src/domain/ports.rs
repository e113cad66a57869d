use crate::domain::model::{PrescriptionRule, TaxCategory};
use chrono::NaiveDate;

/// 計算器查詢規則的來源
///
/// 實作不會失敗：無法處理的稅種一律退回預設規則
pub trait RuleResolver: Send + Sync {
    fn resolve_rule(&self, category: TaxCategory, reference_date: NaiveDate) -> &PrescriptionRule;
}
