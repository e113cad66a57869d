//! 規則表：每個稅種的現行規則，加上在原有效期間內通知的案件仍適用的舊規則

use crate::domain::model::{ExceptionOverrides, LegalBasis, PrescriptionRule, TaxCategory};
use crate::domain::ports::RuleResolver;
use crate::utils::error::{PrescriptionError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid built-in rule date"),
    }
}

/// 2016 年新規則的生效日
pub const CURRENT_EFFECTIVE_DATE: NaiveDate = ymd(2016, 1, 1);

/// 已驗證、不可變的規則表
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    current: BTreeMap<TaxCategory, PrescriptionRule>,
    historical: BTreeMap<TaxCategory, Vec<PrescriptionRule>>,
    default_rule: PrescriptionRule,
}

impl RuleCatalog {
    /// 建立規則表；任何稅種缺少現行規則即拒絕
    ///
    /// 舊規則保留輸入順序，期間重疊時以先出現者為準
    pub fn new(current: Vec<PrescriptionRule>, historical: Vec<PrescriptionRule>) -> Result<Self> {
        let mut current_by_category = BTreeMap::new();
        for rule in current {
            validate_rule(&rule)?;
            if rule.effective_until.is_some() {
                tracing::debug!(rule_id = %rule.id, "current rule carries an end date");
            }
            let rule_id = rule.id.clone();
            if let Some(previous) = current_by_category.insert(rule.category, rule) {
                return Err(PrescriptionError::invalid_rule(
                    &rule_id,
                    format!(
                        "duplicate current rule for '{}' (already defined by '{}')",
                        previous.category, previous.id
                    ),
                ));
            }
        }

        for category in TaxCategory::ALL {
            if !current_by_category.contains_key(&category) {
                return Err(PrescriptionError::CatalogIncomplete { category });
            }
        }

        let mut historical_by_category: BTreeMap<TaxCategory, Vec<PrescriptionRule>> = BTreeMap::new();
        for rule in historical {
            validate_rule(&rule)?;
            match rule.effective_until {
                Some(until) if until < rule.effective_from => {
                    return Err(PrescriptionError::invalid_rule(
                        &rule.id,
                        format!(
                            "effective_until {} is before effective_from {}",
                            until, rule.effective_from
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    return Err(PrescriptionError::invalid_rule(
                        &rule.id,
                        "historical rules need an effective_until date",
                    ));
                }
            }
            historical_by_category.entry(rule.category).or_default().push(rule);
        }

        for rules in historical_by_category.values() {
            warn_on_overlaps(rules);
        }

        let default_rule = current_by_category
            .get(&TaxCategory::Other)
            .cloned()
            .ok_or(PrescriptionError::CatalogIncomplete {
                category: TaxCategory::Other,
            })?;

        tracing::debug!(
            current = current_by_category.len(),
            historical = historical_by_category.values().map(Vec::len).sum::<usize>(),
            "rule catalog built"
        );

        Ok(Self {
            current: current_by_category,
            historical: historical_by_category,
            default_rule,
        })
    }

    /// 內建的摩洛哥規則表
    pub fn moroccan() -> Result<Self> {
        Self::new(builtin_current_rules(), builtin_historical_rules())
    }

    /// 先找 `reference_date` 當天有效的舊規則，否則使用現行規則
    pub fn resolve_rule(&self, category: TaxCategory, reference_date: NaiveDate) -> &PrescriptionRule {
        if let Some(rule) = self
            .historical
            .get(&category)
            .and_then(|rules| rules.iter().find(|rule| rule.is_in_force_on(reference_date)))
        {
            tracing::debug!(%category, rule_id = %rule.id, %reference_date, "historical rule applies");
            return rule;
        }

        self.current.get(&category).unwrap_or(&self.default_rule)
    }

    /// 以字串查詢規則，無法辨識時使用預設規則
    pub fn resolve_rule_by_name(&self, category: &str, reference_date: NaiveDate) -> &PrescriptionRule {
        self.resolve_rule(TaxCategory::coerce(category), reference_date)
    }

    pub fn default_rule(&self) -> &PrescriptionRule {
        &self.default_rule
    }

    pub fn current_rule(&self, category: TaxCategory) -> Option<&PrescriptionRule> {
        self.current.get(&category)
    }

    pub fn current_rules(&self) -> impl Iterator<Item = &PrescriptionRule> {
        self.current.values()
    }

    pub fn historical_rules(&self) -> impl Iterator<Item = &PrescriptionRule> {
        self.historical.values().flatten()
    }
}

impl RuleResolver for RuleCatalog {
    fn resolve_rule(&self, category: TaxCategory, reference_date: NaiveDate) -> &PrescriptionRule {
        RuleCatalog::resolve_rule(self, category, reference_date)
    }
}

fn validate_rule(rule: &PrescriptionRule) -> Result<()> {
    if rule.id.trim().is_empty() {
        return Err(PrescriptionError::invalid_rule(
            &format!("<{}>", rule.category),
            "rule id cannot be empty",
        ));
    }
    if rule.prescription_years == 0 {
        return Err(PrescriptionError::invalid_rule(&rule.id, "prescription_years must be positive"));
    }
    // 目前只支援整年計算
    if rule.prescription_months != 0 {
        return Err(PrescriptionError::invalid_rule(
            &rule.id,
            format!(
                "prescription_months = {} is not supported, only whole years",
                rule.prescription_months
            ),
        ));
    }
    if let Some(overrides) = &rule.exception_overrides {
        if overrides.fraud == Some(0) || overrides.omission == Some(0) {
            return Err(PrescriptionError::invalid_rule(
                &rule.id,
                "exception overrides must be positive",
            ));
        }
    }
    Ok(())
}

fn warn_on_overlaps(rules: &[PrescriptionRule]) {
    for (i, first) in rules.iter().enumerate() {
        for second in &rules[i + 1..] {
            let overlaps = match (first.effective_until, second.effective_until) {
                (Some(first_until), Some(second_until)) => {
                    first.effective_from <= second_until && second.effective_from <= first_until
                }
                _ => true,
            };
            if overlaps {
                tracing::warn!(
                    category = %first.category,
                    first = %first.id,
                    second = %second.id,
                    "historical rule windows overlap, '{}' wins",
                    first.id
                );
            }
        }
    }
}

fn current_rule(
    id: &str,
    category: TaxCategory,
    prescription_years: u32,
    legal_basis: LegalBasis,
    special_conditions: Option<&str>,
    exception_overrides: Option<ExceptionOverrides>,
) -> PrescriptionRule {
    PrescriptionRule {
        id: id.to_string(),
        category,
        prescription_years,
        prescription_months: 0,
        legal_basis,
        effective_from: CURRENT_EFFECTIVE_DATE,
        effective_until: None,
        special_conditions: special_conditions.map(str::to_string),
        exception_overrides,
    }
}

fn builtin_current_rules() -> Vec<PrescriptionRule> {
    use LegalBasis::*;
    use TaxCategory::*;

    let cgi_232_overrides = Some(ExceptionOverrides {
        fraud: Some(10),
        omission: Some(6),
    });

    vec![
        current_rule(
            "ir-rule",
            IncomeTax,
            4,
            CgiArticle232,
            Some("تبدأ من تاريخ استحقاق الضريبة أو إيداع التصريح، أيهما أحدث"),
            cgi_232_overrides,
        ),
        current_rule(
            "is-rule",
            CorporateTax,
            4,
            CgiArticle232,
            Some("تنطبق نفس قواعد ضريبة الدخل مع مراعاة خصوصية الشركات"),
            cgi_232_overrides,
        ),
        current_rule(
            "tva-rule",
            Vat,
            4,
            CgiGeneral,
            Some("تنطبق القواعد العامة مع مراعاة التصريحات الشهرية"),
            None,
        ),
        current_rule("real-estate-rule", RealEstateTax, 4, Law4706, None, None),
        current_rule("property-rule", PropertyTax, 4, CgiGeneral, None, None),
        current_rule(
            "th-rule",
            HousingTax,
            4,
            Law4706,
            Some("تفرضها الجماعات الترابية على المساكن"),
            None,
        ),
        current_rule(
            "tp-rule",
            ProfessionalTax,
            4,
            Law4706,
            Some("تطبق على الأنشطة المهنية في النطاق الترابي"),
            None,
        ),
        current_rule("urban-rule", UrbanTax, 4, Law4706, None, None),
        current_rule("rural-rule", RuralTax, 4, Law4706, None, None),
        current_rule(
            "clean-rule",
            CleaningTax,
            4,
            Law4706,
            Some("تفرضها الجماعات المحلية لخدمات النظافة"),
            None,
        ),
        current_rule(
            "registration-rule",
            RegistrationDuties,
            4,
            CgiGeneral,
            Some("تنطبق القواعد العامة مع استثناءات للأحكام القديمة"),
            None,
        ),
        current_rule("stamp-rule", StampDuties, 4, FinanceLaw, None, None),
        current_rule("env-rule", EnvironmentalFees, 4, EnvironmentalLaw, None, None),
        current_rule("community-rule", CommunityServices, 4, LocalRegulations, None, None),
        current_rule(
            "customs-rule",
            CustomsDuties,
            3,
            CustomsCode,
            Some("وفق المجموعة الجمركية المغربية"),
            None,
        ),
        current_rule(
            "cnss-rule",
            Cnss,
            5,
            CnssLaw,
            Some("اشتراكات الصندوق الوطني للضمان الاجتماعي"),
            None,
        ),
        current_rule(
            "other-rule",
            Other,
            4,
            CgiGeneral,
            Some("القاعدة العامة للمدونة العامة للضرائب"),
            None,
        ),
    ]
}

fn builtin_historical_rules() -> Vec<PrescriptionRule> {
    vec![PrescriptionRule {
        id: "old-reg-rule".to_string(),
        category: TaxCategory::RegistrationDuties,
        prescription_years: 10,
        prescription_months: 0,
        legal_basis: LegalBasis::CgiGeneral,
        effective_from: ymd(2000, 1, 1),
        effective_until: Some(ymd(2015, 12, 31)),
        special_conditions: Some("القواعد القديمة لرسوم التسجيل غير المصرح عنها".to_string()),
        exception_overrides: None,
    }]
}
