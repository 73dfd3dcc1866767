// 📋 Fund metadata record - one row per fund
// Every attribute except scheme_name is nullable opaque text.

use serde::{Deserialize, Serialize};

/// Fixed column order shared by the destination tables and CSV output
pub const COLUMNS: [&str; 21] = [
    "scheme_code",
    "scheme_name",
    "fund_type",
    "fund_category",
    "returns_1yr",
    "returns_3yr",
    "returns_5yr",
    "nav",
    "aum",
    "expense_ratio",
    "rating",
    "inception_date",
    "risk_level",
    "fund_manager",
    "benchmark",
    "min_investment",
    "exit_load",
    "dividend_frequency",
    "latest_nav_date",
    "direct_plan",
    "growth_plan",
];

/// Fund metadata row.
///
/// `scheme_code` is `None` until the reconciler assigns a catalog code.
/// Field order matches [`COLUMNS`], which keeps CSV output in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundMetadataRecord {
    pub scheme_code: Option<String>,
    pub scheme_name: String,
    pub fund_type: Option<String>,
    pub fund_category: Option<String>,
    pub returns_1yr: Option<String>,
    pub returns_3yr: Option<String>,
    pub returns_5yr: Option<String>,
    pub nav: Option<String>,
    pub aum: Option<String>,
    pub expense_ratio: Option<String>,
    pub rating: Option<String>,
    pub inception_date: Option<String>,
    pub risk_level: Option<String>,
    pub fund_manager: Option<String>,
    pub benchmark: Option<String>,
    pub min_investment: Option<String>,
    pub exit_load: Option<String>,
    pub dividend_frequency: Option<String>,
    pub latest_nav_date: Option<String>,
    pub direct_plan: Option<String>,
    pub growth_plan: Option<String>,
}

impl FundMetadataRecord {
    pub fn new(scheme_name: impl Into<String>) -> Self {
        FundMetadataRecord {
            scheme_name: scheme_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set scheme code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.scheme_code = Some(code.into());
        self
    }

    /// Builder: set any descriptive attribute by column name
    pub fn with_attribute(mut self, column: &str, value: impl Into<String>) -> Self {
        if let Some(slot) = self.slot_mut(column) {
            *slot = Some(value.into());
        }
        self
    }

    /// Verified = matched to a catalog entry
    pub fn is_verified(&self) -> bool {
        self.scheme_code.is_some()
    }

    /// Value of a column, `None` for null or unknown columns
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            "scheme_name" => Some(self.scheme_name.as_str()),
            "scheme_code" => self.scheme_code.as_deref(),
            "fund_type" => self.fund_type.as_deref(),
            "fund_category" => self.fund_category.as_deref(),
            "returns_1yr" => self.returns_1yr.as_deref(),
            "returns_3yr" => self.returns_3yr.as_deref(),
            "returns_5yr" => self.returns_5yr.as_deref(),
            "nav" => self.nav.as_deref(),
            "aum" => self.aum.as_deref(),
            "expense_ratio" => self.expense_ratio.as_deref(),
            "rating" => self.rating.as_deref(),
            "inception_date" => self.inception_date.as_deref(),
            "risk_level" => self.risk_level.as_deref(),
            "fund_manager" => self.fund_manager.as_deref(),
            "benchmark" => self.benchmark.as_deref(),
            "min_investment" => self.min_investment.as_deref(),
            "exit_load" => self.exit_load.as_deref(),
            "dividend_frequency" => self.dividend_frequency.as_deref(),
            "latest_nav_date" => self.latest_nav_date.as_deref(),
            "direct_plan" => self.direct_plan.as_deref(),
            "growth_plan" => self.growth_plan.as_deref(),
            _ => None,
        }
    }

    /// Row values in [`COLUMNS`] order
    pub fn values(&self) -> Vec<Option<&str>> {
        COLUMNS.iter().map(|col| self.get(col)).collect()
    }

    // scheme_name is not optional, so it has no slot here
    fn slot_mut(&mut self, column: &str) -> Option<&mut Option<String>> {
        let slot = match column {
            "scheme_code" => &mut self.scheme_code,
            "fund_type" => &mut self.fund_type,
            "fund_category" => &mut self.fund_category,
            "returns_1yr" => &mut self.returns_1yr,
            "returns_3yr" => &mut self.returns_3yr,
            "returns_5yr" => &mut self.returns_5yr,
            "nav" => &mut self.nav,
            "aum" => &mut self.aum,
            "expense_ratio" => &mut self.expense_ratio,
            "rating" => &mut self.rating,
            "inception_date" => &mut self.inception_date,
            "risk_level" => &mut self.risk_level,
            "fund_manager" => &mut self.fund_manager,
            "benchmark" => &mut self.benchmark,
            "min_investment" => &mut self.min_investment,
            "exit_load" => &mut self.exit_load,
            "dividend_frequency" => &mut self.dividend_frequency,
            "latest_nav_date" => &mut self.latest_nav_date,
            "direct_plan" => &mut self.direct_plan,
            "growth_plan" => &mut self.growth_plan,
            _ => return None,
        };
        Some(slot)
    }
}
