#![deny(warnings)]

//! Domain model for the boost-dash gamification dashboard.
//!
//! This crate defines the serializable types behind the four configuration
//! documents (gamification rules, product catalog, achievements, credit-shop
//! items) with tolerant deserialization for untrusted fields, plus validation
//! helpers to flag basic invariant breaches without rejecting a document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Deserialize a numeric field from untrusted configuration.
///
/// Non-numeric values (strings, nulls, objects) map to `None` instead of a
/// parse error; a `None` threshold is unmatchable during tier resolution.
fn lenient_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    Ok(value.as_f64())
}

fn default_true() -> bool {
    true
}

fn default_grace_multiplier() -> f64 {
    0.5
}

fn default_max_log_size() -> u32 {
    50
}

/// Affiliate commission tier, unlocked once the member reaches `level`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommissionTier {
    /// Ordinal threshold; `None` when the configured value is not numeric.
    #[serde(default, deserialize_with = "lenient_number")]
    pub level: Option<f64>,
    /// Fraction of referred sales credited to the member.
    #[serde(default)]
    pub rate: f64,
}

/// VIP XP boost tier, keyed by months of consecutive subscription.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VipBoostTier {
    #[serde(default, deserialize_with = "lenient_number")]
    pub consecutive_months: Option<f64>,
    #[serde(default)]
    pub boost: f64,
}

/// Minimum withdrawal amount applicable from `level` upward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawalTier {
    #[serde(default, deserialize_with = "lenient_number")]
    pub level: Option<f64>,
    #[serde(default)]
    pub threshold: f64,
}

/// Visual palette applied to profile cards from `level` upward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaletteTier {
    #[serde(default, deserialize_with = "lenient_number")]
    pub level: Option<f64>,
    pub palette: Palette,
}

/// A set of four color values describing a visual theme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
}

/// Message/referral XP rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct XpSystem {
    pub enabled: bool,
    /// Inclusive `[min, max]` XP granted per qualifying message.
    pub xp_per_message: [f64; 2],
    pub xp_bonus_referral_buys_vip: f64,
    pub xp_bonus_referral_hits_lvl_5: f64,
    pub xp_per_euro_spent: f64,
    pub level_up_formula_base_xp: f64,
    pub level_up_formula_multiplier: f64,
    pub anti_farm_cooldown_seconds: f64,
    pub anti_farm_min_words: u32,
}

/// Affiliate program settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AffiliateSystem {
    pub commission_tiers: Vec<CommissionTier>,
}

/// Premium VIP subscription perks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VipPremium {
    pub xp_boost_tiers: Vec<VipBoostTier>,
    #[serde(default = "default_grace_multiplier")]
    pub grace_period_benefit_multiplier: f64,
}

impl Default for VipPremium {
    fn default() -> Self {
        Self {
            xp_boost_tiers: Vec::new(),
            grace_period_benefit_multiplier: default_grace_multiplier(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct VipSystem {
    pub premium: VipPremium,
}

/// Permanent XP bonus granted at a prestige milestone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrestigeLevel {
    pub xp_bonus: f64,
    pub description: String,
}

/// Store-credit withdrawal rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CashoutSystem {
    pub enabled: bool,
    pub minimum_level: u32,
    pub minimum_account_age_days: f64,
    pub credit_to_eur_rate: f64,
    pub withdrawal_thresholds: Vec<WithdrawalTier>,
}

/// The gamification sub-document of `config.json`.
///
/// Every section defaults to an inert value when absent, so a partially
/// filled document still yields zeroed derivations rather than an error.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GamificationConfig {
    pub xp_system: XpSystem,
    pub affiliate_system: AffiliateSystem,
    pub vip_system: VipSystem,
    /// Keyed by the stringified prestige level, e.g. `"20"`.
    pub prestige_levels: BTreeMap<String, PrestigeLevel>,
    pub cashout_system: CashoutSystem,
}

/// Mission opt-in settings; unknown keys are preserved for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MissionSystem {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub opt_in_default: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Per-user transaction journal settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TransactionLogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_log_size")]
    pub max_user_log_size: u32,
}

impl Default for TransactionLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_user_log_size: default_max_log_size(),
        }
    }
}

/// Profile-card theming sub-document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ProfileCardConfig {
    pub default_palette: Option<Palette>,
    pub level_palettes: Vec<PaletteTier>,
}

/// One purchasable option of a catalog product.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductOption {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<f64>,
}

/// A catalog product. At most one pricing representation is authoritative;
/// `price` may be absent or negative, signaling "no direct price".
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    pub price_text: Option<String>,
    pub options: Option<Vec<ProductOption>>,
}

/// An item of the credit shop, priced in earned credits.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditShopItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub cost: f64,
    pub unit: Option<String>,
}

/// Condition unlocking an achievement: a user stat reaching a value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AchievementTrigger {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub reward_xp: i64,
    pub trigger: Option<AchievementTrigger>,
}

/// User-adjustable scalars for the what-if simulators. Transient UI state,
/// recomputed on every change, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    pub messages: u32,
    pub sales: f64,
    pub vip_referrals: u32,
    pub level: u32,
}

impl Default for SimulationInput {
    /// Initial slider positions of the dashboard.
    fn default() -> Self {
        Self {
            messages: 100,
            sales: 200.0,
            vip_referrals: 1,
            level: 10,
        }
    }
}

/// Projected weekly earnings. XP stays an integer while credits are a
/// currency-formatted string; the asymmetry is deliberate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Earnings {
    pub xp: i64,
    pub credits: String,
}

/// VIP subscription standing of a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VipState {
    Active,
    Grace,
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VipStatus {
    pub state: VipState,
    pub consecutive_weeks: u32,
    pub grace_end: Option<DateTime<Utc>>,
}

/// One entry of a member's transaction journal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub timestamp: DateTime<Utc>,
    pub stat: String,
    pub amount: Decimal,
    pub reason: String,
}

/// Point-in-time numeric stats of a member, keyed by stat name
/// (e.g. `message_count`, `purchase_count`, `level`).
pub type StatSnapshot = BTreeMap<String, f64>;

/// Validation errors for domain invariants. Advisory: callers log these,
/// they never reject a document.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Palette colors must be `#rrggbb`.
    #[error("color {0:?} is not a #rrggbb value")]
    BadColor(String),
    /// `XP_PER_MESSAGE` must be an ordered `[min, max]` pair.
    #[error("XP_PER_MESSAGE bounds are inverted")]
    InvertedXpBounds,
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// The level curve diverges unless the multiplier exceeds 1.
    #[error("level curve multiplier must be > 1")]
    DegenerateCurve,
    /// Products need an id and a name to be displayable.
    #[error("product is missing an id or name")]
    IncompleteProduct,
}

fn validate_color(color: &str) -> Result<(), ValidationError> {
    let ok = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if ok {
        Ok(())
    } else {
        Err(ValidationError::BadColor(color.to_string()))
    }
}

/// Validate a palette's four color values.
pub fn validate_palette(p: &Palette) -> Result<(), ValidationError> {
    validate_color(&p.accent)?;
    validate_color(&p.background)?;
    validate_color(&p.surface)?;
    validate_color(&p.text)?;
    Ok(())
}

/// Validate the XP rules: finite, ordered bounds and a converging curve.
pub fn validate_xp_system(xp: &XpSystem) -> Result<(), ValidationError> {
    let [lo, hi] = xp.xp_per_message;
    if !(lo.is_finite() && hi.is_finite() && xp.xp_bonus_referral_buys_vip.is_finite()) {
        return Err(ValidationError::NonFinite);
    }
    if lo > hi {
        return Err(ValidationError::InvertedXpBounds);
    }
    if xp.level_up_formula_base_xp > 0.0 && xp.level_up_formula_multiplier <= 1.0 {
        return Err(ValidationError::DegenerateCurve);
    }
    Ok(())
}

/// Validate a catalog product's identity fields.
pub fn validate_product(p: &Product) -> Result<(), ValidationError> {
    if p.id.trim().is_empty() || p.name.trim().is_empty() {
        return Err(ValidationError::IncompleteProduct);
    }
    Ok(())
}
