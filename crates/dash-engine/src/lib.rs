#![deny(warnings)]

//! Derivation engine for the boost-dash dashboard.
//!
//! Pure helpers that turn loosely-structured configuration plus simulation
//! inputs into derived results:
//! - Tier resolution by descending-threshold matching
//! - Product price and credit-shop cost display strings
//! - Weekly earnings projection (XP and affiliate credits)
//! - Visual palette selection by level
//! - XP boosts, level curve, cashout evaluation, achievement scans
//!
//! Every function is total over its documented input domain: malformed or
//! absent data degrades to a fallback value, never an error, and nothing
//! here touches presentation state.

use chrono::{DateTime, Utc};
use dash_core::{
    Achievement, AffiliateSystem, CashoutSystem, CommissionTier, CreditShopItem, Earnings,
    GamificationConfig, Palette, PaletteTier, Product, ProfileCardConfig, SimulationInput,
    StatSnapshot, TransactionEntry, TransactionLogConfig, VipBoostTier, VipState, VipStatus,
    WithdrawalTier, XpSystem,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Currency code used when a product does not specify one.
const DEFAULT_CURRENCY: &str = "EUR";

/// Journal entries kept when the transaction-log section is absent.
const DEFAULT_MAX_LOG_SIZE: u32 = 50;

/// Levels the geometric curve will walk before giving up; keeps
/// [`level_for_xp`] total when a hostile multiplier never diverges.
const LEVEL_CAP: u32 = 1000;

/// A (threshold, payload) pair selected by finding the highest threshold
/// not exceeding a given input.
pub trait Tiered {
    type Payload: Clone;
    /// Threshold to match against; `None` is unmatchable.
    fn threshold(&self) -> Option<f64>;
    fn payload(&self) -> Self::Payload;
}

impl Tiered for CommissionTier {
    type Payload = f64;
    fn threshold(&self) -> Option<f64> {
        self.level
    }
    fn payload(&self) -> f64 {
        self.rate
    }
}

impl Tiered for VipBoostTier {
    type Payload = f64;
    fn threshold(&self) -> Option<f64> {
        self.consecutive_months
    }
    fn payload(&self) -> f64 {
        self.boost
    }
}

impl Tiered for WithdrawalTier {
    type Payload = f64;
    fn threshold(&self) -> Option<f64> {
        self.level
    }
    fn payload(&self) -> f64 {
        self.threshold
    }
}

impl Tiered for PaletteTier {
    type Payload = Option<Palette>;
    fn threshold(&self) -> Option<f64> {
        self.level
    }
    fn payload(&self) -> Option<Palette> {
        Some(self.palette.clone())
    }
}

/// Resolve the payload applicable to `input` by descending-threshold match.
///
/// The tier list may be empty, unsorted, or carry unmatchable thresholds;
/// the caller's slice is never mutated. Ties on equal thresholds resolve
/// to the earliest tier in document order (stable sort). Returns
/// `fallback` when no tier qualifies.
pub fn resolve_tier<T: Tiered>(tiers: &[T], input: f64, fallback: T::Payload) -> T::Payload {
    let mut ranked: Vec<&T> = tiers.iter().collect();
    ranked.sort_by(|a, b| {
        b.threshold()
            .partial_cmp(&a.threshold())
            .unwrap_or(Ordering::Equal)
    });
    for tier in ranked {
        if let Some(threshold) = tier.threshold() {
            if input >= threshold {
                return tier.payload();
            }
        }
    }
    fallback
}

/// Format a monetary amount with exactly two decimals.
fn format_amount(amount: f64) -> String {
    let d = Decimal::from_f64(amount).unwrap_or_default().round_dp(2);
    format!("{d:.2}")
}

/// Pick the authoritative pricing representation of a product.
///
/// Precedence, first applicable wins: explicit `price_text`, the cheapest
/// option ("À partir de …"), the direct non-negative price, then
/// "Prix sur demande". A missing or non-numeric option price degrades the
/// whole option block to "Prix variable". Never fails.
pub fn price_display(product: &Product) -> String {
    let currency = product.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    if let Some(text) = &product.price_text {
        if !text.is_empty() {
            return text.clone();
        }
    }
    if let Some(options) = &product.options {
        if !options.is_empty() {
            let mut min = f64::INFINITY;
            for opt in options {
                match opt.price {
                    Some(p) if p.is_finite() => min = min.min(p),
                    _ => return "Prix variable".to_string(),
                }
            }
            return format!("À partir de {} {}", format_amount(min), currency);
        }
    }
    if let Some(price) = product.price {
        if price >= 0.0 {
            return format!("{} {}", format_amount(price), currency);
        }
    }
    "Prix sur demande".to_string()
}

/// Display line for a credit-shop item: a plain cost with its unit, or
/// "Coût Dynamique" when the cost is resolved at redemption time.
pub fn credit_cost_display(item: &CreditShopItem) -> String {
    if item.cost > 0.0 {
        format!("{} {}", item.cost, item.unit.as_deref().unwrap_or("Crédits"))
    } else {
        "Coût Dynamique".to_string()
    }
}

/// Project weekly XP and credit earnings from the simulator inputs.
///
/// Absent configuration yields a zeroed result. XP is the mean of the
/// per-message bounds times the message count, plus the VIP referral
/// bonus, rounded half away from zero. Credits apply the commission rate
/// of the member's level (fallback 0) to the sales volume, rounded to two
/// decimals (banker's rounding) and rendered as a currency string.
pub fn project_earnings(config: Option<&GamificationConfig>, input: &SimulationInput) -> Earnings {
    let Some(config) = config else {
        return Earnings {
            xp: 0,
            credits: "0.00".to_string(),
        };
    };
    let xp_cfg = &config.xp_system;
    let [lo, hi] = xp_cfg.xp_per_message;
    let from_messages = input.messages as f64 * (lo + hi) / 2.0;
    let from_referrals = input.vip_referrals as f64 * xp_cfg.xp_bonus_referral_buys_vip;
    let xp = (from_messages + from_referrals).round() as i64;

    let rate = resolve_tier(
        &config.affiliate_system.commission_tiers,
        input.level as f64,
        0.0,
    );
    let credits = Decimal::from_f64(rate).unwrap_or_default()
        * Decimal::from_f64(input.sales).unwrap_or_default();
    Earnings {
        xp,
        credits: format!("{:.2}", credits.round_dp(2)),
    }
}

/// Pick the visual palette for a simulated level.
///
/// Returns `None` when the profile-card sub-document is absent or names no
/// applicable palette; the presentation layer then applies its own fixed
/// defaults.
pub fn select_palette(config: Option<&ProfileCardConfig>, level: f64) -> Option<Palette> {
    let config = config?;
    resolve_tier(&config.level_palettes, level, config.default_palette.clone())
}

/// Roll the XP granted for one qualifying message: a uniform integer in
/// the inclusive configured range, drawn from a seeded generator so
/// replays are reproducible. Inverted or degenerate bounds collapse to
/// the first bound.
pub fn roll_message_xp(xp: &XpSystem, seed: u64) -> u32 {
    let lo = xp.xp_per_message[0].max(0.0) as u32;
    let hi = xp.xp_per_message[1].max(0.0) as u32;
    if hi <= lo {
        return lo;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.gen_range(lo..=hi)
}

/// Total XP multiplier for a member: 1.0, plus every prestige bonus whose
/// milestone the member has reached, plus the VIP subscription boost. The
/// boost is resolved from consecutive subscription months (weeks/4 + 1)
/// and scaled down by configuration while the subscription is in its
/// grace window.
pub fn xp_boost_multiplier(
    config: &GamificationConfig,
    level: u32,
    vip: Option<&VipStatus>,
    now: DateTime<Utc>,
) -> f64 {
    let mut total = 1.0;
    for (milestone, data) in &config.prestige_levels {
        if let Ok(m) = milestone.parse::<u32>() {
            if level >= m {
                total += data.xp_bonus;
            }
        }
    }
    if let Some(vip) = vip {
        let premium = &config.vip_system.premium;
        let in_grace =
            vip.state == VipState::Grace && vip.grace_end.map(|end| now < end).unwrap_or(false);
        if vip.state == VipState::Active || in_grace {
            let months = (vip.consecutive_weeks / 4 + 1) as f64;
            let mut boost = resolve_tier(&premium.xp_boost_tiers, months, 0.0);
            if in_grace {
                boost *= premium.grace_period_benefit_multiplier;
            }
            total += boost;
        }
    }
    total
}

/// XP required to leave `level` under the geometric curve, truncated the
/// way the reference arithmetic truncates.
pub fn xp_required(xp: &XpSystem, level: u32) -> f64 {
    (xp.level_up_formula_base_xp * xp.level_up_formula_multiplier.powi(level as i32)).trunc()
}

/// Level reached with `total_xp`: the number of consecutive requirements
/// met, starting from level 0. Capped so a non-diverging curve cannot
/// loop forever.
pub fn level_for_xp(xp: &XpSystem, total_xp: f64) -> u32 {
    if xp.level_up_formula_base_xp <= 0.0 {
        return 0;
    }
    let mut level = 0;
    while level < LEVEL_CAP && total_xp >= xp_required(xp, level) {
        level += 1;
    }
    level
}

/// The lowest commission tier still above `level`, if any — the "next
/// objective" shown in level-up notices.
pub fn next_commission_tier(aff: &AffiliateSystem, level: u32) -> Option<&CommissionTier> {
    aff.commission_tiers
        .iter()
        .filter(|t| t.level.map_or(false, |l| (level as f64) < l))
        .min_by(|a, b| a.level.partial_cmp(&b.level).unwrap_or(Ordering::Equal))
}

/// XP granted for a verified purchase: the spent amount times the
/// configured per-euro rate, truncated toward zero.
pub fn purchase_xp(xp: &XpSystem, amount_eur: f64) -> i64 {
    (amount_eur * xp.xp_per_euro_spent).trunc() as i64
}

/// A store-credit withdrawal request under evaluation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CashoutRequest {
    pub amount: f64,
    pub level: u32,
    pub account_age_days: f64,
    pub store_credit: f64,
}

/// Outcome of evaluating a withdrawal request against the cashout rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CashoutVerdict {
    Disabled,
    AccountTooYoung { required_days: f64 },
    LevelTooLow { required: u32 },
    BelowMinimum { minimum: f64 },
    InsufficientCredit,
    Payable { credit_debited: Decimal, euros: Decimal },
}

/// Evaluate a withdrawal request. Checks run in order: the system switch,
/// account age, level, the level-dependent minimum, then the member's
/// balance. The minimum falls back to +∞ when no threshold tier matches,
/// which blocks withdrawal outright.
pub fn evaluate_cashout(config: Option<&CashoutSystem>, req: &CashoutRequest) -> CashoutVerdict {
    let Some(config) = config else {
        return CashoutVerdict::Disabled;
    };
    if !config.enabled {
        return CashoutVerdict::Disabled;
    }
    if req.account_age_days < config.minimum_account_age_days {
        return CashoutVerdict::AccountTooYoung {
            required_days: config.minimum_account_age_days,
        };
    }
    if req.level < config.minimum_level {
        return CashoutVerdict::LevelTooLow {
            required: config.minimum_level,
        };
    }
    let minimum = resolve_tier(&config.withdrawal_thresholds, req.level as f64, f64::INFINITY);
    if req.amount < minimum {
        return CashoutVerdict::BelowMinimum { minimum };
    }
    if req.amount > req.store_credit {
        return CashoutVerdict::InsufficientCredit;
    }
    let amount = Decimal::from_f64(req.amount).unwrap_or_default();
    let rate = Decimal::from_f64(config.credit_to_eur_rate).unwrap_or_default();
    CashoutVerdict::Payable {
        credit_debited: amount.round_dp(2),
        euros: (amount * rate).round_dp(2),
    }
}

/// Achievements newly unlocked by a member's stats: definitions whose
/// trigger stat meets the threshold, minus those already owned.
pub fn unlocked_achievements<'a>(
    defs: &'a [Achievement],
    stats: &StatSnapshot,
    owned: &BTreeSet<String>,
) -> Vec<&'a Achievement> {
    defs.iter()
        .filter(|a| !owned.contains(&a.id))
        .filter(|a| {
            a.trigger
                .as_ref()
                .map_or(false, |t| stats.get(&t.kind).copied().unwrap_or(0.0) >= t.value)
        })
        .collect()
}

/// Trim a transaction journal to the configured maximum, keeping the most
/// recent entries. An absent section keeps the default cap.
pub fn trim_transaction_log(
    log: &mut Vec<TransactionEntry>,
    config: Option<&TransactionLogConfig>,
) {
    let max = config.map_or(DEFAULT_MAX_LOG_SIZE, |c| c.max_user_log_size) as usize;
    if log.len() > max {
        let excess = log.len() - max;
        log.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{AchievementTrigger, PrestigeLevel, VipPremium, VipSystem};
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    struct TestTier {
        level: Option<f64>,
        payload: &'static str,
    }

    impl Tiered for TestTier {
        type Payload = &'static str;
        fn threshold(&self) -> Option<f64> {
            self.level
        }
        fn payload(&self) -> &'static str {
            self.payload
        }
    }

    fn tier(level: f64, payload: &'static str) -> TestTier {
        TestTier {
            level: Some(level),
            payload,
        }
    }

    fn commission_tiers(pairs: &[(f64, f64)]) -> Vec<CommissionTier> {
        pairs
            .iter()
            .map(|&(level, rate)| CommissionTier {
                level: Some(level),
                rate,
            })
            .collect()
    }

    fn gamification(tiers: &[(f64, f64)]) -> GamificationConfig {
        GamificationConfig {
            xp_system: XpSystem {
                xp_per_message: [1.0, 3.0],
                xp_bonus_referral_buys_vip: 50.0,
                ..XpSystem::default()
            },
            affiliate_system: AffiliateSystem {
                commission_tiers: commission_tiers(tiers),
            },
            ..GamificationConfig::default()
        }
    }

    #[test]
    fn empty_tier_list_returns_fallback() {
        assert_eq!(resolve_tier::<TestTier>(&[], 5.0, "default"), "default");
    }

    #[test]
    fn resolves_highest_threshold_not_exceeding_input() {
        let tiers = vec![tier(10.0, "A"), tier(0.0, "B")];
        assert_eq!(resolve_tier(&tiers, 5.0, "Z"), "B");
        assert_eq!(resolve_tier(&tiers, 10.0, "Z"), "A");
        assert_eq!(resolve_tier(&tiers, -1.0, "Z"), "Z");
    }

    #[test]
    fn unsorted_input_and_unmatchable_levels() {
        let tiers = vec![
            tier(20.0, "gold"),
            TestTier {
                level: None,
                payload: "broken",
            },
            tier(0.0, "base"),
            tier(10.0, "silver"),
        ];
        assert_eq!(resolve_tier(&tiers, 15.0, "fb"), "silver");
        assert_eq!(resolve_tier(&tiers, 25.0, "fb"), "gold");
    }

    #[test]
    fn equal_thresholds_resolve_deterministically() {
        let tiers = vec![tier(5.0, "first"), tier(5.0, "second")];
        let a = resolve_tier(&tiers, 7.0, "fb");
        let b = resolve_tier(&tiers, 7.0, "fb");
        assert_eq!(a, b);
        assert_eq!(a, "first");
    }

    #[test]
    fn price_text_wins() {
        let p = Product {
            price_text: Some("Free".to_string()),
            price: Some(10.0),
            ..Product::default()
        };
        assert_eq!(price_display(&p), "Free");
    }

    #[test]
    fn cheapest_option_is_displayed() {
        let p = Product {
            currency: Some("USD".to_string()),
            options: Some(vec![
                dash_core::ProductOption {
                    name: None,
                    price: Some(5.0),
                },
                dash_core::ProductOption {
                    name: None,
                    price: Some(3.0),
                },
            ]),
            ..Product::default()
        };
        assert_eq!(price_display(&p), "À partir de 3.00 USD");
    }

    #[test]
    fn malformed_option_price_degrades() {
        let p = Product {
            options: Some(vec![dash_core::ProductOption {
                name: Some("1 mois".to_string()),
                price: None,
            }]),
            ..Product::default()
        };
        assert_eq!(price_display(&p), "Prix variable");
    }

    #[test]
    fn direct_price_uses_default_currency() {
        let p = Product {
            price: Some(12.5),
            ..Product::default()
        };
        assert_eq!(price_display(&p), "12.50 EUR");
    }

    #[test]
    fn bare_product_is_price_on_request() {
        assert_eq!(price_display(&Product::default()), "Prix sur demande");
        let negative = Product {
            price: Some(-1.0),
            ..Product::default()
        };
        assert_eq!(price_display(&negative), "Prix sur demande");
    }

    #[test]
    fn credit_cost_lines() {
        let item = CreditShopItem {
            cost: 500.0,
            ..CreditShopItem::default()
        };
        assert_eq!(credit_cost_display(&item), "500 Crédits");
        let with_unit = CreditShopItem {
            cost: 2.5,
            unit: Some("Jetons".to_string()),
            ..CreditShopItem::default()
        };
        assert_eq!(credit_cost_display(&with_unit), "2.5 Jetons");
        let dynamic = CreditShopItem::default();
        assert_eq!(credit_cost_display(&dynamic), "Coût Dynamique");
    }

    #[test]
    fn absent_config_projects_zero() {
        let out = project_earnings(None, &SimulationInput::default());
        assert_eq!(out.xp, 0);
        assert_eq!(out.credits, "0.00");
    }

    #[test]
    fn reference_projection() {
        let config = gamification(&[(0.0, 0.05), (20.0, 0.10)]);
        let input = SimulationInput {
            messages: 100,
            sales: 200.0,
            vip_referrals: 1,
            level: 10,
        };
        let out = project_earnings(Some(&config), &input);
        // 100 * mean(1,3) + 1 * 50
        assert_eq!(out.xp, 250);
        assert_eq!(out.credits, "10.00");
    }

    #[test]
    fn higher_tier_rate_applies_at_level_20() {
        let config = gamification(&[(0.0, 0.05), (20.0, 0.10)]);
        let input = SimulationInput {
            level: 20,
            ..SimulationInput::default()
        };
        assert_eq!(project_earnings(Some(&config), &input).credits, "20.00");
    }

    #[test]
    fn projection_is_idempotent() {
        let config = gamification(&[(0.0, 0.05)]);
        let input = SimulationInput::default();
        assert_eq!(
            project_earnings(Some(&config), &input),
            project_earnings(Some(&config), &input)
        );
    }

    #[test]
    fn palette_selection() {
        let gold = Palette {
            accent: "#fbbf24".to_string(),
            ..Palette::default()
        };
        let base = Palette {
            accent: "#3b82f6".to_string(),
            ..Palette::default()
        };
        let config = ProfileCardConfig {
            default_palette: Some(base.clone()),
            level_palettes: vec![PaletteTier {
                level: Some(20.0),
                palette: gold.clone(),
            }],
        };
        assert_eq!(select_palette(None, 30.0), None);
        assert_eq!(select_palette(Some(&config), 30.0), Some(gold));
        assert_eq!(select_palette(Some(&config), 3.0), Some(base));
        let no_default = ProfileCardConfig {
            default_palette: None,
            level_palettes: vec![],
        };
        assert_eq!(select_palette(Some(&no_default), 3.0), None);
    }

    #[test]
    fn message_xp_roll_is_seeded_and_bounded() {
        let xp = XpSystem {
            xp_per_message: [1.0, 3.0],
            ..XpSystem::default()
        };
        let a = roll_message_xp(&xp, 42);
        let b = roll_message_xp(&xp, 42);
        assert_eq!(a, b);
        assert!((1..=3).contains(&a));
        let degenerate = XpSystem {
            xp_per_message: [3.0, 1.0],
            ..XpSystem::default()
        };
        assert_eq!(roll_message_xp(&degenerate, 7), 3);
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn prestige_and_vip_boosts_stack() {
        let mut config = GamificationConfig::default();
        config.prestige_levels.insert(
            "20".to_string(),
            PrestigeLevel {
                xp_bonus: 0.1,
                description: String::new(),
            },
        );
        config.prestige_levels.insert(
            "40".to_string(),
            PrestigeLevel {
                xp_bonus: 0.2,
                description: String::new(),
            },
        );
        config.vip_system = VipSystem {
            premium: VipPremium {
                xp_boost_tiers: vec![
                    VipBoostTier {
                        consecutive_months: Some(1.0),
                        boost: 0.1,
                    },
                    VipBoostTier {
                        consecutive_months: Some(3.0),
                        boost: 0.3,
                    },
                ],
                grace_period_benefit_multiplier: 0.5,
            },
        };

        // Level 25: one prestige milestone, no VIP.
        assert!((xp_boost_multiplier(&config, 25, None, now()) - 1.1).abs() < 1e-9);

        // 10 consecutive weeks => 3 months => 0.3 boost.
        let active = VipStatus {
            state: VipState::Active,
            consecutive_weeks: 10,
            grace_end: None,
        };
        assert!((xp_boost_multiplier(&config, 25, Some(&active), now()) - 1.4).abs() < 1e-9);

        // Grace halves the boost while the window is open.
        let grace = VipStatus {
            state: VipState::Grace,
            consecutive_weeks: 10,
            grace_end: Some(now() + chrono::Duration::hours(1)),
        };
        assert!((xp_boost_multiplier(&config, 25, Some(&grace), now()) - 1.25).abs() < 1e-9);

        // An elapsed grace window grants nothing.
        let lapsed = VipStatus {
            state: VipState::Grace,
            consecutive_weeks: 10,
            grace_end: Some(now() - chrono::Duration::hours(1)),
        };
        assert!((xp_boost_multiplier(&config, 25, Some(&lapsed), now()) - 1.1).abs() < 1e-9);
    }

    #[test]
    fn level_curve() {
        let xp = XpSystem {
            level_up_formula_base_xp: 100.0,
            level_up_formula_multiplier: 2.0,
            ..XpSystem::default()
        };
        assert_eq!(xp_required(&xp, 0), 100.0);
        assert_eq!(xp_required(&xp, 3), 800.0);
        assert_eq!(level_for_xp(&xp, 0.0), 0);
        assert_eq!(level_for_xp(&xp, 100.0), 1);
        assert_eq!(level_for_xp(&xp, 399.0), 2);
        assert_eq!(level_for_xp(&xp, 400.0), 3);
        assert_eq!(level_for_xp(&xp, 800.0), 4);
        // Unconfigured curve never grants a level.
        assert_eq!(level_for_xp(&XpSystem::default(), 1.0e9), 0);
    }

    #[test]
    fn next_tier_is_the_closest_above() {
        let aff = AffiliateSystem {
            commission_tiers: commission_tiers(&[(0.0, 0.05), (20.0, 0.10), (35.0, 0.15)]),
        };
        let next = next_commission_tier(&aff, 10).unwrap();
        assert_eq!(next.level, Some(20.0));
        let next = next_commission_tier(&aff, 20).unwrap();
        assert_eq!(next.level, Some(35.0));
        assert!(next_commission_tier(&aff, 35).is_none());
    }

    #[test]
    fn purchase_xp_truncates() {
        let xp = XpSystem {
            xp_per_euro_spent: 2.0,
            ..XpSystem::default()
        };
        assert_eq!(purchase_xp(&xp, 12.75), 25);
    }

    fn cashout_config() -> CashoutSystem {
        CashoutSystem {
            enabled: true,
            minimum_level: 10,
            minimum_account_age_days: 30.0,
            credit_to_eur_rate: 0.8,
            withdrawal_thresholds: vec![
                WithdrawalTier {
                    level: Some(10.0),
                    threshold: 50.0,
                },
                WithdrawalTier {
                    level: Some(30.0),
                    threshold: 20.0,
                },
            ],
        }
    }

    #[test]
    fn cashout_check_precedence() {
        let cfg = cashout_config();
        let req = CashoutRequest {
            amount: 60.0,
            level: 15,
            account_age_days: 90.0,
            store_credit: 100.0,
        };

        assert_eq!(evaluate_cashout(None, &req), CashoutVerdict::Disabled);

        let disabled = CashoutSystem {
            enabled: false,
            ..cfg.clone()
        };
        assert_eq!(evaluate_cashout(Some(&disabled), &req), CashoutVerdict::Disabled);

        let young = CashoutRequest {
            account_age_days: 3.0,
            ..req.clone()
        };
        assert_eq!(
            evaluate_cashout(Some(&cfg), &young),
            CashoutVerdict::AccountTooYoung {
                required_days: 30.0
            }
        );

        let low = CashoutRequest {
            level: 5,
            ..req.clone()
        };
        assert_eq!(
            evaluate_cashout(Some(&cfg), &low),
            CashoutVerdict::LevelTooLow { required: 10 }
        );

        let small = CashoutRequest {
            amount: 40.0,
            ..req.clone()
        };
        assert_eq!(
            evaluate_cashout(Some(&cfg), &small),
            CashoutVerdict::BelowMinimum { minimum: 50.0 }
        );

        let broke = CashoutRequest {
            store_credit: 10.0,
            ..req.clone()
        };
        assert_eq!(
            evaluate_cashout(Some(&cfg), &broke),
            CashoutVerdict::InsufficientCredit
        );

        match evaluate_cashout(Some(&cfg), &req) {
            CashoutVerdict::Payable {
                credit_debited,
                euros,
            } => {
                assert_eq!(credit_debited, Decimal::new(6000, 2));
                assert_eq!(euros, Decimal::new(4800, 2));
            }
            other => panic!("expected payable, got {other:?}"),
        }
    }

    #[test]
    fn cashout_without_matching_threshold_is_blocked() {
        let mut cfg = cashout_config();
        cfg.minimum_level = 0;
        cfg.withdrawal_thresholds.clear();
        let req = CashoutRequest {
            amount: 1.0e9,
            level: 5,
            account_age_days: 90.0,
            store_credit: 2.0e9,
        };
        assert_eq!(
            evaluate_cashout(Some(&cfg), &req),
            CashoutVerdict::BelowMinimum {
                minimum: f64::INFINITY
            }
        );
    }

    #[test]
    fn achievement_scan() {
        let defs = vec![
            Achievement {
                id: "first-steps".to_string(),
                name: "Premiers Pas".to_string(),
                reward_xp: 50,
                trigger: Some(AchievementTrigger {
                    kind: "message_count".to_string(),
                    value: 10.0,
                }),
                ..Achievement::default()
            },
            Achievement {
                id: "big-spender".to_string(),
                name: "Grand Acheteur".to_string(),
                reward_xp: 200,
                trigger: Some(AchievementTrigger {
                    kind: "purchase_count".to_string(),
                    value: 5.0,
                }),
                ..Achievement::default()
            },
            Achievement {
                id: "no-trigger".to_string(),
                ..Achievement::default()
            },
        ];
        let mut stats = StatSnapshot::new();
        stats.insert("message_count".to_string(), 12.0);
        stats.insert("purchase_count".to_string(), 2.0);
        let mut owned = BTreeSet::new();

        let unlocked = unlocked_achievements(&defs, &stats, &owned);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "first-steps");

        owned.insert("first-steps".to_string());
        assert!(unlocked_achievements(&defs, &stats, &owned).is_empty());
    }

    #[test]
    fn log_trim_keeps_most_recent() {
        let entry = |i: i64| TransactionEntry {
            timestamp: DateTime::from_timestamp(i, 0).unwrap(),
            stat: "xp".to_string(),
            amount: Decimal::from(i),
            reason: String::new(),
        };
        let mut log: Vec<_> = (0..60).map(entry).collect();
        let cfg = TransactionLogConfig {
            enabled: true,
            max_user_log_size: 10,
        };
        trim_transaction_log(&mut log, Some(&cfg));
        assert_eq!(log.len(), 10);
        assert_eq!(log[0].amount, Decimal::from(50));

        let mut log: Vec<_> = (0..60).map(entry).collect();
        trim_transaction_log(&mut log, None);
        assert_eq!(log.len(), 50);
    }

    proptest! {
        #[test]
        fn resolver_returns_best_qualifying_or_fallback(
            levels in proptest::collection::vec(proptest::option::of(-100.0f64..100.0), 0..12),
            input in -150.0f64..150.0,
        ) {
            let payloads = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"];
            let tiers: Vec<TestTier> = levels
                .iter()
                .enumerate()
                .map(|(i, &level)| TestTier { level, payload: payloads[i] })
                .collect();
            let result = resolve_tier(&tiers, input, "fallback");
            let best = tiers
                .iter()
                .filter_map(|t| t.level.filter(|&l| input >= l))
                .fold(None::<f64>, |acc, l| Some(acc.map_or(l, |m| m.max(l))));
            match best {
                None => prop_assert_eq!(result, "fallback"),
                Some(best) => {
                    let qualifies = tiers
                        .iter()
                        .any(|t| t.level == Some(best) && t.payload == result);
                    prop_assert!(qualifies);
                }
            }
        }

        #[test]
        fn price_display_is_total_and_nonempty(
            price in proptest::option::of(-100.0f64..1000.0),
            text in proptest::option::of("[a-zA-Z0-9 ]{0,12}"),
            option_prices in proptest::collection::vec(proptest::option::of(0.0f64..500.0), 0..4),
        ) {
            let p = Product {
                price,
                price_text: text,
                options: Some(
                    option_prices
                        .into_iter()
                        .map(|price| dash_core::ProductOption { name: None, price })
                        .collect(),
                ),
                ..Product::default()
            };
            prop_assert!(!price_display(&p).is_empty());
        }

        #[test]
        fn level_is_monotonic_in_xp(a in 0.0f64..1.0e6, b in 0.0f64..1.0e6) {
            let xp = XpSystem {
                level_up_formula_base_xp: 100.0,
                level_up_formula_multiplier: 1.5,
                ..XpSystem::default()
            };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_xp(&xp, lo) <= level_for_xp(&xp, hi));
        }
    }
}
