#![deny(warnings)]

//! Document loader for the boost-dash dashboard.
//!
//! Reads the four JSON documents from a data directory, splits the root
//! configuration into its allow-listed sections plus residual keys, and
//! reports any failure as a single generic load error.

use dash_core::{
    validate_palette, validate_product, validate_xp_system, Achievement, CreditShopItem,
    GamificationConfig, MissionSystem, Product, ProfileCardConfig, TransactionLogConfig,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// File names of the four documents, relative to the data directory.
pub const CONFIG_FILE: &str = "config.json";
pub const PRODUCTS_FILE: &str = "products.json";
pub const ACHIEVEMENTS_FILE: &str = "achievements_config.json";
pub const CREDIT_SHOP_FILE: &str = "credit_shop_items.json";

const GAMIFICATION_KEY: &str = "GAMIFICATION_CONFIG";
const MISSIONS_KEY: &str = "MISSION_SYSTEM";
const TRANSACTION_LOG_KEY: &str = "TRANSACTION_LOG_CONFIG";
const PROFILE_CARD_KEY: &str = "PROFILE_CARD_CONFIG";

/// Load failures all display the same generic message; the underlying
/// io/parse cause stays reachable through `source()` for logs and is never
/// attributed to a specific document in the user-facing text.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not load configuration")]
    Io(#[from] std::io::Error),
    #[error("could not load configuration")]
    Parse(#[from] serde_json::Error),
}

/// The typed sections extracted from the root configuration by allow-list.
#[derive(Clone, Debug, Default)]
pub struct KnownSections {
    pub gamification: Option<GamificationConfig>,
    pub missions: Option<MissionSystem>,
    pub transaction_log: Option<TransactionLogConfig>,
    pub profile_card: Option<ProfileCardConfig>,
}

/// `config.json` after splitting: known sections plus the residual keys,
/// kept verbatim for display.
#[derive(Clone, Debug, Default)]
pub struct ConfigDocument {
    pub sections: KnownSections,
    pub residual: Map<String, Value>,
}

/// All four documents, loaded, parsed, and ready for derivation.
#[derive(Clone, Debug)]
pub struct DashboardData {
    pub config: ConfigDocument,
    pub products: Vec<Product>,
    pub achievements: Vec<Achievement>,
    pub credit_shop: Vec<CreditShopItem>,
}

fn take_section<T: DeserializeOwned>(root: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = root.remove(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(section) => Some(section),
        Err(err) => {
            warn!(key, %err, "ignoring malformed configuration section");
            // Leave the raw value visible with the residual keys.
            root.insert(key.to_string(), value);
            None
        }
    }
}

/// Split the root configuration object into the allow-listed sections and
/// the residual map. Malformed sections degrade to absent and stay in the
/// residual; the caller's other keys are untouched.
pub fn split_config(mut root: Map<String, Value>) -> (KnownSections, Map<String, Value>) {
    let sections = KnownSections {
        gamification: take_section(&mut root, GAMIFICATION_KEY),
        missions: take_section(&mut root, MISSIONS_KEY),
        transaction_log: take_section(&mut root, TRANSACTION_LOG_KEY),
        profile_card: take_section(&mut root, PROFILE_CARD_KEY),
    };
    (sections, root)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Load and parse all four documents from `dir`.
///
/// Callers gate every derivation on this returning `Ok`: any single
/// document failing fails the whole load. Validation findings are logged,
/// never fatal.
pub fn load_dir(dir: &Path) -> Result<DashboardData, LoadError> {
    let root: Value = read_json(&dir.join(CONFIG_FILE))?;
    let config = match root {
        Value::Object(map) => {
            let (sections, residual) = split_config(map);
            ConfigDocument { sections, residual }
        }
        _ => {
            warn!("configuration root is not an object; treating as empty");
            ConfigDocument::default()
        }
    };
    let products: Vec<Product> = read_json(&dir.join(PRODUCTS_FILE))?;
    let achievements: Vec<Achievement> = read_json(&dir.join(ACHIEVEMENTS_FILE))?;
    let credit_shop: Vec<CreditShopItem> = read_json(&dir.join(CREDIT_SHOP_FILE))?;

    for product in &products {
        if let Err(err) = validate_product(product) {
            warn!(id = %product.id, %err, "catalog product failed validation");
        }
    }
    if let Some(g) = &config.sections.gamification {
        if let Err(err) = validate_xp_system(&g.xp_system) {
            warn!(%err, "XP system failed validation");
        }
    }
    if let Some(pc) = &config.sections.profile_card {
        for tier in &pc.level_palettes {
            if let Err(err) = validate_palette(&tier.palette) {
                warn!(%err, "palette tier failed validation");
            }
        }
    }

    Ok(DashboardData {
        config,
        products,
        achievements,
        credit_shop,
    })
}
