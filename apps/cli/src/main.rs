#![deny(warnings)]

//! Headless CLI: loads the four dashboard documents and renders the
//! earnings and theme simulators plus the catalog listings.

use anyhow::Result;
use dash_core::{Palette, SimulationInput};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

struct Args {
    data_dir: PathBuf,
    input: SimulationInput,
    json: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        data_dir: PathBuf::from("assets"),
        input: SimulationInput::default(),
        json: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => {
                if let Some(v) = it.next() {
                    args.data_dir = PathBuf::from(v);
                }
            }
            "--messages" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.input.messages = v;
                }
            }
            "--sales" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.input.sales = v;
                }
            }
            "--referrals" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.input.vip_referrals = v;
                }
            }
            "--level" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.input.level = v;
                }
            }
            "--json" => args.json = true,
            _ => {}
        }
    }
    args
}

/// Fixed theme applied when no palette is configured for the level.
fn default_palette() -> Palette {
    Palette {
        accent: "#3b82f6".to_string(),
        background: "#111827".to_string(),
        surface: "#1f2937".to_string(),
        text: "#f9fafb".to_string(),
    }
}

/// Presentation-side effect: render the active theme variables.
fn apply_palette(palette: &Palette) {
    println!(
        "Thème | accent: {} | fond: {} | surface: {} | texte: {}",
        palette.accent, palette.background, palette.surface, palette.text
    );
}

fn category_icon(category: &str) -> &'static str {
    match category {
        "Services & Avantages Discord" => "⚙️",
        "Ebooks & Guides" | "Formations" => "📘",
        "Comptes Premium" | "Services Financiers" => "💳",
        "Gaming - Outils" | "Gaming - Monnaie Virtuelle" => "🎮",
        "Panels" | "Outils & Logiciels" => "🤖",
        "Services de Création" => "✏️",
        "Logs" => "📈",
        "Boost Réseaux Sociaux" => "👥",
        "Fournisseurs & Accès Exclusifs" => "🚚",
        _ => "📦",
    }
}

fn shop_icon(name: &str) -> &'static str {
    match name {
        "rocket" => "🚀",
        "trending_up" => "📈",
        "level_up" => "🆙",
        "ticket" => "🎟️",
        _ => "💳",
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(sha = env!("GIT_SHA"), dir = %args.data_dir.display(), "loading dashboard documents");

    let data = match dash_config::load_dir(&args.data_dir) {
        Ok(data) => data,
        Err(err) => {
            error!(?err, "document load failed");
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let gamification = data.config.sections.gamification.as_ref();
    let profile_card = data.config.sections.profile_card.as_ref();

    let earnings = dash_engine::project_earnings(gamification, &args.input);
    let palette = dash_engine::select_palette(profile_card, args.input.level as f64)
        .unwrap_or_else(default_palette);

    if args.json {
        let report = serde_json::json!({
            "input": args.input,
            "earnings": earnings,
            "palette": palette,
            "products": data
                .products
                .iter()
                .map(|p| serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "category": p.category,
                    "price_display": dash_engine::price_display(p),
                }))
                .collect::<Vec<_>>(),
            "credit_shop": data
                .credit_shop
                .iter()
                .map(|item| serde_json::json!({
                    "id": item.id,
                    "name": item.name,
                    "cost_display": dash_engine::credit_cost_display(item),
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Simulateur de Gains | messages: {} | ventes: {} € | filleuls VIP: {} | niveau: {}",
        args.input.messages, args.input.sales, args.input.vip_referrals, args.input.level
    );
    println!(
        "  ✨ XP estimé: {} | 💰 crédits estimés: {}",
        earnings.xp, earnings.credits
    );
    if let Some(g) = gamification {
        if let Some(next) = dash_engine::next_commission_tier(&g.affiliate_system, args.input.level)
        {
            if let Some(level) = next.level {
                println!(
                    "  🚀 Au niveau {}, la commission passe à {:.0}%",
                    level,
                    next.rate * 100.0
                );
            }
        }
    }

    apply_palette(&palette);

    println!("Catalogue de Produits ({})", data.products.len());
    for p in &data.products {
        println!(
            "  {} {} [{}] — {}",
            category_icon(&p.category),
            p.name,
            p.category,
            dash_engine::price_display(p)
        );
    }

    println!("Boutique de Crédits ({})", data.credit_shop.len());
    for item in &data.credit_shop {
        println!(
            "  {} {} — {}",
            shop_icon(&item.icon),
            item.name,
            dash_engine::credit_cost_display(item)
        );
    }

    println!("Succès ({})", data.achievements.len());
    for a in &data.achievements {
        println!("  🏆 {} — Récompense: {} XP", a.name, a.reward_xp);
    }

    if let Some(m) = &data.config.sections.missions {
        println!(
            "Système de Missions | actif: {} | opt-in par défaut: {}",
            m.enabled, m.opt_in_default
        );
    }
    if let Some(t) = &data.config.sections.transaction_log {
        println!(
            "Journal des Transactions | actif: {} | taille max: {}",
            t.enabled, t.max_user_log_size
        );
    }
    let residual_keys: Vec<&str> = data.config.residual.keys().map(String::as_str).collect();
    println!("Configuration Générale | clés: {}", residual_keys.join(", "));

    Ok(())
}
