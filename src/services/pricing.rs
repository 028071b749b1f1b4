//! Discount tier table validation and price computation
//!
//! Pure functions: the same inputs always produce the same quote. Both
//! the order admission path and the bulk recompute job go through
//! [`compute_tier`] so the two paths cannot diverge.

use crate::errors::{Result, TuangouError};
use crate::storage::models::Discount;

/// 阶层设定（尚未入库，级别由排序位置决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TierSpec {
    pub people_count: i64,
    pub percent: i32,
}

/// Result of a tier lookup. `level` 0 means no tier reached and
/// `final_price` equals the base price.
#[derive(Debug, Clone, PartialEq)]
pub struct TierQuote {
    pub level: i32,
    pub final_price: i64,
    pub tier: Option<Discount>,
}

/// Validate a tier table in ascending registration order: thresholds must
/// strictly increase while percentages strictly decrease, so every higher
/// tier is a strictly better deal.
pub fn validate_tiers(tiers: &[TierSpec]) -> Result<()> {
    for (i, tier) in tiers.iter().enumerate() {
        if tier.people_count < 0 || tier.percent < 0 || tier.percent > 100 {
            return Err(TuangouError::validation("階層設定異常"));
        }
        if i > 0 {
            let prev = &tiers[i - 1];
            if tier.people_count <= prev.people_count || tier.percent >= prev.percent {
                return Err(TuangouError::validation("階層設定異常"));
            }
        }
    }
    Ok(())
}

/// Find the deepest tier unlocked by `registered_count` and quote the
/// resulting price. Rounding is half-up on the integer price.
pub fn compute_tier(registered_count: i64, tiers: &[Discount], base_price: i64) -> TierQuote {
    let best = tiers
        .iter()
        .filter(|t| t.people_count <= registered_count)
        .max_by_key(|t| t.people_count);

    match best {
        Some(tier) => TierQuote {
            level: tier.level,
            final_price: discounted_price(base_price, tier.percent),
            tier: Some(tier.clone()),
        },
        None => TierQuote {
            level: 0,
            final_price: base_price,
            tier: None,
        },
    }
}

fn discounted_price(base_price: i64, percent: i32) -> i64 {
    (base_price * percent as i64 + 50) / 100
}
