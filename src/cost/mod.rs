//! Resource and cost model.
//!
//! Pure functions computing the resources and budget an action needs,
//! tiered by technology or infrastructure level, with a shortage penalty
//! multiplier. No side effects.

pub mod pricing;
pub mod tiers;

pub use pricing::{
    apply_action_cost, check_affordability, price_action, required_resources, ActionPricing,
    Affordability,
};
pub use tiers::{CategoryPricing, CostCategory, PricingConfig, TierBand};
