use serde::{Deserialize, Serialize};

use crate::models::agent::Agent;

/// One cart line. The server deduplicates by agent id, so a cart never holds
/// two entries for the same agent; quantity is always at least 1 (a request
/// for 0 or less becomes a removal before it ever reaches the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub agent: Agent,
    pub quantity: u32,
}

/// Sum of quantities across the cart. 0 for an empty cart.
pub fn total_items(cart: &[CartItem]) -> u32 {
    cart.iter().map(|item| item.quantity).sum()
}

/// Sum of `price × quantity` across the cart. 0 for an empty cart. Never
/// persisted; always recomputed from the current cart value.
pub fn total_price(cart: &[CartItem]) -> f64 {
    cart.iter()
        .map(|item| item.agent.price * f64::from(item.quantity))
        .sum()
}
