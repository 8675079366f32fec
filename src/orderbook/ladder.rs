//! Sorted price ladder for one book side.
//!
//! A [`Ladder`] is built once from aggregated levels and never mutated:
//!
//! - Bids are ordered by price descending, asks ascending, so the best
//!   level is always first
//! - Prices are unique; aggregation has already merged equal prices
//! - A new book state produces a new ladder rather than patching the old one

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Price, Quantity, Side};

/// Aggregated quantity resting at one price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PriceLevel {
    /// Price in quote units
    pub price: Price,
    /// Sum of resting quantity at this price, in base lots
    pub quantity: Quantity,
}

impl PriceLevel {
    /// Create a new price level
    pub fn new(price: Price, quantity: Quantity) -> Self {
        Self { price, quantity }
    }
}

/// Price levels of one book side, best first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ladder {
    side: Side,
    levels: Vec<PriceLevel>,
}

impl Ladder {
    /// Build a ladder from aggregated levels
    ///
    /// Bids come out descending by price, asks ascending.
    pub fn assemble(levels: &BTreeMap<Price, Quantity>, side: Side) -> Self {
        let to_level = |(&price, &quantity): (&Price, &Quantity)| PriceLevel::new(price, quantity);
        let levels = match side {
            Side::Bid => levels.iter().rev().map(to_level).collect(),
            Side::Ask => levels.iter().map(to_level).collect(),
        };
        Self { side, levels }
    }

    /// An empty ladder for `side`
    #[must_use]
    pub fn empty(side: Side) -> Self {
        Self {
            side,
            levels: Vec::new(),
        }
    }

    /// Which side this ladder belongs to
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// All levels, best first
    #[must_use]
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Iterate levels, best first
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.levels.iter()
    }

    /// Best level (highest bid or lowest ask)
    #[must_use]
    pub fn best(&self) -> Option<PriceLevel> {
        self.levels.first().copied()
    }

    /// Top `n` levels
    #[must_use]
    pub fn top(&self, n: usize) -> &[PriceLevel] {
        &self.levels[..n.min(self.levels.len())]
    }

    /// Quantity resting at exactly `price`
    #[must_use]
    pub fn quantity_at(&self, price: Price) -> Option<Quantity> {
        self.levels
            .iter()
            .find(|level| level.price == price)
            .map(|level| level.quantity)
    }

    /// Sum of quantity across all levels
    #[must_use]
    pub fn total_quantity(&self) -> u128 {
        self.levels.iter().map(|l| u128::from(l.quantity)).sum()
    }

    /// Number of price levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the ladder has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ladder {
    type Item = &'a PriceLevel;
    type IntoIter = std::slice::Iter<'a, PriceLevel>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

/// Build a ladder from aggregated levels; see [`Ladder::assemble`]
pub fn assemble(levels: &BTreeMap<Price, Quantity>, side: Side) -> Ladder {
    Ladder::assemble(levels, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn levels(pairs: &[(i64, Quantity)]) -> BTreeMap<Price, Quantity> {
        pairs
            .iter()
            .map(|&(p, q)| (Price::new(p, 4), q))
            .collect()
    }

    #[test]
    fn test_ask_ladder_ascending() {
        let ladder = assemble(&levels(&[(1_010_000, 2), (1_000_000, 15)]), Side::Ask);
        assert_eq!(
            ladder.levels(),
            &[
                PriceLevel::new(Price::new(1_000_000, 4), 15),
                PriceLevel::new(Price::new(1_010_000, 4), 2),
            ]
        );
        assert_eq!(ladder.best().map(|l| l.quantity), Some(15));
    }

    #[test]
    fn test_bid_ladder_descending() {
        let ladder = assemble(&levels(&[(450, 1), (440, 2), (430, 3)]), Side::Bid);
        let prices: Vec<Price> = ladder.iter().map(|l| l.price).collect();
        assert_eq!(
            prices,
            vec![Price::new(450, 4), Price::new(440, 4), Price::new(430, 4)]
        );
    }

    #[test]
    fn test_top_levels() {
        let ladder = assemble(&levels(&[(450, 1), (440, 2), (430, 3)]), Side::Bid);
        let top = ladder.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].quantity, 1);
        assert_eq!(top[1].quantity, 2);
        assert_eq!(ladder.top(10).len(), 3);
    }

    #[test]
    fn test_totals_and_lookup() {
        let ladder = assemble(&levels(&[(450, 100), (460, 50)]), Side::Ask);
        assert_eq!(ladder.total_quantity(), 150);
        assert_eq!(ladder.quantity_at(Price::new(460, 4)), Some(50));
        assert_eq!(ladder.quantity_at(Price::new(470, 4)), None);
    }

    #[test]
    fn test_empty_ladder() {
        let ladder = assemble(&BTreeMap::new(), Side::Bid);
        assert!(ladder.is_empty());
        assert_eq!(ladder.best(), None);
        assert_eq!(ladder, Ladder::empty(Side::Bid));
    }

    #[test]
    fn test_serializes_prices_as_strings() {
        let ladder = assemble(&levels(&[(1_000_000, 15)]), Side::Ask);
        let json = serde_json::to_string(&ladder).unwrap();
        assert_eq!(
            json,
            r#"{"side":"ask","levels":[{"price":"100.0000","quantity":15}]}"#
        );
    }

    proptest! {
        #[test]
        fn prop_strictly_ordered(
            raw in proptest::collection::btree_map(0i64..1_000_000, 1u64..1000, 0..100)
        ) {
            let map: BTreeMap<Price, Quantity> =
                raw.into_iter().map(|(p, q)| (Price::new(p, 4), q)).collect();

            let bids = assemble(&map, Side::Bid);
            prop_assert!(bids.levels().windows(2).all(|w| w[0].price > w[1].price));

            let asks = assemble(&map, Side::Ask);
            prop_assert!(asks.levels().windows(2).all(|w| w[0].price < w[1].price));

            prop_assert_eq!(bids.len(), map.len());
        }
    }
}
