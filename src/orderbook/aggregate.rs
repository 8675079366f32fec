//! Price level aggregation.

use std::collections::BTreeMap;

use super::leaf::LeafRecord;
use super::price::derive_price;
use crate::error::Error;
use crate::types::{Price, Quantity};

/// Sum leaf quantities per derived price
///
/// Every record lands in exactly one bucket. Empty input yields an empty map.
///
/// # Errors
///
/// [`Error::QuantityOverflow`] if a bucket's total does not fit in
/// [`Quantity`].
pub fn aggregate<'a, I>(records: I) -> Result<BTreeMap<Price, Quantity>, Error>
where
    I: IntoIterator<Item = &'a LeafRecord>,
{
    let mut levels = BTreeMap::new();
    for record in records {
        let price = derive_price(record.sort_key);
        let total = levels.entry(price).or_insert(0 as Quantity);
        *total = total
            .checked_add(record.quantity)
            .ok_or(Error::QuantityOverflow { price })?;
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountAddress;
    use proptest::prelude::*;

    fn record(price_lots: u64, seq: u64, quantity: Quantity) -> LeafRecord {
        LeafRecord {
            owner: AccountAddress::default(),
            quantity,
            sort_key: (u128::from(price_lots) << 64) | u128::from(seq),
            owner_slot: 0,
            time_in_force: 0,
            timestamp: 0,
            peg_limit: -1,
            client_order_id: 0,
        }
    }

    #[test]
    fn test_merges_equal_prices() {
        let records = [
            record(1_000_000, 1, 5),
            record(1_000_000, 2, 10),
            record(1_010_000, 3, 2),
        ];
        let levels = aggregate(&records).unwrap();

        assert_eq!(levels.len(), 2);
        assert_eq!(levels[&Price::from(100)], 15);
        assert_eq!(levels[&Price::from(101)], 2);
    }

    #[test]
    fn test_empty_input() {
        let none: [LeafRecord; 0] = [];
        assert!(aggregate(&none).unwrap().is_empty());
    }

    #[test]
    fn test_zero_quantity_keeps_bucket() {
        let levels = aggregate(&[record(500, 0, 0)]).unwrap();
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn test_overflow_is_reported() {
        let records = [record(7, 0, Quantity::MAX), record(7, 1, 1)];
        assert!(matches!(
            aggregate(&records),
            Err(Error::QuantityOverflow { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_conserves_quantity(
            orders in proptest::collection::vec((0u64..50, any::<u64>(), 0u64..1_000_000), 0..200)
        ) {
            let records: Vec<LeafRecord> = orders
                .iter()
                .map(|&(price, seq, qty)| record(price, seq, qty))
                .collect();
            let levels = aggregate(&records).unwrap();

            let input_total: u64 = records.iter().map(|r| r.quantity).sum();
            let output_total: u64 = levels.values().sum();
            prop_assert_eq!(input_total, output_total);
            prop_assert!(levels.len() <= records.len());
        }
    }
}
