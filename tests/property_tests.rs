use proptest::prelude::*;
use stockroom_api::services::{
    codes::{self, CodeError, MAX_SEQUENCE},
    stock::{self, StockBucket, StockCounts, AVAILABLE_STATUSES, BORROWED_STATUSES, REPAIR_STATUSES},
};

fn known_status() -> impl Strategy<Value = &'static str> {
    prop::sample::select(
        AVAILABLE_STATUSES
            .iter()
            .chain(BORROWED_STATUSES.iter())
            .chain(REPAIR_STATUSES.iter())
            .copied()
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #[test]
    fn next_code_is_last_plus_one(prefix in "[A-Z]{2,3}", last in 1u32..MAX_SEQUENCE) {
        let last_code = format!("{}-{:04}", prefix, last);
        let next = codes::next_code(&prefix, Some(&last_code)).unwrap();
        prop_assert_eq!(next, format!("{}-{:04}", prefix, last + 1));
    }

    #[test]
    fn codes_past_the_cap_are_refused(prefix in "[A-Z]{2}", sequence in (MAX_SEQUENCE + 1)..100_000u32) {
        let is_exhausted = matches!(
            codes::format_code(&prefix, sequence),
            Err(CodeError::SequenceExhausted { .. })
        );
        prop_assert!(is_exhausted);
    }

    #[test]
    fn serial_codes_are_consecutive(start in 0u32..9000, count in 0usize..200) {
        let last = (start > 0).then(|| format!("IT-0001-{:04}", start));
        let generated = codes::serial_codes("IT-0001", last.as_deref(), count).unwrap();

        prop_assert_eq!(generated.len(), count);
        for (offset, code) in generated.iter().enumerate() {
            prop_assert!(code.starts_with("IT-0001-"));
            prop_assert_eq!(codes::parse_sequence(code), Some(start + 1 + offset as u32));
        }
    }

    #[test]
    fn category_code_is_taken_from_parentheses(label in "[ก-ฮa-z ]{1,12}", code in "[A-Z]{2}") {
        let category = format!("{} ({})", label, code);
        prop_assert_eq!(codes::sku_prefix(&category), code.clone());
        let sku = format!("{}-0001", code);
        prop_assert!(codes::validate_sku(&sku, &category).is_ok());
    }

    #[test]
    fn every_known_status_falls_in_exactly_one_bucket(status in known_status()) {
        let buckets = [
            AVAILABLE_STATUSES.contains(&status),
            BORROWED_STATUSES.contains(&status),
            REPAIR_STATUSES.contains(&status),
        ];
        prop_assert_eq!(buckets.iter().filter(|hit| **hit).count(), 1);
        prop_assert!(stock::classify_status(status).is_some());
    }

    #[test]
    fn counts_add_up(statuses in prop::collection::vec(prop_oneof![known_status().prop_map(String::from), "[a-z]{1,8}"], 0..40)) {
        let mut counts = StockCounts::default();
        for status in &statuses {
            counts.record(status);
        }
        let unclassified = statuses
            .iter()
            .filter(|s| stock::classify_status(s).is_none())
            .count() as u64;

        prop_assert_eq!(counts.total, statuses.len() as u64);
        prop_assert_eq!(
            counts.available + counts.borrowed + counts.repair + unclassified,
            counts.total
        );
    }

    #[test]
    fn low_stock_means_fewer_than_three_available(
        rows in prop::collection::vec((0u8..5, known_status()), 0..60)
    ) {
        let counts = stock::aggregate(rows.iter().copied());
        let low = stock::low_stock(&counts);

        for (product, c) in &counts {
            let available = rows
                .iter()
                .filter(|(p, s)| p == product && stock::classify_status(s) == Some(StockBucket::Available))
                .count() as u64;
            prop_assert_eq!(c.available, available);
            prop_assert_eq!(low.contains(&product), available < stock::LOW_STOCK_THRESHOLD);
        }
    }
}
