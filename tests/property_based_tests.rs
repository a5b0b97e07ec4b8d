mod common;

use common::*;
use instance_agent::association::{AssociationSummary, InstanceAssociation};
use instance_agent::messaging::LongPollErrorClassifier;
use instance_agent::processor::{is_apply_all, is_association_qualified_to_run_now, string_prefix};
use proptest::prelude::*;
use std::time::Duration;

fn with_id(id: &str) -> InstanceAssociation {
    InstanceAssociation::new(AssociationSummary {
        association_id: Some(id.to_string()),
        ..Default::default()
    })
}

proptest! {
    /// Property: only an empty list or a single blank entry selects every association
    #[test]
    fn apply_all_matches_selector_rule(ids in requested_ids_strategy()) {
        let expected = ids.is_empty() || (ids.len() == 1 && ids[0].is_empty());
        prop_assert_eq!(is_apply_all(&ids), expected);
    }

    /// Property: qualification is exact membership of the association id
    #[test]
    fn qualification_is_exact_membership(
        ids in requested_ids_strategy(),
        candidate in association_id_strategy(),
    ) {
        let association = with_id(&candidate);
        prop_assert_eq!(
            is_association_qualified_to_run_now(&ids, &association),
            ids.contains(&candidate)
        );
    }

    /// Property: failures faster than the threshold are always unexpected
    #[test]
    fn quick_failures_are_always_unexpected(text in ".{0,60}", millis in 0u64..10_000) {
        let classifier = LongPollErrorClassifier::default();
        prop_assert!(classifier.classify(&text, Duration::from_millis(millis)).is_unexpected());
    }

    /// Property: slow failures without a marker are unexpected
    #[test]
    fn slow_unmarked_failures_are_unexpected(
        text in unrelated_error_strategy(),
        secs in 10u64..600,
    ) {
        let classifier = LongPollErrorClassifier::default();
        prop_assert!(classifier.classify(&text, Duration::from_secs(secs)).is_unexpected());
    }

    /// Property: slow failures carrying a server marker are expected
    #[test]
    fn slow_marked_failures_are_expected(
        prefix in "[a-z ]{0,20}",
        secs in 10u64..600,
    ) {
        let classifier = LongPollErrorClassifier::default();
        let text = format!("{prefix}read: connection reset by peer");
        prop_assert!(!classifier.classify(&text, Duration::from_secs(secs)).is_unexpected());
    }

    /// Property: marker matching ignores the case of the error text
    #[test]
    fn slow_marked_failures_ignore_case(
        upper in any::<bool>(),
        secs in 10u64..600,
    ) {
        let classifier = LongPollErrorClassifier::default();
        let marker = "Connection reset by peer (os error 104)";
        let text = if upper { marker.to_uppercase() } else { marker.to_string() };
        prop_assert!(!classifier.classify(&text, Duration::from_secs(secs)).is_unexpected());
    }

    /// Property: truncated output never exceeds the limit plus the suffix
    #[test]
    fn string_prefix_respects_limit(input in ".{0,200}", max in 0usize..120) {
        let suffix = "--output truncated--";
        let truncated = string_prefix(&input, max, suffix);
        if input.len() <= max {
            prop_assert_eq!(truncated, input);
        } else {
            prop_assert!(truncated.len() <= max + suffix.len());
            prop_assert!(truncated.ends_with(suffix));
        }
    }
}
