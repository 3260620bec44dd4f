// ABOUTME: Tests for traffic split validation and route context construction.
// ABOUTME: Exact-sum rule, shadow preconditions, and index-paired list order.

use caravel::routing::{TrafficSplitSpec, ValidationError};
use caravel::templates::CtxValue;

mod validation {
    use super::*;

    #[test]
    fn sum_of_exactly_100_passes() {
        let spec = TrafficSplitSpec::parse("a=60,b=40", "").unwrap();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn sum_of_99_fails_with_computed_sum() {
        let spec = TrafficSplitSpec::parse("a=60,b=39", "").unwrap();
        match spec.validate().unwrap_err() {
            ValidationError::WeightSumMismatch { sum, weights } => {
                assert_eq!(sum, 99);
                assert!(weights.contains("'a': 60"), "weights: {weights}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sum_over_100_fails() {
        let spec = TrafficSplitSpec::parse("a=60,b=41", "").unwrap();
        assert!(matches!(
            spec.validate(),
            Err(ValidationError::WeightSumMismatch { sum: 101, .. })
        ));
    }

    #[test]
    fn single_variant_at_100_passes() {
        let spec = TrafficSplitSpec::parse("a=100", "").unwrap();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn shadow_present_at_zero_passes() {
        let spec = TrafficSplitSpec::parse("a=100,b=0", "b").unwrap();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn shadow_absent_from_split_fails_with_hint() {
        let spec = TrafficSplitSpec::parse("a=100,b=0", "c").unwrap();
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, ValidationError::ShadowNotInSplit { .. }));
        assert!(err.to_string().contains("0% weight"));
    }

    #[test]
    fn shadow_with_nonzero_weight_fails() {
        let spec = TrafficSplitSpec::parse("a=100,b=0", "a").unwrap();
        assert!(matches!(
            spec.validate(),
            Err(ValidationError::ShadowNonZeroWeight { weight: 100, .. })
        ));
    }

    #[test]
    fn weight_sum_is_checked_before_shadow_membership() {
        // Both invariants are violated; the sum error must win.
        let spec = TrafficSplitSpec::parse("a=50,b=0", "c").unwrap();
        assert!(matches!(
            spec.validate(),
            Err(ValidationError::WeightSumMismatch { .. })
        ));
    }
}

mod parsing {
    use super::*;

    #[test]
    fn tags_are_normalized_on_parse() {
        let spec = TrafficSplitSpec::parse("CPU=50,Gpu=50", "").unwrap();
        let tags: Vec<&str> = spec.entries().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["cpu", "gpu"]);
    }

    #[test]
    fn base64_split_and_shadow_decode() {
        // base64("a=100,b=0") / base64("b")
        let spec = TrafficSplitSpec::parse("YT0xMDAsYj0w", "Yg==").unwrap();
        assert!(spec.validate().is_ok());
        assert_eq!(spec.shadows().len(), 1);
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!(TrafficSplitSpec::parse("a:100", "").is_err());
        assert!(TrafficSplitSpec::parse("a=ten", "").is_err());
        assert!(TrafficSplitSpec::parse("", "").is_err());
    }
}

mod context {
    use super::*;

    fn list(ctx: &caravel::templates::RenderContext, name: &str) -> Vec<String> {
        match ctx.get(name) {
            Some(CtxValue::List(items)) => items.clone(),
            other => panic!("{name} is not a list: {other:?}"),
        }
    }

    fn int(ctx: &caravel::templates::RenderContext, name: &str) -> i64 {
        match ctx.get(name) {
            Some(CtxValue::Int(i)) => *i,
            other => panic!("{name} is not an int: {other:?}"),
        }
    }

    #[test]
    fn tag_and_weight_lists_pair_by_index_in_input_order() {
        let spec = TrafficSplitSpec::parse("b=25,a=75", "").unwrap();
        let ctx = spec.build_route_context("predict", "mnist");

        assert_eq!(list(&ctx, "MODEL_SPLIT_TAG_LIST"), vec!["b", "a"]);
        assert_eq!(list(&ctx, "MODEL_SPLIT_WEIGHT_LIST"), vec!["25", "75"]);
        assert_eq!(int(&ctx, "MODEL_NUM_SPLIT_TAGS_AND_WEIGHTS"), 2);
        assert_eq!(int(&ctx, "MODEL_NUM_SHADOW_TAGS"), 0);
    }

    #[test]
    fn shadow_list_appears_with_its_length() {
        let spec = TrafficSplitSpec::parse("a=100,b=0", "b").unwrap();
        let ctx = spec.build_route_context("predict", "mnist");

        assert_eq!(list(&ctx, "MODEL_SHADOW_TAG_LIST"), vec!["b"]);
        assert_eq!(int(&ctx, "MODEL_NUM_SHADOW_TAGS"), 1);
    }

    #[test]
    fn snippets_fold_the_same_ordered_lists() {
        let spec = TrafficSplitSpec::parse("b=25,a=75", "").unwrap();
        assert_eq!(spec.split_snippet(), "split-b-25-a-75");
        assert_eq!(spec.shadow_snippet(), "shadow");

        let spec = TrafficSplitSpec::parse("a=100,b=0,c=0", "b,c").unwrap();
        assert_eq!(spec.split_snippet(), "split-a-100-b-0-c-0");
        assert_eq!(spec.shadow_snippet(), "shadow-b-c");
    }
}
