// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the points table

use loyalty_es::{PointsAction, PointsMappingService};
use proptest::prelude::*;

fn action() -> impl Strategy<Value = PointsAction> {
    prop_oneof![
        Just(PointsAction::ReferUser),
        Just(PointsAction::SignUpWithReferral),
        Just(PointsAction::SignUpWithoutReferral),
    ]
}

proptest! {
    /// Property: Looking an action up by name matches the typed lookup
    #[test]
    fn prop_map_by_name_matches_typed(action in action()) {
        let service = PointsMappingService::new();
        prop_assert_eq!(service.map(action.as_str()).unwrap(), service.points_for(action));
    }

    /// Property: Names outside the table are rejected
    #[test]
    fn prop_unknown_names_rejected(name in "[a-z]{1,12}") {
        let service = PointsMappingService::new();
        let err = service.map(&name).unwrap_err();
        prop_assert!(err.is_validation());
    }
}
