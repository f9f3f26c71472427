//! Randomized checks that the composer never sends an over-limit update.

mod common;

use common::{record, FakeDeckService};
use deck_workbench::deck::composer::QuantityChange;
use deck_workbench::deck::format_rules::{max_copies_for, CardKind, GameFormat};
use deck_workbench::utils::errors::{ApiError, CompositionError};
use proptest::prelude::*;

fn card_types() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Legendary Creature — Elf"),
        Just("Instant"),
        Just("Basic Land — Forest"),
        Just("Basic Snow Land — Island"),
        Just("Land"),
        Just("Artifact"),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_no_update_exceeds_the_format_limit(
        commander in any::<bool>(),
        card_type in card_types(),
        old in 1u32..8,
        requested in 0u32..12,
    ) {
        let format = if commander { GameFormat::Commander } else { GameFormat::Standard };
        let service = FakeDeckService::with_deck(
            1,
            if commander { "COMMANDER" } else { "STANDARD" },
            vec![record(1, "Card", card_type, old)],
        );
        let limit = max_copies_for(format, CardKind::classify(card_type));

        let result = runtime().block_on(async {
            let composer = service.composer();
            composer.load(1).await.unwrap();
            composer.change_quantity(1, requested).await
        });

        for (_, _, copies) in service.lock().update_calls.iter() {
            prop_assert!(limit.permits(*copies) || *copies <= old);
        }
        if requested > old && !limit.permits(requested) {
            prop_assert!(
                matches!(result, Err(CompositionError::FormatViolation(_))),
                "format violation expected"
            );
            prop_assert!(service.lock().update_calls.is_empty());
        }
        if requested == 0 {
            prop_assert_eq!(result, Ok(QuantityChange::Ignored));
        }
    }

    #[test]
    fn prop_failed_update_restores_old(old in 1u32..4, requested in 1u32..4) {
        let service =
            FakeDeckService::with_deck(1, "STANDARD", vec![record(1, "Card", "Sorcery", old)]);
        service.fail_next_update(ApiError::Timeout);

        let shown = runtime().block_on(async {
            let composer = service.composer();
            composer.load(1).await.unwrap();
            let _ = composer.change_quantity(1, requested).await;
            composer.displayed_copies(1).await
        });
        prop_assert_eq!(shown, Some(old));
    }
}
