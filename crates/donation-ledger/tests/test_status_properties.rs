use donation_forms::{Currency, DonorInfo, PaymentMethod, ValidatedDonation};
use donation_ledger::{DonationLedger, DonationRecord, RecordStatus};
use proptest::prelude::*;
use rust_decimal::dec;

fn status_strategy() -> impl Strategy<Value = RecordStatus> {
    prop_oneof![
        Just(RecordStatus::Pending),
        Just(RecordStatus::Completed),
        Just(RecordStatus::Failed),
        Just(RecordStatus::Refunded),
    ]
}

fn pending_record() -> DonationRecord {
    let donation = ValidatedDonation {
        amount: dec!(100),
        currency: Currency::Usd,
        donor: DonorInfo {
            name: "Kai Moana".to_string(),
            email: "kai@example.nz".to_string(),
            phone: None,
        },
        recurring: false,
        frequency: None,
        payment_method: PaymentMethod::PayPal,
    };
    DonationRecord::from_donation(&donation, RecordStatus::Pending, None)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever updates are attempted, a completed donation is never seen as pending again
    #[test]
    fn completed_never_reverts_to_pending(updates in prop::collection::vec(status_strategy(), 1..12)) {
        let mut ledger = DonationLedger::create_in_memory().unwrap();
        let record = pending_record();
        ledger.insert(&record).unwrap();

        let mut seen_completed = false;
        for next in updates {
            let before = ledger.get(&record.id).unwrap().unwrap().status;
            let result = ledger.update_status(&record.id, next);
            let after = ledger.get(&record.id).unwrap().unwrap().status;

            prop_assert_eq!(result.is_ok(), before.can_transition_to(next));
            if result.is_err() {
                prop_assert_eq!(after, before);
            }

            if after == RecordStatus::Completed {
                seen_completed = true;
            }
            if seen_completed {
                prop_assert_ne!(after, RecordStatus::Pending);
            }
            if before.is_final() {
                prop_assert_eq!(after, before);
            }
        }
    }
}
