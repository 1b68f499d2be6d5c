use donation_forms::{
    is_valid_email, DonationStep, DonationStepController, Field, FormConfig, FormError,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn amount_below_minimum() -> impl Strategy<Value = Decimal> {
    // -1000.00 ..= 99.99 in cents
    (-100_000i64..10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn well_formed_email() -> impl Strategy<Value = String> {
    (
        "[a-z0-9._%+-]{1,20}",
        "[a-z0-9-]{1,20}",
        prop::collection::vec("[a-z0-9-]{1,10}", 0..3),
        "[a-z]{2,6}",
    )
        .prop_map(|(local, domain, subdomains, tld)| {
            let mut host = domain;
            for sub in subdomains {
                host.push('.');
                host.push_str(&sub);
            }
            format!("{}@{}.{}", local, host, tld)
        })
}

fn malformed_email() -> impl Strategy<Value = String> {
    prop_oneof![
        // no @ at all
        "[a-z0-9.]{1,30}",
        // nothing before the @
        "@[a-z]{1,10}\\.[a-z]{2,4}",
        // no dot in the domain
        "[a-z]{1,10}@[a-z]{1,10}",
        // two @ signs
        "[a-z]{1,10}@[a-z]{1,10}@[a-z]{1,10}\\.[a-z]{2,4}",
        // whitespace inside
        "[a-z]{1,10} [a-z]{1,10}@[a-z]{1,10}\\.[a-z]{2,4}",
        // dot only at the end of the domain
        "[a-z]{1,10}@[a-z]{1,10}\\.",
        // domain starting with a dot
        "[a-z]{1,10}@\\.[a-z]{1,10}\\.[a-z]{2,4}",
        // empty label between two dots
        "[a-z]{1,10}@[a-z]{1,10}\\.\\.[a-z]{2,4}",
        // trailing dot after a full domain
        "[a-z]{1,10}@[a-z]{1,10}\\.[a-z]{2,4}\\.",
    ]
}

proptest! {
    #[test]
    fn amounts_below_minimum_never_advance(amount in amount_below_minimum()) {
        let mut wizard = DonationStepController::new(FormConfig::default());
        wizard.set_custom_amount(&amount.to_string());

        let result = wizard.next();
        let is_amount_error = matches!(
            &result,
            Err(FormError::Validation(errors)) if errors.contains(Field::Amount)
        );
        prop_assert!(is_amount_error);
        prop_assert_eq!(wizard.step(), DonationStep::Amount);
    }

    #[test]
    fn well_formed_emails_pass_donor_step(email in well_formed_email()) {
        prop_assert!(is_valid_email(&email));

        let mut wizard = DonationStepController::new(FormConfig::default());
        wizard.set_custom_amount("500");
        wizard.next().unwrap();
        wizard.set_donor_name("Test Donor");
        wizard.set_donor_email(&email);

        prop_assert_eq!(wizard.next().unwrap(), DonationStep::Payment);
    }

    #[test]
    fn malformed_emails_fail_donor_step(email in malformed_email()) {
        prop_assert!(!is_valid_email(&email));

        let mut wizard = DonationStepController::new(FormConfig::default());
        wizard.set_custom_amount("500");
        wizard.next().unwrap();
        wizard.set_donor_name("Test Donor");
        wizard.set_donor_email(&email);

        prop_assert!(wizard.next().is_err());
        prop_assert!(wizard.errors().contains(Field::Email));
        prop_assert_eq!(wizard.step(), DonationStep::DonorInfo);
    }
}
