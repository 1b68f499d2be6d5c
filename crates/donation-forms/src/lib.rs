/*!
# Donation Forms

This crate owns the **donation wizard**: the form state a donor fills in, the
three-step navigation, and the field-level validation that gates every forward
transition.

## Steps

1. **Amount** - a preset or a custom amount, one-off or recurring
2. **Donor info** - name, email and an optional phone number
3. **Payment** - Razorpay or PayPal

Navigation is linear. `next()` validates the current step and refuses to advance
while any field is invalid; `back()` only ever returns to the previous step.

## Usage

```rust
use donation_forms::{DonationStepController, DonationStep, FormConfig, PaymentMethod, FormResult};
use rust_decimal::dec;

fn example() -> FormResult<()> {
    let mut wizard = DonationStepController::new(FormConfig::default());

    wizard.select_amount(dec!(1000));
    assert_eq!(wizard.next()?, DonationStep::DonorInfo);

    wizard.set_donor_name("Asha Rao");
    wizard.set_donor_email("asha@example.org");
    assert_eq!(wizard.next()?, DonationStep::Payment);

    wizard.set_payment_method(PaymentMethod::Razorpay);
    let donation = wizard.submit()?;
    assert_eq!(donation.amount, dec!(1000));

    Ok(())
}
```
*/

pub mod controller;
pub mod errors;
pub mod schemas;
pub mod validation;

// Re-export main types for convenience
pub use controller::DonationStepController;
pub use errors::{FormError, FormResult};
pub use schemas::{
    Currency, DonationFormState, DonationStep, DonorInfo, FormConfig, Frequency, PaymentMethod,
    ValidatedDonation, MAX_DONATION_AMOUNT,
};
pub use validation::{
    is_valid_email, is_valid_phone, parse_amount, validate_all, validate_step, Field, FieldErrors,
};
