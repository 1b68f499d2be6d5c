/*!
# Donation Step Controller

Owns a `DonationFormState` and the errors shown next to each field. All
mutation goes through the controller so navigation rules cannot be bypassed:

- forward moves run the current step's validation first
- backward moves only go to the immediately previous step
- no skipping ahead
*/

use crate::{
    errors::{FormError, FormResult},
    schemas::{
        DonationFormState, DonationStep, FormConfig, Frequency, PaymentMethod, ValidatedDonation,
    },
    validation::{effective_amount, validate_all, validate_step, Field, FieldErrors},
};
use rust_decimal::Decimal;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DonationStepController {
    state: DonationFormState,
    errors: FieldErrors,
    config: FormConfig,
}

impl DonationStepController {
    pub fn new(config: FormConfig) -> Self {
        Self {
            state: DonationFormState::default(),
            errors: FieldErrors::new(),
            config,
        }
    }

    /// Resume editing a previously captured form state
    pub fn with_state(config: FormConfig, state: DonationFormState) -> Self {
        Self {
            state,
            errors: FieldErrors::new(),
            config,
        }
    }

    pub fn state(&self) -> &DonationFormState {
        &self.state
    }

    pub fn step(&self) -> DonationStep {
        self.state.step
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    // --------------------------------------------------------------------------------------------
    // Field setters
    // --------------------------------------------------------------------------------------------

    pub fn select_amount(&mut self, amount: Decimal) {
        self.state.amount = Some(amount);
        self.state.custom_amount.clear();
        self.errors.remove(Field::Amount);
    }

    pub fn set_custom_amount(&mut self, input: &str) {
        self.state.custom_amount = input.to_string();
        self.state.amount = None;
        self.errors.remove(Field::Amount);
    }

    pub fn set_recurring(&mut self, recurring: bool) {
        self.state.recurring = recurring;
        if !recurring {
            self.state.frequency = None;
        }
        self.errors.remove(Field::Frequency);
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.state.frequency = Some(frequency);
        self.errors.remove(Field::Frequency);
    }

    pub fn set_donor_name(&mut self, name: &str) {
        self.state.donor.name = name.to_string();
        self.errors.remove(Field::Name);
    }

    pub fn set_donor_email(&mut self, email: &str) {
        self.state.donor.email = email.to_string();
        self.errors.remove(Field::Email);
    }

    pub fn set_donor_phone(&mut self, phone: &str) {
        self.state.donor.phone = if phone.trim().is_empty() {
            None
        } else {
            Some(phone.to_string())
        };
        self.errors.remove(Field::Phone);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.state.payment_method = Some(method);
        self.errors.remove(Field::PaymentMethod);
    }

    // --------------------------------------------------------------------------------------------
    // Navigation
    // --------------------------------------------------------------------------------------------

    /// Validate the current step and advance to the next one
    ///
    /// On the payment step there is nowhere further to go; the step is returned
    /// unchanged and `submit()` finishes the wizard.
    pub fn next(&mut self) -> FormResult<DonationStep> {
        let current = self.state.step;
        let errors = validate_step(current, &self.state, &self.config);
        if !errors.is_empty() {
            debug!(step = current.ord(), errors = %errors, "Step validation failed");
            self.errors = errors.clone();
            return Err(FormError::Validation(errors));
        }

        self.errors.clear();
        if let Some(next) = current.next() {
            debug!(from = current.ord(), to = next.ord(), "Advancing donation step");
            self.state.step = next;
        }
        Ok(self.state.step)
    }

    pub fn back(&mut self) -> FormResult<DonationStep> {
        let previous = self.state.step.previous().ok_or(FormError::AtFirstStep)?;
        self.state.step = previous;
        self.errors.clear();
        Ok(previous)
    }

    /// Jump to a step; only the current or the previous step is reachable
    pub fn go_to(&mut self, step: DonationStep) -> FormResult<DonationStep> {
        let current = self.state.step;
        if step == current {
            return Ok(current);
        }
        if Some(step) == current.previous() {
            return self.back();
        }
        Err(FormError::InvalidNavigation {
            from: current.ord(),
            to: step.ord(),
        })
    }

    /// Finish the wizard, re-validating every step
    pub fn submit(&mut self) -> FormResult<ValidatedDonation> {
        if self.state.step != DonationStep::Payment {
            return Err(FormError::NotReadyToSubmit(self.state.step.ord()));
        }

        let errors = validate_all(&self.state, &self.config);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(FormError::Validation(errors));
        }

        let amount = effective_amount(&self.state).map_err(FormError::InvalidAmount)?;
        let payment_method = self.state.payment_method.ok_or_else(|| {
            let mut errors = FieldErrors::new();
            errors.insert(Field::PaymentMethod, "Please select a payment method");
            FormError::Validation(errors)
        })?;

        let mut donor = self.state.donor.clone();
        donor.name = donor.name.trim().to_string();
        donor.email = donor.email.trim().to_string();
        donor.phone = donor.phone.map(|p| p.trim().to_string());

        Ok(ValidatedDonation {
            amount,
            currency: self.config.currency,
            donor,
            recurring: self.state.recurring,
            frequency: if self.state.recurring {
                self.state.frequency
            } else {
                None
            },
            payment_method,
        })
    }

    /// Discard everything the donor entered
    pub fn reset(&mut self) {
        self.state = DonationFormState::default();
        self.errors.clear();
    }
}
