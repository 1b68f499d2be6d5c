/*!
# Field Validation

Per-step validation for the donation wizard. Every validator returns the full
set of field errors for its step so the form can show all problems at once.
*/

use crate::schemas::{DonationFormState, DonationStep, FormConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const MIN_NAME_CHARS: usize = 2;
const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_AMOUNT_SCALE: u32 = 2;

// ================================================================================================
// Field Errors
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Amount,
    Frequency,
    Name,
    Email,
    Phone,
    PaymentMethod,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Amount => "amount",
            Field::Frequency => "frequency",
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::PaymentMethod => "payment_method",
        }
    }

    /// The wizard step on which this field is edited
    pub fn step(&self) -> DonationStep {
        match self {
            Field::Amount | Field::Frequency => DonationStep::Amount,
            Field::Name | Field::Email | Field::Phone => DonationStep::DonorInfo,
            Field::PaymentMethod => DonationStep::Payment,
        }
    }
}

/// Per-field error messages, ordered by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// Earliest step with a failing field
    pub fn first_step(&self) -> Option<DonationStep> {
        self.0.keys().map(Field::step).min()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), message)?;
            first = false;
        }
        Ok(())
    }
}

// ================================================================================================
// Step Validators
// ================================================================================================

/// Validate the fields belonging to a single step
pub fn validate_step(step: DonationStep, state: &DonationFormState, config: &FormConfig) -> FieldErrors {
    match step {
        DonationStep::Amount => validate_amount_step(state, config),
        DonationStep::DonorInfo => validate_donor_step(state),
        DonationStep::Payment => validate_payment_step(state, config),
    }
}

/// Validate every step, collecting all field errors
pub fn validate_all(state: &DonationFormState, config: &FormConfig) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for step in DonationStep::all() {
        errors.extend(validate_step(*step, state, config));
    }
    errors
}

fn validate_amount_step(state: &DonationFormState, config: &FormConfig) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match effective_amount(state) {
        Ok(amount) => {
            if let Err(message) = check_amount_bounds(amount, config) {
                errors.insert(Field::Amount, message);
            }
        }
        Err(message) => errors.insert(Field::Amount, message),
    }

    if state.recurring && state.frequency.is_none() {
        errors.insert(
            Field::Frequency,
            "Please choose how often you would like to donate",
        );
    }

    errors
}

fn validate_donor_step(state: &DonationFormState) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let donor = &state.donor;

    let name = donor.name.trim();
    if name.is_empty() {
        errors.insert(Field::Name, "Name is required");
    } else if name.chars().count() < MIN_NAME_CHARS {
        errors.insert(Field::Name, "Name must be at least 2 characters");
    }

    let email = donor.email.trim();
    if email.is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !is_valid_email(email) {
        errors.insert(Field::Email, "Please enter a valid email address");
    }

    if let Some(phone) = donor.phone.as_deref() {
        if !phone.trim().is_empty() && !is_valid_phone(phone) {
            errors.insert(Field::Phone, "Please enter a valid phone number");
        }
    }

    errors
}

fn validate_payment_step(state: &DonationFormState, config: &FormConfig) -> FieldErrors {
    let mut errors = FieldErrors::new();

    match state.payment_method {
        None => errors.insert(Field::PaymentMethod, "Please select a payment method"),
        Some(method) if !method.supports(config.currency) => errors.insert(
            Field::PaymentMethod,
            format!(
                "{} does not accept {} donations",
                method.display_name(),
                config.currency
            ),
        ),
        Some(_) => {}
    }

    errors
}

// ================================================================================================
// Amount Helpers
// ================================================================================================

/// Resolve the amount the donor actually chose: custom text wins over a preset
pub(crate) fn effective_amount(state: &DonationFormState) -> Result<Decimal, String> {
    if !state.custom_amount.trim().is_empty() {
        return parse_amount(&state.custom_amount);
    }
    state
        .amount
        .ok_or_else(|| "Please select or enter a donation amount".to_string())
}

/// Parse a donor-entered amount, tolerating surrounding whitespace and thousands separators
pub fn parse_amount(input: &str) -> Result<Decimal, String> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err("Please select or enter a donation amount".to_string());
    }

    let amount =
        Decimal::from_str(&cleaned).map_err(|_| "Please enter a valid amount".to_string())?;

    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err("Amount cannot have more than 2 decimal places".to_string());
    }

    Ok(amount)
}

fn check_amount_bounds(amount: Decimal, config: &FormConfig) -> Result<(), String> {
    if amount < config.min_amount {
        return Err(format!(
            "Minimum donation amount is {}",
            config.currency.format(config.min_amount)
        ));
    }
    if amount > config.max_amount {
        return Err(format!(
            "Maximum donation amount is {}",
            config.currency.format(config.max_amount)
        ));
    }
    Ok(())
}

// ================================================================================================
// Contact Helpers
// ================================================================================================

/// Structural email check: `local@domain.tld`
///
/// Exactly one `@`, no whitespace, a non-empty local part, and a domain of at
/// least two dot-separated labels, none of them empty.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Phone numbers: 10-15 digits, optionally with `+`, spaces, dashes and parentheses
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')');
    if !phone.chars().all(allowed) {
        return false;
    }
    if phone.chars().skip(1).any(|c| c == '+') {
        return false;
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits)
}

// ================================================================================================
// Tests
// ================================================================================================
