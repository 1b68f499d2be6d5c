/*!
# Donation Form Schemas

The data carried by the donation wizard. `DonationFormState` is the raw,
possibly-invalid state the donor is editing; `ValidatedDonation` is what the
wizard hands to the payment layer once every step has passed validation.
*/

use crate::errors::{FormError, FormResult};
use rust_decimal::prelude::*;
use rust_decimal::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ================================================================================================
// Wizard Steps
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStep {
    /// Preset or custom amount, one-off or recurring
    Amount,

    /// Donor name, email and phone
    DonorInfo,

    /// Payment provider selection and checkout
    Payment,
}

impl DonationStep {
    pub fn all() -> &'static [DonationStep] {
        &[
            DonationStep::Amount,
            DonationStep::DonorInfo,
            DonationStep::Payment,
        ]
    }

    /// Get the 1-based position of this step in the wizard
    pub fn ord(&self) -> u8 {
        match self {
            DonationStep::Amount => 1,
            DonationStep::DonorInfo => 2,
            DonationStep::Payment => 3,
        }
    }

    pub fn from_ord(ord: u8) -> Option<Self> {
        match ord {
            1 => Some(DonationStep::Amount),
            2 => Some(DonationStep::DonorInfo),
            3 => Some(DonationStep::Payment),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_ord(self.ord() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_ord(self.ord().saturating_sub(1))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DonationStep::Amount => "Amount",
            DonationStep::DonorInfo => "Your details",
            DonationStep::Payment => "Payment",
        }
    }
}

impl PartialOrd for DonationStep {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DonationStep {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ord().cmp(&other.ord())
    }
}

impl Default for DonationStep {
    fn default() -> Self {
        DonationStep::Amount
    }
}

// ================================================================================================
// Enumerations
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" | "annually" => Ok(Frequency::Yearly),
            other => Err(FormError::UnknownVariant {
                kind: "frequency",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    #[serde(rename = "paypal")]
    PayPal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Razorpay => "razorpay",
            PaymentMethod::PayPal => "paypal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethod::Razorpay => "Razorpay",
            PaymentMethod::PayPal => "PayPal",
        }
    }

    /// Whether this provider can charge in the given currency
    pub fn supports(&self, currency: Currency) -> bool {
        match self {
            PaymentMethod::Razorpay => currency == Currency::Inr,
            PaymentMethod::PayPal => currency == Currency::Usd,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PaymentMethod {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "razorpay" => Ok(PaymentMethod::Razorpay),
            "paypal" => Ok(PaymentMethod::PayPal),
            other => Err(FormError::UnknownVariant {
                kind: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }

    /// Convert a major-unit amount into minor units (paise, cents)
    ///
    /// Fails for negative amounts and for amounts finer than one minor unit.
    pub fn to_minor_units(&self, amount: Decimal) -> FormResult<u64> {
        if amount.is_sign_negative() {
            return Err(FormError::InvalidAmount(format!(
                "{} is negative",
                amount
            )));
        }
        let minor = amount
            .checked_mul(dec!(100))
            .ok_or_else(|| FormError::InvalidAmount(format!("{} is too large", amount)))?;
        if minor.fract() != Decimal::ZERO {
            return Err(FormError::InvalidAmount(format!(
                "{} has more than 2 decimal places",
                amount
            )));
        }
        minor
            .to_u64()
            .ok_or_else(|| FormError::InvalidAmount(format!("{} is too large", amount)))
    }

    pub fn from_minor_units(&self, minor: u64) -> Decimal {
        Decimal::from(minor) / dec!(100)
    }

    /// Render an amount for donor-facing messages, e.g. `₹1000.00`
    pub fn format(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol(), amount)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = FormError;

    fn from_str(s: &str) -> FormResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            other => Err(FormError::UnknownVariant {
                kind: "currency",
                value: other.to_string(),
            }),
        }
    }
}

// ================================================================================================
// Form State
// ================================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Everything the donor has entered so far, valid or not
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonationFormState {
    #[serde(default)]
    pub step: DonationStep,

    /// Selected preset amount
    #[serde(default)]
    pub amount: Option<Decimal>,

    /// Free-text amount; takes precedence over the preset when non-blank
    #[serde(default)]
    pub custom_amount: String,

    #[serde(default)]
    pub recurring: bool,

    #[serde(default)]
    pub frequency: Option<Frequency>,

    #[serde(default)]
    pub donor: DonorInfo,

    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

/// A donation that has passed all three steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedDonation {
    pub amount: Decimal,
    pub currency: Currency,
    pub donor: DonorInfo,
    pub recurring: bool,
    pub frequency: Option<Frequency>,
    pub payment_method: PaymentMethod,
}

impl ValidatedDonation {
    pub fn amount_minor(&self) -> FormResult<u64> {
        self.currency.to_minor_units(self.amount)
    }
}

// ================================================================================================
// Form Configuration
// ================================================================================================

/// Upper bound for any single donation, whatever `max_amount` is configured to
pub const MAX_DONATION_AMOUNT: Decimal = dec!(1_000_000_000);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_min_amount")]
    pub min_amount: Decimal,

    #[serde(default = "default_max_amount")]
    pub max_amount: Decimal,

    /// Amounts offered as one-click buttons on the first step
    #[serde(default = "default_preset_amounts")]
    pub preset_amounts: Vec<Decimal>,

    #[serde(default = "default_currency")]
    pub currency: Currency,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
            preset_amounts: default_preset_amounts(),
            currency: default_currency(),
        }
    }
}

fn default_min_amount() -> Decimal {
    dec!(100)
}

fn default_max_amount() -> Decimal {
    dec!(1000000)
}

fn default_preset_amounts() -> Vec<Decimal> {
    vec![dec!(500), dec!(1000), dec!(2500), dec!(5000)]
}

fn default_currency() -> Currency {
    Currency::Inr
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_navigation_order() {
        assert_eq!(DonationStep::Amount.next(), Some(DonationStep::DonorInfo));
        assert_eq!(DonationStep::DonorInfo.next(), Some(DonationStep::Payment));
        assert_eq!(DonationStep::Payment.next(), None);

        assert_eq!(DonationStep::Amount.previous(), None);
        assert_eq!(DonationStep::Payment.previous(), Some(DonationStep::DonorInfo));

        assert!(DonationStep::Amount < DonationStep::Payment);
        assert_eq!(DonationStep::default(), DonationStep::Amount);
    }

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(Currency::Inr.to_minor_units(dec!(1000)).unwrap(), 100_000);
        assert_eq!(Currency::Usd.to_minor_units(dec!(25.50)).unwrap(), 2_550);
        assert_eq!(Currency::Usd.from_minor_units(2_550), dec!(25.50));

        assert!(Currency::Inr.to_minor_units(dec!(10.005)).is_err());
        assert!(Currency::Inr.to_minor_units(dec!(-1)).is_err());
        assert!(matches!(
            Currency::Inr.to_minor_units(Decimal::MAX),
            Err(FormError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_provider_currency_support() {
        assert!(PaymentMethod::Razorpay.supports(Currency::Inr));
        assert!(!PaymentMethod::Razorpay.supports(Currency::Usd));
        assert!(PaymentMethod::PayPal.supports(Currency::Usd));
        assert!(!PaymentMethod::PayPal.supports(Currency::Inr));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("PayPal".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayPal);
        assert_eq!("annually".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert!(matches!(
            "bitcoin".parse::<PaymentMethod>(),
            Err(FormError::UnknownVariant { kind: "payment method", .. })
        ));
    }

    #[test]
    fn test_form_state_serialization() {
        let state = DonationFormState {
            amount: Some(dec!(500)),
            recurring: true,
            frequency: Some(Frequency::Monthly),
            payment_method: Some(PaymentMethod::PayPal),
            ..Default::default()
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"payment_method\":\"paypal\""));
        assert!(json.contains("\"frequency\":\"monthly\""));

        let parsed: DonationFormState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Currency::Inr.format(dec!(1000)), "₹1000.00");
        assert_eq!(Currency::Usd.format(dec!(25.5)), "$25.50");
    }
}
