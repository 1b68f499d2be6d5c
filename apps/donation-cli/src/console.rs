use async_trait::async_trait;
use donation_forms::PaymentMethod;
use donation_gateway::{Approval, DonorApproval, GatewayError, GatewayResult, OrderHandle};
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Asks the operator for the checkout result on the terminal
///
/// A blank answer is treated as the donor closing the checkout.
pub struct ConsoleApproval;

#[async_trait]
impl DonorApproval for ConsoleApproval {
    async fn approve(&self, order: &OrderHandle) -> GatewayResult<Approval> {
        let prompt = match order.provider {
            PaymentMethod::Razorpay => format!(
                "💳 Razorpay order {} for {} {} paise\n   Enter '<payment_id> <signature>' from the checkout (blank to cancel): ",
                order.order_id,
                order.amount_minor,
                order.currency.code()
            ),
            PaymentMethod::PayPal => format!(
                "💳 PayPal order {} for {} {} cents\n   Approve it in PayPal, then enter the payer id or 'ok' (blank to cancel): ",
                order.order_id,
                order.amount_minor,
                order.currency.code()
            ),
        };

        let answer = tokio::task::spawn_blocking(move || read_answer(&prompt))
            .await
            .map_err(|e| {
                warn!("Approval prompt failed: {}", e);
                GatewayError::Cancelled
            })?
            .map_err(|e| {
                warn!("Could not read approval: {}", e);
                GatewayError::Cancelled
            })?;

        parse_answer(order.provider, &answer)
    }
}

fn read_answer(prompt: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn parse_answer(provider: PaymentMethod, answer: &str) -> GatewayResult<Approval> {
    if answer.is_empty() {
        return Err(GatewayError::Cancelled);
    }

    match provider {
        PaymentMethod::Razorpay => {
            let mut parts = answer.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(payment_id), Some(signature), None) => Ok(Approval::Razorpay {
                    payment_id: payment_id.to_string(),
                    signature: signature.to_string(),
                }),
                _ => Err(GatewayError::InvalidResponse(
                    "expected '<payment_id> <signature>'".to_string(),
                )),
            }
        }
        PaymentMethod::PayPal => Ok(Approval::PayPal {
            payer_id: if answer.eq_ignore_ascii_case("ok") {
                None
            } else {
                Some(answer.to_string())
            },
        }),
    }
}
