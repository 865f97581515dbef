//! JSON body of `402 Payment Required` responses.

use serde::{Deserialize, Serialize};
use unlock402::PaymentDescriptor;

/// Message sent with a payment challenge.
pub const PAYMENT_REQUIRED_MESSAGE: &str = "payment required";

/// Message sent when a proof did not verify.
pub const VERIFICATION_FAILED_MESSAGE: &str = "payment verification failed";

/// The JSON envelope of a `402` response.
///
/// A challenge carries the descriptor in `paymentDetails`. A failed
/// verification carries only the generic message: the reason stays in the
/// server logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    /// Always `402`.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// The descriptor, present on challenges only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<PaymentDescriptor>,
}

impl PaymentRequiredBody {
    /// Body of a challenge issued for `descriptor`.
    #[must_use]
    pub fn challenge(descriptor: PaymentDescriptor) -> Self {
        Self {
            status: 402,
            message: PAYMENT_REQUIRED_MESSAGE.to_owned(),
            payment_details: Some(descriptor),
        }
    }

    /// Body sent when a proof fails verification.
    #[must_use]
    pub fn verification_failed() -> Self {
        Self {
            status: 402,
            message: VERIFICATION_FAILED_MESSAGE.to_owned(),
            payment_details: None,
        }
    }
}
