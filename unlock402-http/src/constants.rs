//! HTTP header names used by the payment exchange.
//!
//! Names are stored lowercase, as `http` requires for static header names;
//! HTTP header names are case-insensitive on the wire.

use http::HeaderName;

/// Marker header set to `"true"` on a payment challenge.
pub const X_PAYMENT_REQUIRED: HeaderName = HeaderName::from_static("x-payment-required");

/// Protocol version of the descriptor.
pub const X_PAYMENT_VERSION: HeaderName = HeaderName::from_static("x-payment-version");

/// Network the payment must be made on.
pub const X_PAYMENT_NETWORK: HeaderName = HeaderName::from_static("x-payment-network");

/// Recipient address.
pub const X_PAYMENT_PAY_TO: HeaderName = HeaderName::from_static("x-payment-payto");

/// Required amount in base units, as a decimal string.
pub const X_PAYMENT_AMOUNT: HeaderName = HeaderName::from_static("x-payment-amount");

/// Identifier of the protected resource.
pub const X_PAYMENT_RESOURCE: HeaderName = HeaderName::from_static("x-payment-resource");

/// Optional human-readable description.
pub const X_PAYMENT_DESCRIPTION: HeaderName = HeaderName::from_static("x-payment-description");

/// Optional MIME type of the resource.
pub const X_PAYMENT_MIME_TYPE: HeaderName = HeaderName::from_static("x-payment-mimetype");

/// Optional expiry, a Unix timestamp.
pub const X_PAYMENT_EXPIRY: HeaderName = HeaderName::from_static("x-payment-expiry");

/// Asset tag of a token payment.
pub const X_PAYMENT_ASSET: HeaderName = HeaderName::from_static("x-payment-asset");

/// Token contract address of a token payment.
pub const X_PAYMENT_TOKEN_ADDRESS: HeaderName = HeaderName::from_static("x-payment-tokenaddress");

/// Token decimals of a token payment.
pub const X_PAYMENT_TOKEN_DECIMALS: HeaderName =
    HeaderName::from_static("x-payment-tokendecimals");

/// Token symbol of a token payment.
pub const X_PAYMENT_TOKEN_SYMBOL: HeaderName = HeaderName::from_static("x-payment-tokensymbol");

/// Base64 JSON payment proof (client to server).
pub const X_PAYMENT: HeaderName = HeaderName::from_static("x-payment");

/// Every header a challenge may carry, in wire order.
pub const DESCRIPTOR_HEADERS: [HeaderName; 13] = [
    X_PAYMENT_REQUIRED,
    X_PAYMENT_VERSION,
    X_PAYMENT_NETWORK,
    X_PAYMENT_PAY_TO,
    X_PAYMENT_AMOUNT,
    X_PAYMENT_RESOURCE,
    X_PAYMENT_DESCRIPTION,
    X_PAYMENT_MIME_TYPE,
    X_PAYMENT_EXPIRY,
    X_PAYMENT_ASSET,
    X_PAYMENT_TOKEN_ADDRESS,
    X_PAYMENT_TOKEN_DECIMALS,
    X_PAYMENT_TOKEN_SYMBOL,
];

/// Value of `Access-Control-Expose-Headers` on a challenge, so browser
/// clients can read the descriptor headers.
pub const EXPOSED_DESCRIPTOR_HEADERS: &str = "X-Payment-Required, X-Payment-Version, \
    X-Payment-Network, X-Payment-PayTo, X-Payment-Amount, X-Payment-Resource, \
    X-Payment-Description, X-Payment-MimeType, X-Payment-Expiry, X-Payment-Asset, \
    X-Payment-TokenAddress, X-Payment-TokenDecimals, X-Payment-TokenSymbol";
