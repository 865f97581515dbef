//! Header encoding and decoding for payment descriptors and proofs.
//!
//! A challenge carries the descriptor as one header per field next to the
//! `X-Payment-Required: true` marker. The proof travels back in a single
//! `X-Payment` header as base64-encoded JSON.
//!
//! Decoding is strict: a required field that is missing or does not parse
//! rejects the whole descriptor, and token headers must come as a complete
//! set.

use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue};
use unlock402::encoding::{decode_json, encode_json};
use unlock402::{Address, Network, PaymentDescriptor, PaymentProof, ProtocolVersion, TokenAsset, U256};

use crate::constants::{
    X_PAYMENT_AMOUNT, X_PAYMENT_ASSET, X_PAYMENT_DESCRIPTION, X_PAYMENT_EXPIRY,
    X_PAYMENT_MIME_TYPE, X_PAYMENT_NETWORK, X_PAYMENT_PAY_TO, X_PAYMENT_REQUIRED,
    X_PAYMENT_RESOURCE, X_PAYMENT_TOKEN_ADDRESS, X_PAYMENT_TOKEN_DECIMALS, X_PAYMENT_TOKEN_SYMBOL,
    X_PAYMENT_VERSION,
};
use crate::error::{DescriptorError, HttpError, ProofError};

/// Encodes `descriptor` as challenge headers.
///
/// Every field set on the descriptor yields exactly one header; absent
/// optional fields yield none.
///
/// # Errors
///
/// Returns [`HttpError::InvalidHeaderValue`] if a free-text field contains
/// bytes that cannot appear in a header.
pub fn encode_descriptor_headers(descriptor: &PaymentDescriptor) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert(X_PAYMENT_REQUIRED, HeaderValue::from_static("true"));
    headers.insert(
        X_PAYMENT_VERSION,
        HeaderValue::from_static(ProtocolVersion::VALUE),
    );
    headers.insert(
        X_PAYMENT_NETWORK,
        HeaderValue::from_static(descriptor.network.as_str()),
    );
    put(&mut headers, X_PAYMENT_PAY_TO, &descriptor.pay_to.to_string())?;
    put(
        &mut headers,
        X_PAYMENT_AMOUNT,
        &descriptor.max_amount_required.to_string(),
    )?;
    put(&mut headers, X_PAYMENT_RESOURCE, &descriptor.resource)?;
    if let Some(description) = &descriptor.description {
        put(&mut headers, X_PAYMENT_DESCRIPTION, description)?;
    }
    if let Some(mime_type) = &descriptor.mime_type {
        put(&mut headers, X_PAYMENT_MIME_TYPE, mime_type)?;
    }
    if let Some(expiry) = descriptor.expiry {
        headers.insert(X_PAYMENT_EXPIRY, HeaderValue::from(expiry));
    }
    if let Some(token) = &descriptor.token {
        put(&mut headers, X_PAYMENT_ASSET, &token.asset)?;
        put(&mut headers, X_PAYMENT_TOKEN_ADDRESS, &token.address.to_string())?;
        headers.insert(
            X_PAYMENT_TOKEN_DECIMALS,
            HeaderValue::from(u16::from(token.decimals)),
        );
        put(&mut headers, X_PAYMENT_TOKEN_SYMBOL, &token.symbol)?;
    }
    Ok(headers)
}

fn put(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<(), HttpError> {
    let value = HeaderValue::from_str(value)
        .map_err(|source| HttpError::InvalidHeaderValue {
            name: name.clone(),
            source,
        })?;
    headers.insert(name, value);
    Ok(())
}

/// Decodes a payment descriptor from challenge headers.
///
/// # Errors
///
/// - [`DescriptorError::NotRequired`] unless `X-Payment-Required` is exactly `"true"`
/// - [`DescriptorError::MissingField`] if pay-to, amount, resource or network is absent
/// - [`DescriptorError::InvalidField`] if any present field fails to parse
/// - [`DescriptorError::PartialToken`] if only some token headers are present
pub fn decode_descriptor_headers(headers: &HeaderMap) -> Result<PaymentDescriptor, DescriptorError> {
    if text(headers, &X_PAYMENT_REQUIRED, "X-Payment-Required")? != Some("true") {
        return Err(DescriptorError::NotRequired);
    }

    let pay_to: Address = required(headers, &X_PAYMENT_PAY_TO, "X-Payment-PayTo")?;
    let amount = {
        let raw = require(headers, &X_PAYMENT_AMOUNT, "X-Payment-Amount")?;
        U256::from_str_radix(raw, 10).map_err(|_| invalid("X-Payment-Amount", raw))?
    };
    let resource = require(headers, &X_PAYMENT_RESOURCE, "X-Payment-Resource")?.to_owned();
    let network: Network = required(headers, &X_PAYMENT_NETWORK, "X-Payment-Network")?;
    // A missing version header means the only version there is.
    let version: Option<ProtocolVersion> = optional(headers, &X_PAYMENT_VERSION, "X-Payment-Version")?;

    let mut descriptor = PaymentDescriptor::new(network, pay_to, amount, resource);
    descriptor.version = version.unwrap_or_default();
    descriptor.description =
        text(headers, &X_PAYMENT_DESCRIPTION, "X-Payment-Description")?.map(str::to_owned);
    descriptor.mime_type =
        text(headers, &X_PAYMENT_MIME_TYPE, "X-Payment-MimeType")?.map(str::to_owned);
    descriptor.expiry = optional(headers, &X_PAYMENT_EXPIRY, "X-Payment-Expiry")?;
    descriptor.token = decode_token(headers)?;
    Ok(descriptor)
}

fn decode_token(headers: &HeaderMap) -> Result<Option<TokenAsset>, DescriptorError> {
    let asset = text(headers, &X_PAYMENT_ASSET, "X-Payment-Asset")?;
    let address: Option<Address> =
        optional(headers, &X_PAYMENT_TOKEN_ADDRESS, "X-Payment-TokenAddress")?;
    let decimals: Option<u8> =
        optional(headers, &X_PAYMENT_TOKEN_DECIMALS, "X-Payment-TokenDecimals")?;
    let symbol = text(headers, &X_PAYMENT_TOKEN_SYMBOL, "X-Payment-TokenSymbol")?;
    match (asset, address, decimals, symbol) {
        (Some(asset), Some(address), Some(decimals), Some(symbol)) => Ok(Some(TokenAsset {
            asset: asset.to_owned(),
            address,
            decimals,
            symbol: symbol.to_owned(),
        })),
        (None, None, None, None) => Ok(None),
        _ => Err(DescriptorError::PartialToken),
    }
}

fn invalid(name: &'static str, value: &str) -> DescriptorError {
    DescriptorError::InvalidField {
        name,
        value: value.to_owned(),
    }
}

/// Reads a header as UTF-8 text.
fn text<'a>(
    headers: &'a HeaderMap,
    header: &HeaderName,
    name: &'static str,
) -> Result<Option<&'a str>, DescriptorError> {
    headers
        .get(header)
        .map(|value| {
            std::str::from_utf8(value.as_bytes()).map_err(|_| DescriptorError::InvalidField {
                name,
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
            })
        })
        .transpose()
}

fn require<'a>(
    headers: &'a HeaderMap,
    header: &HeaderName,
    name: &'static str,
) -> Result<&'a str, DescriptorError> {
    text(headers, header, name)?.ok_or(DescriptorError::MissingField(name))
}

fn optional<T: FromStr>(
    headers: &HeaderMap,
    header: &HeaderName,
    name: &'static str,
) -> Result<Option<T>, DescriptorError> {
    text(headers, header, name)?
        .map(|raw| raw.parse().map_err(|_| invalid(name, raw)))
        .transpose()
}

fn required<T: FromStr>(
    headers: &HeaderMap,
    header: &HeaderName,
    name: &'static str,
) -> Result<T, DescriptorError> {
    optional(headers, header, name)?.ok_or(DescriptorError::MissingField(name))
}

/// Encodes `proof` as the value of the `X-Payment` header.
///
/// # Errors
///
/// Returns [`HttpError::Json`] if the proof cannot be serialized.
pub fn encode_proof_header(proof: &PaymentProof) -> Result<HeaderValue, HttpError> {
    let encoded = encode_json(proof)?;
    // Base64 output is always a valid header value.
    HeaderValue::from_str(&encoded).map_err(|source| HttpError::InvalidHeaderValue {
        name: crate::constants::X_PAYMENT,
        source,
    })
}

/// Decodes the value of an `X-Payment` header.
///
/// # Errors
///
/// Returns [`ProofError`] if the value is not base64, not JSON, or lacks any
/// of `version`, `network`, `transactionHash`, `payer`.
pub fn decode_proof_header(value: &HeaderValue) -> Result<PaymentProof, ProofError> {
    let value = value
        .to_str()
        .map_err(|e| ProofError::Base64(e.to_string()))?;
    Ok(decode_json(value)?)
}

#[cfg(test)]
mod tests {
    use unlock402::TxHash;

    use super::*;
    use crate::constants::{DESCRIPTOR_HEADERS, X_PAYMENT_PAY_TO};

    const PAY_TO: &str = "0x00000000000000000000000000000000000000aA";

    fn native() -> PaymentDescriptor {
        PaymentDescriptor::new(
            Network::BaseSepolia,
            PAY_TO.parse().unwrap(),
            U256::from(1_000_000_000_000_000u64),
            "/api/content/1",
        )
    }

    fn token() -> PaymentDescriptor {
        native()
            .with_description("Premium article")
            .with_mime_type("application/json")
            .with_expiry(1_900_000_000)
            .with_token(TokenAsset {
                asset: "USDC".into(),
                address: "0x036CbD53842c5426634e7929541eC2318f3dCF7e".parse().unwrap(),
                decimals: 6,
                symbol: "USDC".into(),
            })
    }

    #[test]
    fn native_descriptor_round_trips() {
        let headers = encode_descriptor_headers(&native()).unwrap();
        assert_eq!(headers.len(), 6);
        assert_eq!(headers[&X_PAYMENT_AMOUNT], "1000000000000000");
        assert_eq!(headers[&X_PAYMENT_NETWORK], "base-sepolia");
        assert_eq!(decode_descriptor_headers(&headers).unwrap(), native());
    }

    #[test]
    fn token_descriptor_round_trips_with_every_header() {
        let headers = encode_descriptor_headers(&token()).unwrap();
        assert_eq!(headers.len(), DESCRIPTOR_HEADERS.len());
        assert_eq!(headers[&X_PAYMENT_TOKEN_DECIMALS], "6");
        assert_eq!(decode_descriptor_headers(&headers).unwrap(), token());
    }

    #[test]
    fn non_ascii_description_round_trips() {
        let descriptor = native().with_description("Café guide");
        let headers = encode_descriptor_headers(&descriptor).unwrap();
        assert_eq!(decode_descriptor_headers(&headers).unwrap(), descriptor);
    }

    #[test]
    fn marker_must_be_exactly_true() {
        let mut headers = encode_descriptor_headers(&native()).unwrap();
        headers.insert(X_PAYMENT_REQUIRED, HeaderValue::from_static("TRUE"));
        assert_eq!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::NotRequired)
        );
        assert_eq!(
            decode_descriptor_headers(&HeaderMap::new()),
            Err(DescriptorError::NotRequired)
        );
    }

    #[test]
    fn missing_required_field_rejects_descriptor() {
        let mut headers = encode_descriptor_headers(&native()).unwrap();
        headers.remove(X_PAYMENT_PAY_TO);
        assert_eq!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::MissingField("X-Payment-PayTo"))
        );
    }

    #[test]
    fn malformed_numbers_are_rejected_not_defaulted() {
        let mut headers = encode_descriptor_headers(&token()).unwrap();
        headers.insert(X_PAYMENT_TOKEN_DECIMALS, HeaderValue::from_static("six"));
        assert_eq!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::InvalidField {
                name: "X-Payment-TokenDecimals",
                value: "six".into(),
            })
        );

        let mut headers = encode_descriptor_headers(&native()).unwrap();
        headers.insert(X_PAYMENT_AMOUNT, HeaderValue::from_static("0x10"));
        assert!(matches!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::InvalidField { name: "X-Payment-Amount", .. })
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut headers = encode_descriptor_headers(&native()).unwrap();
        headers.insert(X_PAYMENT_VERSION, HeaderValue::from_static("2"));
        assert!(matches!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::InvalidField { name: "X-Payment-Version", .. })
        ));
    }

    #[test]
    fn partial_token_headers_are_rejected() {
        let mut headers = encode_descriptor_headers(&token()).unwrap();
        headers.remove(X_PAYMENT_TOKEN_SYMBOL);
        assert_eq!(
            decode_descriptor_headers(&headers),
            Err(DescriptorError::PartialToken)
        );
    }

    #[test]
    fn header_breaking_description_fails_to_encode() {
        let descriptor = native().with_description("line\nbreak");
        assert!(matches!(
            encode_descriptor_headers(&descriptor),
            Err(HttpError::InvalidHeaderValue { .. })
        ));
    }

    #[test]
    fn proof_round_trips() {
        let proof = PaymentProof::for_descriptor(
            &native(),
            TxHash::repeat_byte(0x11),
            "0x00000000000000000000000000000000000000bb".parse().unwrap(),
        );
        let header = encode_proof_header(&proof).unwrap();
        assert_eq!(decode_proof_header(&header).unwrap(), proof);
    }

    #[test]
    fn malformed_proofs_are_rejected() {
        assert!(matches!(
            decode_proof_header(&HeaderValue::from_static("not base64!")),
            Err(ProofError::Base64(_))
        ));
        // {"version":"1","network":"base"}
        let incomplete = HeaderValue::from_static("eyJ2ZXJzaW9uIjoiMSIsIm5ldHdvcmsiOiJiYXNlIn0=");
        assert!(matches!(
            decode_proof_header(&incomplete),
            Err(ProofError::Json(_))
        ));
    }
}
