//! Content server configuration.
//!
//! Loaded from a TOML file whose string values may reference environment
//! variables as `$VAR` or `${VAR}`. References that are not set are left in
//! place, so a missing variable shows up verbatim in the error it causes.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 4021
//!
//! [chains.base-sepolia]
//! rpc_url = "${BASE_SEPOLIA_RPC_URL}"
//! timeout_secs = 10
//!
//! [[content]]
//! id = "1"
//! title = "Premium article"
//! body = "The full text."
//! network = "base-sepolia"
//! pay_to = "$PAY_TO"
//! amount = "1000000000000000"
//!
//! [[content]]
//! id = "2"
//! title = "Research report"
//! body = "Paid in USDC."
//! network = "base-sepolia"
//! pay_to = "$PAY_TO"
//! amount = "1000000"
//!
//! [content.token]
//! address = "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
//! decimals = 6
//! symbol = "USDC"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to the configuration file (default: `config.toml`)
//! - `HOST` - Override the bind address
//! - `PORT` - Override the port

use std::collections::{BTreeMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use unlock402::{Address, Network, PaymentConfig, PaymentTerms, TokenAsset, U256};
use url::Url;

use crate::error::ServerError;

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port (default: `4021`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// RPC endpoints keyed by network name (`base`, `base-sepolia`).
    /// Networks without an entry use their public endpoint.
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,

    /// The paywalled catalog.
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

/// RPC endpoint for one network.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// HTTP JSON-RPC endpoint.
    pub rpc_url: Url,

    /// Per-call timeout in seconds (default: 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ChainConfig {
    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// One paywalled item.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    /// Path segment under `/api/content/`; ASCII letters, digits, `-`, `.`, `_` and `~`.
    pub id: String,
    /// Listed in the catalog.
    pub title: String,
    /// Released after payment.
    pub body: String,
    /// Network the payment must be made on.
    pub network: Network,
    /// Recipient account.
    pub pay_to: Address,
    /// Price in base units, as a decimal string.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
    /// Shown to the payer.
    #[serde(default)]
    pub description: Option<String>,
    /// MIME type advertised in the challenge.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Present for ERC-20 priced items.
    #[serde(default)]
    pub token: Option<TokenConfig>,
}

/// ERC-20 token an item is priced in.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Contract address.
    pub address: Address,
    /// Decimals of the token.
    pub decimals: u8,
    /// Display symbol.
    pub symbol: String,
    /// Asset identifier (default: the symbol).
    #[serde(default)]
    pub asset: Option<String>,
}

impl ContentItem {
    /// Path the item is served at.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/api/content/{}", self.id)
    }

    /// Payment configuration enforced for this item.
    #[must_use]
    pub fn payment_config(&self) -> PaymentConfig {
        let mut terms = PaymentTerms::new(self.network, self.pay_to, self.amount, self.path());
        terms.description = self.description.clone().or_else(|| Some(self.title.clone()));
        terms.mime_type = self.mime_type.clone();
        match &self.token {
            None => PaymentConfig::native(terms),
            Some(token) => PaymentConfig::token(
                terms,
                TokenAsset {
                    asset: token.asset.clone().unwrap_or_else(|| token.symbol.clone()),
                    address: token.address,
                    decimals: token.decimals,
                    symbol: token.symbol.clone(),
                },
            ),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    4021
}

const fn default_timeout_secs() -> u64 {
    10
}

impl ServerConfig {
    /// Loads the file named by `CONFIG` (default `config.toml`) and applies
    /// `HOST` / `PORT` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the file cannot be read, parsed or validated.
    pub fn load() -> Result<Self, ServerError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        let mut config = Self::load_from(Path::new(&path))?;
        if let Some(host) = env_parsed("HOST") {
            config.host = host;
        }
        if let Some(port) = env_parsed("PORT") {
            config.port = port;
        }
        Ok(config)
    }

    /// Loads and validates the file at `path`. A missing file yields the
    /// defaults with an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ServerError> {
        let raw = if path.exists() {
            std::fs::read_to_string(path).map_err(|source| ServerError::ReadConfig {
                path: path.display().to_string(),
                source,
            })?
        } else {
            String::new()
        };
        Self::parse(&expand_vars(&raw, |name| std::env::var(name).ok()))
    }

    /// Parses and validates TOML that has already been expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] on a schema or validation failure.
    pub fn parse(toml: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Networks with a configured RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownNetwork`] for an unsupported `[chains]` key.
    pub fn chain_networks(&self) -> Result<Vec<(Network, &ChainConfig)>, ServerError> {
        self.chains
            .iter()
            .map(|(name, chain)| Ok((Network::from_str(name)?, chain)))
            .collect()
    }

    fn validate(&self) -> Result<(), ServerError> {
        for (network, chain) in self.chain_networks()? {
            if chain.timeout_secs == 0 {
                return Err(ServerError::InvalidTimeout(network));
            }
        }
        let mut ids = HashSet::new();
        for item in &self.content {
            if !is_path_segment(&item.id) {
                return Err(ServerError::InvalidContentId(item.id.clone()));
            }
            if !ids.insert(item.id.as_str()) {
                return Err(ServerError::DuplicateContent(item.id.clone()));
            }
        }
        Ok(())
    }
}

/// Ids become literal route segments; only RFC 3986 unreserved characters
/// are allowed, and `.`/`..` are refused.
fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

fn env_parsed<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

/// Replaces `$NAME` and `${NAME}` with `lookup(NAME)`; unknown names stay as written.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            braced.find('}').map_or(("", 0), |end| (&braced[..end], end + 2))
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };
        match Some(name).filter(|n| !n.is_empty()).and_then(&lookup) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..=start + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "PAY_TO" => Some("0x00000000000000000000000000000000000000aa".into()),
            "RPC" => Some("https://sepolia.base.org".into()),
            _ => None,
        }
    }

    const CONFIG: &str = r#"
        port = 8080

        [chains.base-sepolia]
        rpc_url = "${RPC}"

        [[content]]
        id = "1"
        title = "Premium article"
        body = "The full text."
        network = "base-sepolia"
        pay_to = "$PAY_TO"
        amount = "1000000000000000"

        [[content]]
        id = "2"
        title = "Research report"
        body = "Paid in USDC."
        network = "base-sepolia"
        pay_to = "$PAY_TO"
        amount = "1000000"
        description = "Quarterly report"

        [content.token]
        address = "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
        decimals = 6
        symbol = "USDC"
    "#;

    #[test]
    fn expands_plain_and_braced_vars() {
        assert_eq!(expand_vars("a=$PAY_TO;", env), "a=0x00000000000000000000000000000000000000aa;");
        assert_eq!(expand_vars("${RPC}/v1", env), "https://sepolia.base.org/v1");
    }

    #[test]
    fn leaves_unknown_and_bare_dollars() {
        assert_eq!(expand_vars("$MISSING and ${MISSING}", env), "$MISSING and ${MISSING}");
        assert_eq!(expand_vars("cost: 5$ ${", env), "cost: 5$ ${");
        assert_eq!(expand_vars("€$RPC€", env), "€https://sepolia.base.org€");
    }

    #[test]
    fn parses_full_config() {
        let config = ServerConfig::parse(&expand_vars(CONFIG, env)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, default_host());
        let chains = config.chain_networks().unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].0, Network::BaseSepolia);
        assert_eq!(chains[0].1.timeout(), Duration::from_secs(10));
        assert_eq!(config.content.len(), 2);

        let native = config.content[0].payment_config();
        assert_eq!(native.terms().resource, "/api/content/1");
        assert_eq!(native.terms().description.as_deref(), Some("Premium article"));
        assert!(native.token_asset().is_none());

        let token = config.content[1].payment_config();
        assert_eq!(token.amount(), U256::from(1_000_000u64));
        assert_eq!(token.terms().description.as_deref(), Some("Quarterly report"));
        let asset = token.token_asset().unwrap();
        assert_eq!(asset.asset, "USDC");
        assert_eq!(asset.decimals, 6);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.port, 4021);
        assert!(config.content.is_empty());
    }

    #[test]
    fn rejects_unknown_chain() {
        let err = ServerConfig::parse("[chains.mainnet]\nrpc_url = \"http://localhost:8545\"").unwrap_err();
        assert!(matches!(err, ServerError::UnknownNetwork(_)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let toml = expand_vars(CONFIG, env).replace("id = \"2\"", "id = \"1\"");
        let err = ServerConfig::parse(&toml).unwrap_err();
        assert!(matches!(err, ServerError::DuplicateContent(id) if id == "1"));
    }

    #[test]
    fn rejects_ids_that_are_not_plain_segments() {
        for bad in ["", ":x", "*x", "a?b", "a#b", "a/b", "{id}", "a b", "..", "é"] {
            let toml = expand_vars(CONFIG, env).replace("id = \"2\"", &format!("id = {bad:?}"));
            let err = ServerConfig::parse(&toml).unwrap_err();
            assert!(matches!(err, ServerError::InvalidContentId(ref id) if id == bad), "{bad:?}: {err}");
        }
        let toml = expand_vars(CONFIG, env).replace("id = \"2\"", "id = \"report-2024_v1.~\"");
        assert!(ServerConfig::parse(&toml).is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let toml = expand_vars(CONFIG, env).replace("[chains.base-sepolia]", "[chains.base-sepolia]\ntimeout_secs = 0");
        let err = ServerConfig::parse(&toml).unwrap_err();
        assert!(matches!(err, ServerError::InvalidTimeout(Network::BaseSepolia)));
    }

    #[test]
    fn rejects_unexpanded_address() {
        let err = ServerConfig::parse(CONFIG).unwrap_err();
        assert!(matches!(err, ServerError::ParseConfig(_)));
    }
}
