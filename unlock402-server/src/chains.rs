//! RPC readers for the networks the catalog is priced on.

use std::collections::BTreeSet;

use unlock402::Network;
use unlock402_evm::ChainReaders;
use unlock402_evm::chain::RpcChainReader;
use unlock402_evm::networks::default_rpc_url;
use url::Url;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Builds one reader per `[chains]` entry, plus a reader on the public
/// endpoint for every network the catalog uses without an entry.
///
/// # Errors
///
/// Returns [`ServerError`] for an unknown `[chains]` key.
pub fn chain_readers(config: &ServerConfig) -> Result<ChainReaders, ServerError> {
    let mut readers = ChainReaders::new();
    for (network, chain) in config.chain_networks()? {
        tracing::info!(%network, rpc_url = %chain.rpc_url, "Using configured RPC endpoint");
        readers.insert(
            network,
            RpcChainReader::new(network, chain.rpc_url.clone()).with_timeout(chain.timeout()),
        );
    }

    let priced_on: BTreeSet<Network> = config.content.iter().map(|item| item.network).collect();
    for network in priced_on {
        if readers.get(network).is_none() {
            let url: Url = default_rpc_url(network).parse()?;
            tracing::warn!(%network, rpc_url = %url, "No [chains] entry, using public RPC endpoint");
            readers.insert(network, RpcChainReader::new(network, url));
        }
    }
    Ok(readers)
}
