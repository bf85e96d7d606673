//! Registry of the three networks and the process-wide selection
//!
//! All parameter sets are built once, when the registry is created. Selection
//! only records which of them is active, so references handed out earlier stay
//! valid after a later selection.

use crate::chainparams::ChainParams;
use crate::network::NetworkType;
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// Owner of every network's parameters plus the active selection
#[derive(Debug)]
pub struct ChainRegistry {
    main: ChainParams,
    test: ChainParams,
    regtest: ChainParams,
    active: RwLock<Option<NetworkType>>,
}

impl ChainRegistry {
    /// Build and verify all three parameter sets, with nothing selected
    pub fn new() -> Result<Self> {
        let registry = Self {
            main: ChainParams::mainnet()?,
            test: ChainParams::testnet()?,
            regtest: ChainParams::regtest()?,
            active: RwLock::new(None),
        };
        debug!("Chain registry initialized");
        Ok(registry)
    }

    /// Shared registry (lazy init)
    ///
    /// Construction runs at most once; a failed build is returned to every
    /// caller until one succeeds.
    pub fn global() -> Result<&'static ChainRegistry> {
        static CELL: OnceCell<ChainRegistry> = OnceCell::new();
        CELL.get_or_try_init(ChainRegistry::new)
    }

    /// Parameters of one network
    pub fn params(&self, network: NetworkType) -> &ChainParams {
        match network {
            NetworkType::Main => &self.main,
            NetworkType::Test => &self.test,
            NetworkType::Regtest => &self.regtest,
        }
    }

    /// Parameters by network name
    pub fn params_for(&self, name: &str) -> Result<&ChainParams> {
        let network: NetworkType = name.parse()?;
        Ok(self.params(network))
    }

    /// Make the named network active
    ///
    /// An unknown name fails and leaves the current selection unchanged.
    pub fn select(&self, name: &str) -> Result<&ChainParams> {
        let network: NetworkType = name.parse()?;
        Ok(self.select_network(network))
    }

    /// Make `network` active
    pub fn select_network(&self, network: NetworkType) -> &ChainParams {
        let previous = self.active.write().replace(network);
        match previous {
            Some(old) if old != network => {
                warn!("Switching active chain from {} to {}", old, network)
            }
            Some(_) => debug!("Chain {} already selected", network),
            None => info!("Selected chain {}", network),
        }
        self.params(network)
    }

    /// Parameters of the active network
    pub fn active(&self) -> Result<&ChainParams> {
        self.active_network()
            .map(|network| self.params(network))
            .ok_or(Error::NetworkNotSelected)
    }

    /// Active network, if one was selected
    pub fn active_network(&self) -> Option<NetworkType> {
        *self.active.read()
    }

    /// Iterate all parameter sets in network order
    pub fn iter(&self) -> impl Iterator<Item = &ChainParams> {
        NetworkType::ALL.into_iter().map(move |network| self.params(network))
    }
}

/// Select the named network in the shared registry
pub fn select_params(name: &str) -> Result<&'static ChainParams> {
    ChainRegistry::global()?.select(name)
}

/// Parameters of the network selected in the shared registry
pub fn params() -> Result<&'static ChainParams> {
    ChainRegistry::global()?.active()
}
