//! Collateral registry.
//!
//! Fixed at engine construction: which assets back debt and which feed prices
//! each of them. Registration order is the order every valuation pass walks.

use crate::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedAsset {
    pub asset: Address,
    pub price_feed: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Collateral token and price feed lists differ in length: {tokens} tokens, {feeds} feeds")]
    LengthMismatch { tokens: usize, feeds: usize },

    #[error("Collateral asset {0} registered twice")]
    DuplicateCollateral(Address),

    #[error("Token {0} is not allowed as collateral")]
    NotAllowedToken(Address),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralRegistry {
    assets: Vec<SupportedAsset>,
}

impl CollateralRegistry {
    /// Pairs `tokens[i]` with `feeds[i]`. Nothing is built unless the lists line up.
    pub fn new(tokens: &[Address], feeds: &[Address]) -> Result<Self, RegistryError> {
        if tokens.len() != feeds.len() {
            return Err(RegistryError::LengthMismatch {
                tokens: tokens.len(),
                feeds: feeds.len(),
            });
        }

        let mut assets: Vec<SupportedAsset> = Vec::with_capacity(tokens.len());
        for (&asset, &price_feed) in tokens.iter().zip(feeds) {
            if assets.iter().any(|a| a.asset == asset) {
                return Err(RegistryError::DuplicateCollateral(asset));
            }
            assets.push(SupportedAsset { asset, price_feed });
        }

        Ok(Self { assets })
    }

    pub fn is_supported(&self, asset: Address) -> bool {
        self.assets.iter().any(|a| a.asset == asset)
    }

    // permits supported assets, rejects the rest
    pub fn ensure_supported(&self, asset: Address) -> Result<(), RegistryError> {
        if self.is_supported(asset) {
            Ok(())
        } else {
            Err(RegistryError::NotAllowedToken(asset))
        }
    }

    pub fn price_feed(&self, asset: Address) -> Option<Address> {
        self.assets
            .iter()
            .find(|a| a.asset == asset)
            .map(|a| a.price_feed)
    }

    pub fn assets(&self) -> &[SupportedAsset] {
        &self.assets
    }

    pub fn tokens(&self) -> Vec<Address> {
        self.assets.iter().map(|a| a.asset).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn pairs_tokens_with_feeds_in_order() {
        let registry = CollateralRegistry::new(&[addr(1), addr(2)], &[addr(11), addr(12)]).unwrap();

        assert_eq!(registry.tokens(), vec![addr(1), addr(2)]);
        assert_eq!(registry.price_feed(addr(2)), Some(addr(12)));
        assert_eq!(registry.price_feed(addr(3)), None);
    }

    #[test]
    fn length_mismatch_rejected() {
        let result = CollateralRegistry::new(&[addr(1), addr(2)], &[addr(11)]);
        assert_eq!(result.unwrap_err(), RegistryError::LengthMismatch { tokens: 2, feeds: 1 });
    }

    #[test]
    fn duplicate_asset_rejected() {
        let result = CollateralRegistry::new(&[addr(1), addr(1)], &[addr(11), addr(12)]);
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateCollateral(addr(1)));
    }

    #[test]
    fn ensure_supported_permits_only_registered_assets() {
        let registry = CollateralRegistry::new(&[addr(1)], &[addr(11)]).unwrap();

        assert!(registry.ensure_supported(addr(1)).is_ok());
        assert_eq!(
            registry.ensure_supported(addr(9)),
            Err(RegistryError::NotAllowedToken(addr(9)))
        );
    }
}
