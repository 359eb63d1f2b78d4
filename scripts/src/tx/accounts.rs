//! Signers for the accounts declared on a network.

use std::str::FromStr;

use alloy::{
    primitives::{Address, U256},
    signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner},
};

use crate::{
    config::{AccountsConfig, HdAccountsConfig},
    errors::ScriptError,
};

/// Build every signer of an account set
pub fn signers(accounts: &AccountsConfig) -> Result<Vec<PrivateKeySigner>, ScriptError> {
    match accounts {
        AccountsConfig::Keys(keys) => keys.iter().map(|key| signer_from_key(key)).collect(),
        AccountsConfig::Mnemonic(hd) => (0..hd.count).map(|index| derive_signer(hd, index)).collect(),
    }
}

/// Addresses of an account set, in declaration / derivation order
pub fn addresses(accounts: &AccountsConfig) -> Result<Vec<Address>, ScriptError> {
    Ok(signers(accounts)?.iter().map(|signer| signer.address()).collect())
}

/// The account used to send transactions: the first one of the set
pub fn deployer_signer(accounts: &AccountsConfig) -> Result<PrivateKeySigner, ScriptError> {
    match accounts {
        AccountsConfig::Keys(keys) => keys
            .first()
            .ok_or_else(|| ScriptError::ClientInitialization(String::from("no deployer account configured")))
            .and_then(|key| signer_from_key(key)),
        AccountsConfig::Mnemonic(hd) if hd.count == 0 => Err(ScriptError::ClientInitialization(
            String::from("mnemonic account count is zero"),
        )),
        AccountsConfig::Mnemonic(hd) => derive_signer(hd, 0),
    }
}

/// Parse a hex encoded private key, with or without `0x` prefix
fn signer_from_key(key: &str) -> Result<PrivateKeySigner, ScriptError> {
    PrivateKeySigner::from_str(key.trim())
        .map_err(|e| ScriptError::ClientInitialization(format!("invalid private key: {e}")))
}

/// Derive the account at `m/44'/60'/0'/0/{index}`
fn derive_signer(hd: &HdAccountsConfig, index: u32) -> Result<PrivateKeySigner, ScriptError> {
    MnemonicBuilder::<English>::default()
        .phrase(hd.mnemonic.as_str())
        .index(index)
        .and_then(|builder| builder.build())
        .map_err(|e| ScriptError::ClientInitialization(format!("invalid mnemonic: {e}")))
}

/// Starting balance of the derived accounts in whole ether, rounded down.
///
/// A non zero balance under one ether cannot be expressed and is rejected.
pub fn balance_in_ether(hd: &HdAccountsConfig) -> Result<U256, ScriptError> {
    let wei = U256::from_str(hd.accounts_balance.trim())
        .map_err(|e| ScriptError::Config(format!("invalid accounts balance: {e}")))?;
    let one_ether = U256::from(10u64).pow(U256::from(18u64));

    let ether = wei / one_ether;
    if ether.is_zero() && !wei.is_zero() {
        return Err(ScriptError::Config(format!(
            "accounts balance of {wei} wei is below one ether, the local node only funds whole ether"
        )));
    }
    Ok(ether)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    /// Well known first accounts of the test mnemonic
    const FIRST: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const SECOND: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    /// Private key of the first test account
    const FIRST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_mnemonic_derives_deterministic_accounts() {
        let accounts = AccountsConfig::Mnemonic(HdAccountsConfig::default());
        let addresses = addresses(&accounts).unwrap();
        assert_eq!(addresses.len(), 10);
        assert_eq!(addresses[0], FIRST);
        assert_eq!(addresses[1], SECOND);
        assert_eq!(deployer_signer(&accounts).unwrap().address(), FIRST);
    }

    #[test]
    fn private_keys_are_accepted_with_or_without_prefix() {
        let accounts = AccountsConfig::Keys(vec![
            FIRST_KEY.to_string(),
            FIRST_KEY.trim_start_matches("0x").to_string(),
        ]);
        assert_eq!(addresses(&accounts).unwrap(), vec![FIRST, FIRST]);
    }

    #[test]
    fn missing_deployer_is_an_error() {
        let err = deployer_signer(&AccountsConfig::Keys(vec![])).unwrap_err();
        assert!(matches!(err, ScriptError::ClientInitialization(_)));

        let hd = HdAccountsConfig {
            count: 0,
            ..Default::default()
        };
        assert!(deployer_signer(&AccountsConfig::Mnemonic(hd)).is_err());
    }

    #[test]
    fn invalid_key_is_an_error() {
        let accounts = AccountsConfig::Keys(vec!["not a key".to_string()]);
        assert!(deployer_signer(&accounts).is_err());
    }

    #[test]
    fn balance_is_converted_to_whole_ether() {
        let hd = HdAccountsConfig::default();
        assert_eq!(balance_in_ether(&hd).unwrap(), U256::from(100_000_000u64));

        let hd = HdAccountsConfig {
            accounts_balance: "1500000000000000000".to_string(),
            ..Default::default()
        };
        assert_eq!(balance_in_ether(&hd).unwrap(), U256::from(1u64));

        let hd = HdAccountsConfig {
            accounts_balance: "lots".to_string(),
            ..Default::default()
        };
        assert!(balance_in_ether(&hd).is_err());
    }

    #[test]
    fn balance_below_one_ether_is_rejected() {
        let hd = HdAccountsConfig {
            accounts_balance: "999999999999999999".to_string(),
            ..Default::default()
        };
        let err = balance_in_ether(&hd).unwrap_err();
        assert!(matches!(err, ScriptError::Config(_)));
        assert!(err.to_string().contains("below one ether"));

        let hd = HdAccountsConfig {
            accounts_balance: "0".to_string(),
            ..Default::default()
        };
        assert_eq!(balance_in_ether(&hd).unwrap(), U256::ZERO);
    }

    #[test]
    fn legacy_mnemonic_fails_at_derivation() {
        let hd = HdAccountsConfig {
            mnemonic: ["test"; 12].join(" "),
            ..Default::default()
        };
        let err = addresses(&AccountsConfig::Mnemonic(hd)).unwrap_err();
        assert!(err.to_string().contains("invalid mnemonic"));
    }
}
