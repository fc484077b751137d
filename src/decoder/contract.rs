use std::sync::Arc;

use crate::analyzer::types::{Balance, SmartContract, TokenBalance};
use crate::analyzer::utils::format_units;
use crate::fetcher::fetcher::BlockFetcher;
use crate::types::AppError;

/// Asset (MST) balances. `contract.address` carries the asset symbol.
pub struct ContractDecoder {
  fetcher: Arc<dyn BlockFetcher>,
}

impl ContractDecoder {
  pub fn new(fetcher: Arc<dyn BlockFetcher>) -> Self {
    Self { fetcher }
  }

  pub async fn get_token_balance_by_address(
    &self,
    contract: &SmartContract,
    addresses: &[String],
  ) -> Result<Vec<TokenBalance>, AppError> {
    let mut balances = Vec::with_capacity(addresses.len());

    for address in addresses {
      let asset = self.fetcher.get_address_asset(address, &contract.address).await?;
      let amount = format_units(&asset.quantity, contract.decimals)?;

      balances.push(TokenBalance {
        contract: contract.clone(),
        balance: Balance {
          symbol: contract.symbol.clone(),
          address: address.clone(),
          balance: amount.clone(),
          confirm_balance: amount,
          unconfirm_balance: "0".to_string(),
        },
      });
    }

    Ok(balances)
  }
}
