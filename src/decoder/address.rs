use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::types::AppError;

pub const ETP_MAINNET_P2PKH: u8 = 0x32;
pub const ETP_TESTNET_P2PKH: u8 = 0x7f;
pub const ETP_MAINNET_P2SH: u8 = 0x05;
pub const ETP_TESTNET_P2SH: u8 = 0xc4;

const OP_CHECKMULTISIG: u8 = 0xae;
const MAX_MULTISIG_KEYS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
  P2PKH,
  P2SH,
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
  let sha = Sha256::digest(data);
  Ripemd160::digest(sha).into()
}

fn op_n(n: usize) -> u8 {
  0x50 + n as u8
}

/// Base58check codec for ETP addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressDecoder {
  pub is_test_net: bool,
}

impl AddressDecoder {
  pub fn new(is_test_net: bool) -> Self {
    Self { is_test_net }
  }

  pub fn version(&self, kind: AddressKind) -> u8 {
    match (kind, self.is_test_net) {
      (AddressKind::P2PKH, false) => ETP_MAINNET_P2PKH,
      (AddressKind::P2PKH, true) => ETP_TESTNET_P2PKH,
      (AddressKind::P2SH, false) => ETP_MAINNET_P2SH,
      (AddressKind::P2SH, true) => ETP_TESTNET_P2SH,
    }
  }

  pub fn address_encode(&self, hash: &[u8], kind: AddressKind) -> Result<String, AppError> {
    if hash.len() != 20 {
      return Err(AppError::Decode(format!("address hash must be 20 bytes, got {}", hash.len())));
    }
    let mut payload = Vec::with_capacity(21);
    payload.push(self.version(kind));
    payload.extend_from_slice(hash);
    Ok(bs58::encode(payload).with_check().into_string())
  }

  /// Returns the 20-byte hash behind `address`.
  pub fn address_decode(&self, address: &str, kind: AddressKind) -> Result<Vec<u8>, AppError> {
    let payload = bs58::decode(address)
      .with_check(None)
      .into_vec()
      .map_err(|e| AppError::Decode(format!("invalid address {}: {}", address, e)))?;

    if payload.len() != 21 {
      return Err(AppError::Decode(format!("invalid address length: {}", address)));
    }
    let expected = self.version(kind);
    if payload[0] != expected {
      return Err(AppError::Decode(format!(
        "address {} has version {:#04x}, expected {:#04x}",
        address, payload[0], expected
      )));
    }
    Ok(payload[1..].to_vec())
  }

  /// True for a well-formed P2PKH or P2SH address of the configured network.
  pub fn address_verify(&self, address: &str) -> bool {
    self.address_decode(address, AddressKind::P2PKH).is_ok()
      || self.address_decode(address, AddressKind::P2SH).is_ok()
  }

  /// `public_key` is a 33-byte compressed or 65-byte uncompressed key.
  pub fn public_key_to_address(&self, public_key: &[u8]) -> Result<String, AppError> {
    if public_key.len() != 33 && public_key.len() != 65 {
      return Err(AppError::Decode(format!("invalid public key length: {}", public_key.len())));
    }
    self.address_encode(&hash160(public_key), AddressKind::P2PKH)
  }

  /// P2SH address of a `required`-of-`n` multisig redeem script.
  pub fn redeem_script_to_address(&self, public_keys: &[Vec<u8>], required: usize) -> Result<String, AppError> {
    let n = public_keys.len();
    if n == 0 || n > MAX_MULTISIG_KEYS || required == 0 || required > n {
      return Err(AppError::Decode(format!("invalid multisig {} of {}", required, n)));
    }

    let mut script = vec![op_n(required)];
    for key in public_keys {
      if key.len() != 33 && key.len() != 65 {
        return Err(AppError::Decode(format!("invalid public key length: {}", key.len())));
      }
      script.push(key.len() as u8);
      script.extend_from_slice(key);
    }
    script.push(op_n(n));
    script.push(OP_CHECKMULTISIG);

    self.address_encode(&hash160(&script), AddressKind::P2SH)
  }

  pub fn private_key_to_wif(&self, _private_key: &[u8]) -> Result<String, AppError> {
    Err(AppError::Decode("WIF encoding is not supported for ETP".to_string()))
  }

  pub fn wif_to_private_key(&self, _wif: &str) -> Result<Vec<u8>, AppError> {
    Err(AppError::Decode("WIF decoding is not supported for ETP".to_string()))
  }
}
