use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::types::AppError;

/// Lenient amount parsing: empty or malformed input counts as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    let raw = raw.trim();
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(raw).unwrap_or(Decimal::ZERO)
}

/// Moves the decimal point: `shift(10, -8) == 0.0000001`.
/// Fails when `|exp|` is past the 28 digit precision or the result overflows.
pub fn shift(value: Decimal, exp: i32) -> Result<Decimal, AppError> {
    if exp == 0 {
        return Ok(value);
    }
    let factor = Decimal::try_from_i128_with_scale(1, exp.unsigned_abs())
        .map_err(|e| AppError::Decode(format!("can not shift by {} places: {}", exp, e)))?;
    let shifted = if exp < 0 {
        value.checked_mul(factor)
    } else {
        value.checked_div(factor)
    };
    shifted.ok_or_else(|| AppError::Decode(format!("{} shifted by {} places overflows", value, exp)))
}

fn precision(decimals: u32) -> Result<i32, AppError> {
    i32::try_from(decimals).map_err(|_| AppError::Decode(format!("unsupported precision {}", decimals)))
}

/// Canonical decimal string without trailing zeros.
pub fn amount_to_string(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Integer units rendered in whole coins.
pub fn format_units(raw: &str, decimals: u32) -> Result<String, AppError> {
    let coins = shift(parse_amount(raw), -precision(decimals)?)?;
    Ok(amount_to_string(coins))
}

/// Whole coins to integer units, truncating anything below one unit.
pub fn parse_units(amount: Decimal, decimals: u32) -> Result<String, AppError> {
    let units = shift(amount, precision(decimals)?)?;
    Ok(amount_to_string(units.trunc()))
}

fn sha256_hex(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

pub fn gen_contract_id(symbol: &str, address: &str) -> String {
    sha256_hex(&format!("{}_{}", symbol, address))
}

pub fn gen_tx_input_sid(source_tx_id: &str, symbol: &str, contract_id: &str, index: u64) -> String {
    sha256_hex(&format!("input_{}_{}_{}_{}", source_tx_id, index, symbol, contract_id))
}

pub fn gen_tx_output_sid(tx_id: &str, symbol: &str, contract_id: &str, index: u64) -> String {
    sha256_hex(&format!("output_{}_{}_{}_{}", tx_id, index, symbol, contract_id))
}

pub fn gen_transaction_wxid(tx_id: &str, symbol: &str, contract_id: &str) -> String {
    sha256_hex(&format!("{}_{}_{}", tx_id, symbol, contract_id))
}
