use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Uint128};

use crate::error::AllocatorError;

/// Reward pool per epoch, in display units.
pub const DEFAULT_POOL_SIZE: u128 = 450_000;

/// ION uses 18 decimals.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Primary allocations at or below this many display units are dropped.
pub const DEFAULT_DUST_THRESHOLD: u64 = 1;

/// Desync voters receive this percentage of their proportional reward.
pub const DEFAULT_DESYNC_DISCOUNT_PERCENT: u64 = 20;

#[cw_serde]
pub struct AllocationParams {
    /// Total reward pool in display units, e.g. `450000`.
    pub pool_size: Decimal,
    pub token_decimals: u32,
    /// Rewards must be strictly greater than this to be kept.
    pub dust_threshold: Decimal,
    /// Multiplier applied to desync rewards, in (0, 1].
    pub desync_discount: Decimal,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            pool_size: Decimal::from_ratio(DEFAULT_POOL_SIZE, 1u128),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            dust_threshold: Decimal::from_ratio(DEFAULT_DUST_THRESHOLD, 1u64),
            desync_discount: Decimal::percent(DEFAULT_DESYNC_DISCOUNT_PERCENT),
        }
    }
}

impl AllocationParams {
    pub fn validate(&self) -> Result<(), AllocatorError> {
        if self.token_decimals > Decimal::DECIMAL_PLACES {
            return Err(invalid(
                "token_decimals",
                format!(
                    "{} exceeds the supported {} decimal places",
                    self.token_decimals,
                    Decimal::DECIMAL_PLACES
                ),
            ));
        }
        if self.pool_size.is_zero() {
            return Err(invalid("pool_size", "must be positive".to_string()));
        }
        if self.desync_discount.is_zero() || self.desync_discount > Decimal::one() {
            return Err(invalid(
                "desync_discount",
                format!("{} is outside (0, 1]", self.desync_discount),
            ));
        }
        Ok(())
    }

    /// Pool size in the token's smallest unit.
    ///
    /// `Decimal` stores `value * 10^18` in its atomics, so the pool is the
    /// atomics scaled down by the difference in decimal places. Fractions
    /// below the token's precision are truncated. Does not run [`validate`].
    ///
    /// [`validate`]: Self::validate
    pub fn pool_raw(&self) -> Result<Uint128, AllocatorError> {
        let shift = Decimal::DECIMAL_PLACES
            .checked_sub(self.token_decimals)
            .ok_or_else(|| {
                invalid(
                    "token_decimals",
                    format!("{} exceeds {}", self.token_decimals, Decimal::DECIMAL_PLACES),
                )
            })?;
        let divisor = Uint128::new(10u128.pow(shift));
        Ok(self.pool_size.atomics() / divisor)
    }

    /// Convert a raw token amount to display units.
    pub fn to_display(&self, raw: Uint128) -> Result<Decimal, AllocatorError> {
        Ok(Decimal::from_atomics(raw, self.token_decimals)?)
    }
}

fn invalid(name: &str, reason: String) -> AllocatorError {
    AllocatorError::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}
