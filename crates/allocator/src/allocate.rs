use std::collections::HashMap;

use cosmwasm_std::{Decimal, Uint128};
use ion_rewards_common::{Allocation, DesyncAllocation, EvmAddress, VoteEvent};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::AllocationParams;
use crate::error::AllocatorError;

/// All of one voter's events for a gauge, folded together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoterTally {
    pub voter: EvmAddress,
    pub voting_power: Uint128,
    pub first_timestamp: u64,
    pub transaction_refs: Vec<String>,
    pub vote_count: u32,
}

/// Primary and desync results for one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochAllocation {
    pub total_voting_power_in_gauge: Uint128,
    pub allocations: Vec<Allocation>,
    pub desync: Vec<DesyncAllocation>,
}

fn events_for<'a>(
    gauge: &'a EvmAddress,
    events: &'a [VoteEvent],
) -> impl Iterator<Item = &'a VoteEvent> + 'a {
    events.iter().filter(move |e| &e.gauge == gauge)
}

/// Sum of voting power cast on `gauge`.
pub fn total_voting_power(
    gauge: &EvmAddress,
    events: &[VoteEvent],
) -> Result<Uint128, AllocatorError> {
    events_for(gauge, events).try_fold(
        Uint128::zero(),
        |acc, e| -> Result<Uint128, AllocatorError> { Ok(acc.checked_add(e.voting_power_cast)?) },
    )
}

/// Fold `gauge` events per voter, in order of each voter's first event.
pub fn tally_by_voter(
    gauge: &EvmAddress,
    events: &[VoteEvent],
) -> Result<Vec<VoterTally>, AllocatorError> {
    let mut index: HashMap<&EvmAddress, usize> = HashMap::new();
    let mut tallies: Vec<VoterTally> = Vec::new();

    for event in events_for(gauge, events) {
        match index.get(&event.voter).copied() {
            Some(i) => {
                let tally = &mut tallies[i];
                tally.voting_power = tally.voting_power.checked_add(event.voting_power_cast)?;
                tally.first_timestamp = tally.first_timestamp.min(event.timestamp);
                tally.transaction_refs.push(event.transaction_ref.clone());
                tally.vote_count += 1;
            }
            None => {
                index.insert(&event.voter, tallies.len());
                tallies.push(VoterTally {
                    voter: event.voter.clone(),
                    voting_power: event.voting_power_cast,
                    first_timestamp: event.timestamp,
                    transaction_refs: vec![event.transaction_ref.clone()],
                    vote_count: 1,
                });
            }
        }
    }

    Ok(tallies)
}

/// `power / total` as a fraction for the report, and the exact floor of
/// `pool_raw * power / total`.
fn share_of_pool(
    power: Uint128,
    total: Uint128,
    pool_raw: Uint128,
) -> Result<(Decimal, Uint128), AllocatorError> {
    let percentage = Decimal::checked_from_ratio(power, total)?;
    let reward_raw = pool_raw.checked_multiply_ratio(power, total)?;
    Ok((percentage, reward_raw))
}

/// Split the reward pool across the voters of `gauge`, one allocation per
/// unique voter, ascending by first vote timestamp.
///
/// Allocations whose reward does not exceed `params.dust_threshold` are
/// dropped. Fails with [`AllocatorError::EmptyGauge`] when nobody voted.
pub fn allocate(
    gauge: &EvmAddress,
    events: &[VoteEvent],
    params: &AllocationParams,
) -> Result<Vec<Allocation>, AllocatorError> {
    params.validate()?;
    let total = total_voting_power(gauge, events)?;
    allocate_primary(gauge, events, total, params.pool_raw()?, params)
}

fn allocate_primary(
    gauge: &EvmAddress,
    events: &[VoteEvent],
    total: Uint128,
    pool_raw: Uint128,
    params: &AllocationParams,
) -> Result<Vec<Allocation>, AllocatorError> {
    if total.is_zero() {
        return Err(AllocatorError::EmptyGauge {
            gauge: gauge.to_string(),
        });
    }

    let mut allocations = Vec::new();
    for tally in tally_by_voter(gauge, events)? {
        let (percentage, reward_raw) = share_of_pool(tally.voting_power, total, pool_raw)?;
        let reward = params.to_display(reward_raw)?;
        if reward <= params.dust_threshold {
            debug!(voter = %tally.voter, %reward, "dropping dust allocation");
            continue;
        }
        allocations.push(Allocation {
            timestamp: tally.first_timestamp,
            voter: tally.voter,
            voting_power_cast: tally.voting_power,
            percentage_of_total: percentage,
            reward_amount: reward,
            reward_amount_raw: reward_raw,
            total_voting_power_in_gauge: total,
            transaction_refs: tally.transaction_refs,
            vote_count: tally.vote_count,
        });
    }

    allocations.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.voter.cmp(&b.voter))
    });
    Ok(allocations)
}

/// Discounted allocations for voters of the desync gauge.
///
/// Each desync voter's power is combined with whatever they retained in the
/// primary allocation and priced against the primary gauge's total, then
/// scaled by `params.desync_discount`. Zero rewards are dropped. Output is
/// ascending by reward.
pub fn allocate_desync(
    desync_gauge: &EvmAddress,
    desync_events: &[VoteEvent],
    primary: &[Allocation],
    primary_total: Uint128,
    params: &AllocationParams,
) -> Result<Vec<DesyncAllocation>, AllocatorError> {
    params.validate()?;
    desync_for(
        desync_gauge,
        desync_events,
        primary,
        primary_total,
        params.pool_raw()?,
        params,
    )
}

fn desync_for(
    desync_gauge: &EvmAddress,
    desync_events: &[VoteEvent],
    primary: &[Allocation],
    primary_total: Uint128,
    pool_raw: Uint128,
    params: &AllocationParams,
) -> Result<Vec<DesyncAllocation>, AllocatorError> {
    if primary_total.is_zero() {
        return Err(AllocatorError::EmptyGauge {
            gauge: desync_gauge.to_string(),
        });
    }

    let primary_power: HashMap<&EvmAddress, Uint128> = primary
        .iter()
        .map(|a| (&a.voter, a.voting_power_cast))
        .collect();

    let mut desync = Vec::new();
    for tally in tally_by_voter(desync_gauge, desync_events)? {
        let retained = primary_power
            .get(&tally.voter)
            .copied()
            .unwrap_or_default();
        let combined = tally.voting_power.checked_add(retained)?;
        let (percentage, full_raw) = share_of_pool(combined, primary_total, pool_raw)?;
        let reward_raw = full_raw.checked_mul_floor(params.desync_discount)?;
        if reward_raw.is_zero() {
            continue;
        }
        desync.push(DesyncAllocation {
            voter: tally.voter,
            combined_voting_power: combined,
            percentage_of_total: percentage,
            reward_amount: params.to_display(reward_raw)?,
            reward_amount_raw: reward_raw,
        });
    }

    desync.sort_by(|a, b| {
        a.reward_amount_raw
            .cmp(&b.reward_amount_raw)
            .then_with(|| a.voter.cmp(&b.voter))
    });
    Ok(desync)
}

/// Run both allocations for one epoch.
pub fn allocate_epoch(
    events: &[VoteEvent],
    primary_gauge: &EvmAddress,
    desync_gauge: &EvmAddress,
    params: &AllocationParams,
) -> Result<EpochAllocation, AllocatorError> {
    params.validate()?;
    let pool_raw = params.pool_raw()?;

    let total = total_voting_power(primary_gauge, events)?;
    info!(gauge = %primary_gauge, %total, "total voting power in gauge");

    let allocations = allocate_primary(primary_gauge, events, total, pool_raw, params)?;
    let desync = desync_for(desync_gauge, events, &allocations, total, pool_raw, params)?;
    info!(
        allocations = allocations.len(),
        desync = desync.len(),
        "epoch allocated"
    );

    Ok(EpochAllocation {
        total_voting_power_in_gauge: total,
        allocations,
        desync,
    })
}

/// Pick up to `count` distinct voters for manual spot checks.
pub fn sample_voters<R: Rng + ?Sized>(
    allocations: &[Allocation],
    count: usize,
    rng: &mut R,
) -> Vec<EvmAddress> {
    let mut voters: Vec<&EvmAddress> = allocations.iter().map(|a| &a.voter).collect();
    voters.sort();
    voters.dedup();
    voters
        .choose_multiple(rng, count)
        .map(|v| (*v).clone())
        .collect()
}
