//! End-to-end tests for the ion-rewards pipeline.
//!
//! These drive the library crates the same way the `ion-rewards` binary
//! does: ledger logs → allocation → CSV snapshots on disk → diff of two
//! snapshots. The ledger is replaced by an in-memory `LogSource`.
//!
//! Run:
//! ```bash
//! cargo test -p ion-rewards-integration-tests
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use cosmwasm_std::{Decimal, Uint128};
use ion_rewards_allocator::{
    allocate_epoch, build_report, tally_by_voter, write_report, AllocationParams, EpochReport,
    RunContext,
};
use ion_rewards_common::{EvmAddress, VoteEvent, VoterKey};
use ion_rewards_differ::{
    diff_files, diff_snapshots, load_snapshot, parse_snapshot, MalformedRowPolicy,
};
use ion_rewards_ledger::logs::{quantity, uint_topic};
use ion_rewards_ledger::{
    event_topic, fetch_vote_events, LedgerError, LogFilter, LogSource, RawLog, VoteQuery,
    DEFAULT_EVENT_SIGNATURE,
};

// ─── Constants ───

const EPOCH: u64 = 1435;
const FROM_BLOCK: u64 = 14_405_098;

/// 10^18, one whole veION / ION.
const UNIT: u128 = 1_000_000_000_000_000_000;

// ─── Helpers ───

fn addr(byte: u8) -> EvmAddress {
    EvmAddress::from_bytes([byte; 20])
}

fn primary_gauge() -> EvmAddress {
    EvmAddress::parse("0x8be11aBd61E07EF9d4551aCdd43bb390E3CE03Bd").unwrap()
}

fn desync_gauge() -> EvmAddress {
    EvmAddress::parse("0x78b7C35d2B8cdFf03971935832DDD2BBc54D8BD0").unwrap()
}

fn params(pool: &str) -> AllocationParams {
    AllocationParams {
        pool_size: Decimal::from_str(pool).unwrap(),
        ..AllocationParams::default()
    }
}

fn vote(voter: u8, gauge: &EvmAddress, power: u128, timestamp: u64) -> VoteEvent {
    VoteEvent {
        timestamp,
        voter: addr(voter),
        voting_power_cast: Uint128::new(power),
        gauge: gauge.clone(),
        transaction_ref: format!("0x{:064x}", timestamp),
        block_number: FROM_BLOCK + timestamp,
        log_index: 0,
    }
}

fn report_for(events: &[VoteEvent], params: &AllocationParams) -> EpochReport {
    let outcome = allocate_epoch(events, &primary_gauge(), &desync_gauge(), params).unwrap();
    let ctx = RunContext {
        epoch: EPOCH,
        primary_gauge: &primary_gauge(),
        desync_gauge: &desync_gauge(),
        events: events.len(),
        unique_voters: tally_by_voter(&primary_gauge(), events).unwrap().len(),
    };
    build_report(&ctx, &outcome).unwrap()
}

fn run_to_dir(dir: &Path, events: &[VoteEvent], params: &AllocationParams) -> EpochReport {
    let report = report_for(events, params);
    write_report(dir, &report).unwrap();
    report
}

/// Log entry JSON as a node would return it.
fn raw_log(voter: &EvmAddress, gauge: &EvmAddress, power: u128, timestamp: u64, block: u64) -> RawLog {
    let data = format!(
        "0x{:064x}{:064x}{:064x}",
        power,
        power * 3,
        timestamp as u128
    );
    serde_json::from_value(serde_json::json!({
        "address": "0x71439ae82068e19ea90e4f506c74936ae170cf58",
        "topics": [
            event_topic(DEFAULT_EVENT_SIGNATURE),
            voter.to_topic(),
            gauge.to_topic(),
            uint_topic(EPOCH),
        ],
        "data": data,
        "blockNumber": quantity(block),
        "transactionHash": format!("0x{:064x}", block),
        "logIndex": "0x0",
        "removed": false
    }))
    .unwrap()
}

struct InMemoryLedger {
    head: u64,
    logs: Vec<RawLog>,
}

impl LogSource for InMemoryLedger {
    fn block_number(&self) -> Result<u64, LedgerError> {
        Ok(self.head)
    }

    fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError> {
        let from = u64::from_str_radix(&filter.from_block[2..], 16).unwrap();
        let to = u64::from_str_radix(&filter.to_block[2..], 16).unwrap();
        let gauge_topic = filter.topics[2].clone().unwrap();
        Ok(self
            .logs
            .iter()
            .filter(|l| {
                let block = u64::from_str_radix(&l.block_number.as_ref().unwrap()[2..], 16).unwrap();
                (from..=to).contains(&block) && l.topics[2] == gauge_topic
            })
            .cloned()
            .collect())
    }
}

fn query(gauge: EvmAddress) -> VoteQuery {
    VoteQuery {
        contract: EvmAddress::parse("0x71439Ae82068E19ea90e4F506c74936aE170Cf58").unwrap(),
        event_signature: DEFAULT_EVENT_SIGNATURE.to_string(),
        gauge,
        epoch: EPOCH,
        from_block: FROM_BLOCK,
        to_block: None,
        block_chunk_size: 50,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ledger_to_snapshot_pipeline() {
    let ledger = InMemoryLedger {
        head: FROM_BLOCK + 200,
        logs: vec![
            raw_log(&addr(0xa), &primary_gauge(), 300 * UNIT, 1_730_000_100, FROM_BLOCK + 10),
            raw_log(&addr(0xb), &primary_gauge(), 700 * UNIT, 1_730_000_050, FROM_BLOCK + 120),
            raw_log(&addr(0xa), &desync_gauge(), 100 * UNIT, 1_730_000_200, FROM_BLOCK + 130),
        ],
    };

    let mut events = fetch_vote_events(&ledger, &query(primary_gauge())).unwrap();
    events.extend(fetch_vote_events(&ledger, &query(desync_gauge())).unwrap());
    assert_eq!(events.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let report = run_to_dir(dir.path(), &events, &params("1000"));

    // Primary snapshot is ordered by vote timestamp: 0xb voted first.
    let snapshot = fs::read_to_string(dir.path().join("epoch_1435.csv")).unwrap();
    let rows: Vec<&str> = snapshot.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with(&format!("1730000050,{}", addr(0xb))));
    assert!(rows[2].starts_with(&format!("1730000100,{}", addr(0xa))));

    let desync = fs::read_to_string(dir.path().join("desync_epoch_1435.csv")).unwrap();
    assert_eq!(
        desync.lines().nth(1).unwrap(),
        format!("{},80,80000000000000000000", addr(0xa))
    );

    assert_eq!(report.summary.total_distribution, Decimal::from_str("1000").unwrap());
    assert_eq!(report.summary.unique_voters, 2);
    assert_eq!(report.summary.events, 3);
}

#[test]
fn test_snapshot_round_trip() {
    let events = vec![
        vote(0xa, &primary_gauge(), 123_456_789 * UNIT / 1000, 30),
        vote(0xb, &primary_gauge(), 987_654_321 * UNIT / 1000, 10),
        vote(0xc, &primary_gauge(), 555_555 * UNIT, 20),
        vote(0xa, &primary_gauge(), 1_000 * UNIT, 40),
    ];
    let p = params("450000");
    let outcome = allocate_epoch(&events, &primary_gauge(), &desync_gauge(), &p).unwrap();
    let report = report_for(&events, &p);

    let snapshot = parse_snapshot(&report.snapshot_csv, MalformedRowPolicy::Abort).unwrap();
    assert_eq!(snapshot.len(), outcome.allocations.len());
    for allocation in &outcome.allocations {
        let record = snapshot.get(&VoterKey::from(&allocation.voter)).unwrap();
        assert_eq!(record.distribution_value, allocation.reward_amount);
        assert_eq!(record.distribution_raw, allocation.reward_amount_raw.to_string());
        assert_eq!(record.voting_power_cast, allocation.voting_power_cast.to_string());
    }
}

#[test]
fn test_percentages_sum_to_at_most_one() {
    let events: Vec<VoteEvent> = (1u8..=40)
        .map(|i| vote(i, &primary_gauge(), (i as u128) * 7_919 * UNIT / 13, i as u64))
        .collect();
    let outcome =
        allocate_epoch(&events, &primary_gauge(), &desync_gauge(), &params("450000")).unwrap();
    let total = outcome
        .allocations
        .iter()
        .fold(Decimal::zero(), |acc, a| acc + a.percentage_of_total);
    assert!(total <= Decimal::one());
    assert!(total > Decimal::from_str("0.99").unwrap());
}

#[test]
fn test_diff_between_two_runs() {
    let dir = tempfile::tempdir().unwrap();
    let prior_dir = dir.path().join("prior");
    let current_dir = dir.path().join("current");

    // A late vote by 0xc dilutes 0xa and 0xb, but the pool also grows.
    let prior_events = vec![
        vote(0xa, &primary_gauge(), 300, 1),
        vote(0xb, &primary_gauge(), 700, 2),
    ];
    let mut current_events = prior_events.clone();
    current_events.push(vote(0xc, &primary_gauge(), 1000, 3));
    current_events.push(vote(0xa, &primary_gauge(), 700, 4));

    run_to_dir(&prior_dir, &prior_events, &params("1000"));
    run_to_dir(&current_dir, &current_events, &params("3000"));

    let output = dir.path().join("increased_votes.csv");
    let records = diff_files(
        &prior_dir.join("epoch_1435.csv"),
        &current_dir.join("epoch_1435.csv"),
        &output,
        MalformedRowPolicy::Abort,
    )
    .unwrap();

    // total 2700: 0xa 1000/2700 * 3000 > 300, 0xb 700/2700 * 3000 > 700,
    // 0xc is new and skipped.
    let voters: Vec<VoterKey> = records.iter().map(|r| r.voter.clone()).collect();
    assert_eq!(
        voters,
        vec![VoterKey::from(&addr(0xa)), VoterKey::from(&addr(0xb))]
    );
    assert_eq!(records[0].prior_distribution, "300");
    assert!(records.iter().all(|r| r.delta > Decimal::zero()));

    let report = fs::read_to_string(&output).unwrap();
    let header = report.lines().next().unwrap();
    assert!(header.contains("ionDistribution1,ionDistribution2,ionDistributionDiff"));
    assert_eq!(report.lines().count(), 3);
}

#[test]
fn test_diff_of_snapshot_with_itself_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let events = vec![
        vote(0xa, &primary_gauge(), 300, 1),
        vote(0xb, &primary_gauge(), 700, 2),
    ];
    run_to_dir(dir.path(), &events, &params("1000"));
    let path = dir.path().join("epoch_1435.csv");

    let a = load_snapshot(&path, MalformedRowPolicy::Abort).unwrap();
    assert!(diff_snapshots(&a, &a).unwrap().is_empty());
}

#[test]
fn test_diff_against_mixed_case_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let header = "timestamp,voter,votingPowerCastForGauge,percentageOfTotalVotingPower,ionDistribution,ionDistributionParsed,totalVotingPowerInGauge,numVotes,tx";
    let prior = dir.path().join("votes.csv");
    let current = dir.path().join("votes2.csv");
    fs::write(
        &prior,
        format!("{header}\n1,0x00000000000000000000000000000000000000AA,1,1,100,0,1,1,0x1\n"),
    )
    .unwrap();
    fs::write(
        &current,
        format!(
            "{header}\n1,0x00000000000000000000000000000000000000aa,1,1,150,0,1,1,0x1\n\
             2,0x00000000000000000000000000000000000000bb,1,1,999,0,1,1,0x2\n"
        ),
    )
    .unwrap();

    let records = diff_files(
        &prior,
        &current,
        &dir.path().join("out.csv"),
        MalformedRowPolicy::Abort,
    )
    .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prior_distribution, "100");
    assert_eq!(records[0].current_distribution, "150");
    assert_eq!(records[0].delta, Decimal::from_str("50").unwrap());
}

#[test]
fn test_diff_with_short_voter_ids() {
    let dir = tempfile::tempdir().unwrap();
    let header = "timestamp,voter,votingPowerCastForGauge,percentageOfTotalVotingPower,ionDistribution,ionDistributionParsed,totalVotingPowerInGauge,numVotes,tx";
    let prior = dir.path().join("votes.csv");
    let current = dir.path().join("votes2.csv");
    let output = dir.path().join("increased_votes.csv");
    fs::write(&prior, format!("{header}\n1,0xA,1,1,100,0,1,1,0x1\n")).unwrap();
    fs::write(
        &current,
        format!("{header}\n1,0xA,1,1,150,0,1,1,0x1\n2,0xB,1,1,70,0,1,1,0x2\n"),
    )
    .unwrap();

    let records = diff_files(&prior, &current, &output, MalformedRowPolicy::Abort).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].voter, VoterKey::new("0xA"));
    assert_eq!(records[0].delta, Decimal::from_str("50").unwrap());
    let report = fs::read_to_string(&output).unwrap();
    assert_eq!(report.lines().nth(1).unwrap(), "1,0xa,1,1,100,150,50,0,1,1,0x1");
}

#[test]
fn test_malformed_snapshot_policy() {
    let dir = tempfile::tempdir().unwrap();
    let events = vec![vote(0xa, &primary_gauge(), 1, 1)];
    run_to_dir(dir.path(), &events, &params("1000"));
    let path = dir.path().join("epoch_1435.csv");
    let mut content = fs::read_to_string(&path).unwrap();
    content.push_str("1,0xshort\n");
    fs::write(&path, content).unwrap();

    assert!(load_snapshot(&path, MalformedRowPolicy::Abort).is_err());
    let lenient = load_snapshot(&path, MalformedRowPolicy::Skip).unwrap();
    assert_eq!(lenient.len(), 1);
    assert_eq!(lenient.skipped(), 1);
}
