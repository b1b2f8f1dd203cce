// Integration tests for the scheduling scenarios: concrete schedules, priority effects,
// starvation and infeasible inputs.

use slice_scheduler::packet::PacketRef;
use slice_scheduler::score::ZeroReason;
use slice_scheduler::verifier::Violation;
use slice_scheduler::{evaluate, MissReason, Scenario, ScheduleEntry, SchedulerConfig};

fn scenario(text: &str) -> Scenario {
    text.parse().expect("scenario should parse")
}

fn entry(end_time: u64, slice_id: usize, packet_id: usize) -> ScheduleEntry {
    ScheduleEntry {
        end_time,
        slice_id,
        packet_id,
    }
}

#[test]
fn single_slice_two_packets_back_to_back() {
    let evaluation = evaluate(
        &scenario("1 10\n2 1 1000\n0 1000 0 1000\n"),
        &SchedulerConfig::default(),
    )
    .unwrap();

    assert_eq!(evaluation.outcome.log, vec![entry(100, 0, 0), entry(200, 0, 1)]);
    assert!(evaluation.outcome.missed.is_empty());
    assert!(evaluation.verification.passed());
    assert_eq!(evaluation.score.satisfied_ratio(), 1.0);
    assert_eq!(evaluation.score.max_delay, 200);
    assert!((evaluation.score.value - (1.0 + 10_000.0 / 200.0)).abs() < 1e-9);
}

#[test]
fn shorter_deadline_wins_the_first_slot() {
    let config = SchedulerConfig::default();

    let tight_second = scenario("2 10\n1 1 5000\n0 1000\n1 1 1000\n0 1000\n");
    let evaluation = evaluate(&tight_second, &config).unwrap();
    assert_eq!(evaluation.outcome.log, vec![entry(100, 1, 0), entry(200, 0, 0)]);

    let tight_first = scenario("2 10\n1 1 1000\n0 1000\n1 1 5000\n0 1000\n");
    let evaluation = evaluate(&tight_first, &config).unwrap();
    assert_eq!(evaluation.outcome.log, vec![entry(100, 0, 0), entry(200, 1, 0)]);
}

#[test]
fn equal_slices_fall_back_to_slice_id() {
    let evaluation = evaluate(
        &scenario("2 10\n1 1 1000\n0 1000\n1 1 1000\n0 1000\n"),
        &SchedulerConfig::default(),
    )
    .unwrap();
    assert_eq!(evaluation.outcome.log, vec![entry(100, 0, 0), entry(200, 1, 0)]);
}

#[test]
fn loose_slice_is_not_starved_by_busy_slice() {
    // Slice 0 offers the full port rate with a tight bound; slice 1 has one packet and a loose bound.
    let arrivals: Vec<String> = (0..20).map(|i| format!("{} 1000", i * 100)).collect();
    let text = format!(
        "2 10\n20 5 500\n{}\n1 0.001 1000000000\n0 1000\n",
        arrivals.join(" ")
    );
    let evaluation = evaluate(&scenario(&text), &SchedulerConfig::default()).unwrap();
    let outcome = &evaluation.outcome;

    assert!(outcome.missed.is_empty(), "{:?}", outcome.missed);
    assert_eq!(outcome.committed(), 21);
    let loose = outcome.packet(PacketRef::new(1, 0));
    assert!(loose.is_scheduled());
    // Once slice 0's fairness term is exhausted, the waiting packet takes the next slot.
    assert_eq!(loose.end_time(), Some(200));
    for packet in outcome.slices[0].packets() {
        assert!(packet.delay().unwrap() <= 500);
    }
    assert!(evaluation.verification.passed());
    assert_eq!(evaluation.score.satisfied_slices, 2);
}

#[test]
fn oversized_packet_is_missed_without_aborting() {
    let evaluation = evaluate(
        &scenario("1 10\n1 1 1000\n0 100000\n"),
        &SchedulerConfig::default(),
    )
    .unwrap();

    assert!(evaluation.outcome.log.is_empty());
    assert_eq!(evaluation.outcome.missed.len(), 1);
    let missed = evaluation.outcome.missed[0];
    assert_eq!((missed.slice_id, missed.packet_id), (0, 0));
    assert_eq!(
        missed.reason,
        MissReason::DeadlineUnattainable {
            projected_delay: 10_000,
            max_delay: 1000
        }
    );
    assert_eq!(evaluation.score.value, 0.0);
    assert!(matches!(
        evaluation.score.zero_reason,
        Some(ZeroReason::IncompleteSchedule { committed: 0, submitted: 1 })
    ));
    assert_eq!(
        evaluation.verification.violations,
        vec![Violation::MissingPacket { slice_id: 0, packet_id: 0 }]
    );
}

#[test]
fn deferral_only_blocks_its_own_slice() {
    // Slice 0 gets stuck on an oversized packet; slice 1 keeps flowing.
    let evaluation = evaluate(
        &scenario("2 10\n2 1 1000\n0 100000 50 1000\n2 1 1000\n0 1000 300 1000\n"),
        &SchedulerConfig::default(),
    )
    .unwrap();
    let outcome = &evaluation.outcome;

    assert_eq!(outcome.log, vec![entry(100, 1, 0), entry(400, 1, 1)]);
    assert_eq!(outcome.missed.len(), 2);
    assert_eq!(
        outcome.missed[1].reason,
        MissReason::BlockedBehindMiss { blocking_packet: 0 }
    );
    assert_eq!(outcome.committed() + outcome.missed.len(), outcome.submitted());
}

#[test]
fn bandwidth_shortfall_is_reported_by_verifier() {
    // Sparse arrivals cannot reach a 5 Gbps guarantee; the relaxed admission floor lets them through.
    let mut config = SchedulerConfig::default();
    config.feasibility.bandwidth_tolerance = 0.01;
    let evaluation = evaluate(&scenario("1 10\n2 5 1000\n0 1000 10000 1000\n"), &config).unwrap();

    assert_eq!(evaluation.outcome.committed(), 2);
    assert!(matches!(
        evaluation.verification.violations.as_slice(),
        [Violation::BandwidthShortfall { slice_id: 0, .. }]
    ));
    assert_eq!(evaluation.score.value, 0.0);
}

#[test]
fn identical_inputs_give_identical_logs() {
    let text = "3 2.5\n3 1 4000\n0 1200 10 800 900 4000\n2 0.5 9000\n5 3000 5 100\n1 1 700\n20 1000\n";
    let config = SchedulerConfig::default();
    let first = evaluate(&scenario(text), &config).unwrap();
    let second = evaluate(&scenario(text), &config).unwrap();
    assert_eq!(first.outcome.log, second.outcome.log);
    assert_eq!(first.outcome.missed, second.outcome.missed);
}

#[test]
fn zero_slice_bandwidth_is_rejected_before_scheduling() {
    let zero_bandwidth = scenario("1 10\n1 0 1000\n0 1000\n");
    let err = evaluate(&zero_bandwidth, &SchedulerConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        slice_scheduler::Error::InvalidSliceBandwidth { slice: 0, .. }
    ));
}

#[test]
fn near_max_packet_sizes_are_scheduled() {
    // Two packets of 1e19 bits: their sum no longer fits in 64 bits.
    let huge = scenario(
        "1 10\n2 0.000001 18446744073709551615\n0 10000000000000000000 0 10000000000000000000\n",
    );
    let evaluation = evaluate(&huge, &SchedulerConfig::default()).unwrap();

    assert_eq!(
        evaluation.outcome.log,
        vec![
            entry(1_000_000_000_000_000_000, 0, 0),
            entry(2_000_000_000_000_000_000, 0, 1)
        ]
    );
    assert!(evaluation.verification.passed());
    assert_eq!(evaluation.score.satisfied_slices, 1);
    let achieved = evaluation.metrics.slices[0].achieved_bps.unwrap();
    assert!((achieved - 1e10).abs() < 1.0);
}
