// Property tests over randomly generated scenarios.

use proptest::prelude::*;
use slice_scheduler::packet::PacketRef;
use slice_scheduler::transmission::TransmissionModel;
use slice_scheduler::verifier::{Verifier, Violation};
use slice_scheduler::{Outcome, Scenario, Scheduler, SchedulerConfig, SliceSpec};
use std::collections::BTreeSet;

fn slice_strategy() -> impl Strategy<Value = SliceSpec> {
    (
        0.1f64..5.0,
        100u64..100_000,
        prop::collection::vec((0u64..500, 1u64..20_000), 0..15),
    )
        .prop_map(|(bandwidth_gbps, max_delay_ns, gaps)| {
            let mut arrival = 0;
            let packets = gaps
                .into_iter()
                .map(|(gap, size)| {
                    arrival += gap;
                    (arrival, size)
                })
                .collect();
            SliceSpec {
                bandwidth_gbps,
                max_delay_ns,
                packets,
            }
        })
}

fn scenario_strategy() -> impl Strategy<Value = Scenario> {
    (
        prop::sample::select(vec![1.0, 2.5, 10.0, 40.0]),
        prop::collection::vec(slice_strategy(), 1..5),
    )
        .prop_map(|(port_bandwidth_gbps, slices)| Scenario {
            port_bandwidth_gbps,
            slices,
        })
}

fn run(scenario: &Scenario) -> Outcome {
    Scheduler::from_scenario(scenario, &SchedulerConfig::default())
        .unwrap()
        .run()
}

proptest! {
    #[test]
    fn every_packet_is_committed_or_missed(scenario in scenario_strategy()) {
        let outcome = run(&scenario);
        prop_assert_eq!(outcome.committed() + outcome.missed.len(), scenario.packet_count());

        let committed: BTreeSet<PacketRef> = outcome
            .log
            .iter()
            .map(|e| PacketRef::new(e.slice_id, e.packet_id))
            .collect();
        let missed: BTreeSet<PacketRef> = outcome
            .missed
            .iter()
            .map(|m| PacketRef::new(m.slice_id, m.packet_id))
            .collect();
        prop_assert_eq!(committed.len(), outcome.committed());
        prop_assert_eq!(missed.len(), outcome.missed.len());
        prop_assert!(committed.is_disjoint(&missed));
    }

    #[test]
    fn slices_commit_a_prefix_in_order(scenario in scenario_strategy()) {
        let outcome = run(&scenario);
        let mut next = vec![0usize; scenario.slices.len()];
        for entry in &outcome.log {
            prop_assert_eq!(entry.packet_id, next[entry.slice_id]);
            next[entry.slice_id] += 1;
        }
        for missed in &outcome.missed {
            prop_assert!(missed.packet_id >= next[missed.slice_id]);
        }
    }

    #[test]
    fn port_transmits_one_packet_at_a_time(scenario in scenario_strategy()) {
        let outcome = run(&scenario);
        let model = TransmissionModel::from_gbps(scenario.port_bandwidth_gbps).unwrap();
        let mut port_free = 0;
        for entry in &outcome.log {
            let packet = outcome.packet(PacketRef::new(entry.slice_id, entry.packet_id));
            let tx = outcome.transmission(entry).unwrap();
            prop_assert!(tx.start >= port_free);
            prop_assert!(tx.start >= packet.arrival_time);
            prop_assert_eq!(tx.end, entry.end_time);
            prop_assert_eq!(tx.duration(), model.transmission_time(packet.size_bits));
            port_free = tx.end;
        }
    }

    #[test]
    fn runs_are_deterministic(scenario in scenario_strategy()) {
        let first = run(&scenario);
        let second = run(&scenario);
        prop_assert_eq!(first.log, second.log);
        prop_assert_eq!(first.missed, second.missed);
    }

    #[test]
    fn verifier_finds_no_ordering_faults(scenario in scenario_strategy()) {
        let outcome = run(&scenario);
        let verification = Verifier::new(Default::default()).verify_outcome(&outcome);
        for violation in &verification.violations {
            prop_assert!(
                matches!(
                    violation,
                    Violation::MissingPacket { .. } | Violation::BandwidthShortfall { .. }
                ),
                "unexpected violation: {}",
                violation
            );
        }
        let missing = verification
            .violations
            .iter()
            .filter(|v| matches!(v, Violation::MissingPacket { .. }))
            .count();
        prop_assert_eq!(missing, outcome.missed.len());
    }
}
