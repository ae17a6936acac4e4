use collision_core::codes::{generate, SLICES_PER_FRAME};
use collision_core::detector::{count_collisions, ClusterRule, CollisionCount};
use collision_core::receiver::ReceptionModel;
use collision_core::test_helpers::{fixed_secrets, single_slice_trace, trace_from_codes};
use collision_core::SimulationConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn one_frame_disclosure_heard_once_is_a_match() {
    let disclosure = fixed_secrets().expand(1);
    let first_code = disclosure.codes()[0];
    let trace = single_slice_trace(SLICES_PER_FRAME, 0, vec![first_code]);

    let count = count_collisions(&disclosure, &trace, ClusterRule::new(1, 1));
    assert_eq!(count, CollisionCount { collisions: 1, matches: 1 });

    let count = count_collisions(&disclosure, &trace, ClusterRule::new(2, 1));
    assert_eq!(count, CollisionCount { collisions: 1, matches: 0 });
}

#[test]
fn receiver_near_the_discloser_for_a_whole_burst_matches() {
    // The receiver heard the disclosure itself for the first two frames.
    let disclosure = fixed_secrets().expand(4);
    let slices = (0..disclosure.len())
        .map(|index| (index < 2 * SLICES_PER_FRAME).then(|| vec![disclosure.codes()[index], 7]))
        .collect();
    let trace = trace_from_codes(slices);

    let count = count_collisions(&disclosure, &trace, ClusterRule::new(4, 8));
    assert_eq!(count.collisions, 16);
    // windows starting at slices 13, 14 and 15 hold fewer than four collisions
    assert_eq!(count.matches, 13);
}

#[test]
fn independent_streams_rarely_collide() {
    let config = SimulationConfig::default()
        .with_epoch_length(24)
        .with_reception_profile(vec![0.0, 0.0, 0.0, 1.0])
        .with_cluster_rule(2, 8);
    let mut rng = StdRng::seed_from_u64(2024);

    let trace = config.reception_model().simulate(&mut rng).unwrap();
    assert_eq!(trace.len(), config.slices_per_epoch());

    let mut total = CollisionCount::default();
    for _ in 0..20 {
        let disclosure = generate(&mut rng, config.epoch_length).unwrap();
        total += count_collisions(&disclosure, &trace, config.cluster_rule());
    }
    // 20 disclosures x 192 slices x 3 codes against a 2^32 code space
    assert!(total.collisions <= 1);
    assert_eq!(total.matches, 0);
}

#[test]
fn trace_length_tracks_epoch_length() {
    let profile = [0.5, 1.0];
    let mut rng = StdRng::seed_from_u64(8);
    for epoch_length in [0, 1, 17] {
        let trace = ReceptionModel::new(epoch_length, &profile, 3)
            .simulate(&mut rng)
            .unwrap();
        assert_eq!(trace.len(), epoch_length * SLICES_PER_FRAME);
    }
}
