use std::thread;

use approx::assert_relative_eq;
use integration_tests::{activate, knee_model, leg_model};
use proptest::prelude::*;

#[test]
fn interleaved_contexts_keep_their_own_results() {
    let mut model = knee_model();
    let mut a = activate(&mut model);
    let mut b = a.clone();
    a.set_time(0.0);
    b.set_time(1.0);

    model.realize_controls(&mut a).unwrap();
    model.realize_controls(&mut b).unwrap();
    model.realize_forces(&mut a).unwrap();
    model.realize_forces(&mut b).unwrap();

    let knee = model.actuator("knee_actuator").unwrap();
    assert_eq!(knee.force(&a), 0.0);
    assert_relative_eq!(knee.force(&b), 20.0);

    // Re-evaluating A after B reuses A's cache and leaves both untouched.
    assert!(model.realize_forces(&mut a).unwrap().reused_cache);
    assert_eq!(knee.force(&a), 0.0);
    assert_relative_eq!(knee.force(&b), 20.0);
}

#[test]
fn overrides_stay_in_their_context() {
    let mut model = knee_model();
    let mut a = activate(&mut model);
    let mut b = a.clone();
    a.set_time(0.5);
    b.set_time(0.5);

    model.set_override(&mut a, "knee_actuator", Some(1.0)).unwrap();
    model.realize_forces(&mut a).unwrap();
    model.realize_forces(&mut b).unwrap();

    let knee = model.actuator("knee_actuator").unwrap();
    assert!(knee.is_overridden(&a));
    assert!(!knee.is_overridden(&b));
    assert_eq!(knee.force(&a), 1.0);
    assert_relative_eq!(knee.force(&b), 10.0);
}

#[test]
fn one_model_serves_many_threads() {
    let mut model = leg_model();
    let seed = activate(&mut model);
    let model = &model;

    let results: Vec<Vec<f64>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let mut state = seed.clone();
                scope.spawn(move || {
                    let excitation = f64::from(i) * 0.25;
                    model
                        .set_controller_inputs(&mut state, "emg", vec![excitation; 3])
                        .unwrap();
                    model.realize_forces(&mut state).unwrap();
                    state.mobility_forces().to_vec()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, forces) in results.iter().enumerate() {
        let excitation = i as f64 * 0.25;
        assert_relative_eq!(forces[0], excitation * 100.0);
        assert_relative_eq!(forces[1], excitation * 50.0);
        assert_relative_eq!(forces[2], excitation * 20.0);
    }
}

proptest! {
    #[test]
    fn evaluation_order_does_not_matter(t_a in 0.0..1.0f64, t_b in 0.0..1.0f64) {
        let mut model = knee_model();
        let seed = activate(&mut model);

        let mut alone = seed.clone();
        alone.set_time(t_a);
        model.realize_forces(&mut alone).unwrap();

        let mut a = seed.clone();
        let mut b = seed;
        a.set_time(t_a);
        b.set_time(t_b);
        model.realize_controls(&mut b).unwrap();
        model.realize_controls(&mut a).unwrap();
        model.realize_forces(&mut b).unwrap();
        model.realize_forces(&mut a).unwrap();

        prop_assert_eq!(a.forces(), alone.forces());
        prop_assert_eq!(a.mobility_forces(), alone.mobility_forces());
        prop_assert!((b.forces()[0] - 20.0 * t_b).abs() < 1e-9);
    }
}
