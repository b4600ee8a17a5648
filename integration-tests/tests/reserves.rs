use approx::assert_relative_eq;
use integration_tests::{activate, leg_model};
use sinew_components::{ExcitationController, create_coordinate_actuator_set};
use sinew_core::{Coordinate, Lifecycle, Model};

fn gait_model() -> Model {
    let mut model = leg_model();
    for coordinate in [
        Coordinate::new("pelvis_tx").with_locked(true),
        Coordinate::new("pelvis_ty").with_locked(true),
        Coordinate::new("knee_angle_r_beta").with_constrained(true),
    ] {
        model.add_coordinate(coordinate).unwrap();
    }
    model
}

#[test]
fn one_reserve_per_free_coordinate() {
    let mut model = gait_model();
    let total = model.coordinates().len();
    let restricted = model
        .coordinates()
        .iter()
        .filter(|c| c.is_locked_or_constrained())
        .count();

    let reserves = create_coordinate_actuator_set(&mut model, 250.0, false).unwrap();
    assert_eq!(reserves.len(), total - restricted);
    assert_eq!(model.num_actuators(), 3);
    assert!(model.actuators().all(|a| a.optimal_force() == 250.0));

    let all = create_coordinate_actuator_set(&mut model, 1.0, true).unwrap();
    assert_eq!(all.len(), total);
}

#[test]
fn reserves_are_evaluated_after_reconnecting() {
    let mut model = gait_model();
    model.remove_controller("emg").unwrap();
    create_coordinate_actuator_set(&mut model, 10.0, false).unwrap();
    model
        .add_controller(
            ExcitationController::new("reserve_drive")
                .with_actuator("hip_flexion_r_actuator")
                .with_actuator("/forceset/ankle_angle_r_actuator"),
        )
        .unwrap();
    assert_eq!(model.phase(), Lifecycle::Configured);

    let mut state = activate(&mut model);
    model
        .set_controller_inputs(&mut state, "reserve_drive", vec![0.5, -1.0])
        .unwrap();
    model.realize_forces(&mut state).unwrap();

    assert_relative_eq!(state.mobility_forces()[0], 5.0);
    assert_eq!(state.mobility_forces()[1], 0.0);
    assert_relative_eq!(state.mobility_forces()[2], -10.0);
    assert_eq!(&state.mobility_forces()[3..], &[0.0, 0.0, 0.0]);
}

#[test]
fn stale_controllers_fail_to_connect_after_reserves_replace_actuators() {
    let mut model = gait_model();
    create_coordinate_actuator_set(&mut model, 1.0, false).unwrap();

    let errors = model.connect().unwrap_err();
    assert_eq!(errors.errors().len(), 1);
    assert_eq!(model.lifecycle("emg").unwrap(), Lifecycle::Configured);
}
