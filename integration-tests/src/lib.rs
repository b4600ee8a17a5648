//! Shared fixtures for the cross-crate scenario tests.

use sinew_components::{
    ControlFunction, CoordinateActuator, ExcitationController, InterpolationOrder,
    PrescribedController,
};
use sinew_core::{Coordinate, Dynamics, Model, State};

/// A single-joint model: `knee_angle_r` driven by `knee_actuator`
/// (optimal force 10) through a prescribed linear ramp from 0 at `t = 0`
/// to 2 at `t = 1`.
#[must_use]
pub fn knee_model() -> Model {
    let mut model = Model::new("knee");
    model
        .add_coordinate(Coordinate::new("knee_angle_r"))
        .expect("fresh coordinate path");
    model
        .add_actuator(CoordinateActuator::new("knee_actuator", "knee_angle_r").with_optimal_force(10.0))
        .expect("fresh actuator path");

    let mut controller = PrescribedController::new("gait").with_actuator("knee_actuator");
    controller.bind("knee_actuator", ramp(0.0, 2.0));
    model.add_controller(controller).expect("fresh controller path");
    model
}

/// A three-coordinate leg with one actuator per coordinate and an
/// externally driven controller over all of them.
#[must_use]
pub fn leg_model() -> Model {
    let mut model = Model::new("leg");
    for (coordinate, actuator, optimal_force) in [
        ("hip_flexion_r", "hip_actuator", 100.0),
        ("knee_angle_r", "knee_actuator", 50.0),
        ("ankle_angle_r", "ankle_actuator", 20.0),
    ] {
        model
            .add_coordinate(Coordinate::new(coordinate))
            .expect("fresh coordinate path");
        model
            .add_actuator(CoordinateActuator::new(actuator, coordinate).with_optimal_force(optimal_force))
            .expect("fresh actuator path");
    }
    model
        .add_controller(
            ExcitationController::new("emg")
                .with_actuator("hip_actuator")
                .with_actuator("knee_actuator")
                .with_actuator("ankle_actuator"),
        )
        .expect("fresh controller path");
    model
}

/// A linear ramp over `t` in `[0, 1]`.
#[must_use]
pub fn ramp(start: f64, end: f64) -> ControlFunction {
    ControlFunction::new(vec![0.0, 1.0], vec![start, end], InterpolationOrder::Linear)
        .expect("valid samples")
}

/// Connects, creates the system and returns a fresh context.
pub fn activate(model: &mut Model) -> State {
    model.connect().expect("every element connects");
    model.create_system().expect("model is connected");
    model.init_state().expect("system is created")
}

/// A dynamics engine that keeps every hand-off it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<(f64, Vec<f64>)>,
}

impl Dynamics for Recorder {
    fn apply_mobility_forces(&mut self, time: f64, forces: &[f64]) {
        self.calls.push((time, forces.to_vec()));
    }
}
