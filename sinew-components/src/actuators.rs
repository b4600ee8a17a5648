mod coordinate_actuator;
mod reserves;

pub use coordinate_actuator::CoordinateActuator;
pub use reserves::create_coordinate_actuator_set;
