use sinew_core::{ActuatorIndex, Model, ModelError};
use tracing::debug;

use super::CoordinateActuator;

/// Replaces a model's actuators with one reserve actuator per coordinate.
///
/// Each reserve is a [`CoordinateActuator`] named `<coordinate>_actuator`,
/// registered under `/forceset` and bound to its coordinate by absolute path.
/// Locked and constrained coordinates are skipped unless
/// `include_locked_and_constrained` is set.
///
/// The model returns to [`Lifecycle::Configured`](sinew_core::Lifecycle::Configured)
/// and must be connected again.
///
/// # Errors
///
/// Returns [`ModelError::DuplicatePath`] if two eligible coordinates share a
/// name, since their reserves would share a path. Reserves added before the
/// clash stay in the model.
///
/// # Examples
///
/// ```
/// use sinew_components::create_coordinate_actuator_set;
/// use sinew_core::{Coordinate, Model};
///
/// let mut model = Model::new("leg");
/// model.add_coordinate(Coordinate::new("hip_flexion_r")).unwrap();
/// model.add_coordinate(Coordinate::new("pelvis_tx").with_locked(true)).unwrap();
///
/// let reserves = create_coordinate_actuator_set(&mut model, 1.0, false).unwrap();
/// assert_eq!(reserves.len(), 1);
/// assert_eq!(model.record_labels(), vec!["hip_flexion_r_actuator"]);
/// ```
pub fn create_coordinate_actuator_set(
    model: &mut Model,
    optimal_force: f64,
    include_locked_and_constrained: bool,
) -> Result<Vec<ActuatorIndex>, ModelError> {
    let topology = model.topology();
    let eligible: Vec<(String, String)> = topology
        .coordinate_indices()
        .filter_map(|index| {
            let coordinate = topology.coordinate(index)?;
            if coordinate.is_locked_or_constrained() && !include_locked_and_constrained {
                return None;
            }
            let path = topology.coordinate_path(index)?;
            Some((format!("{}_actuator", coordinate.name()), path.to_string()))
        })
        .collect();

    model.clear_actuators();

    let reserves = eligible
        .into_iter()
        .map(|(name, coordinate)| {
            let reserve = CoordinateActuator::new(name, coordinate).with_optimal_force(optimal_force);
            model.add_actuator(reserve)
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        model = model.name(),
        reserves = reserves.len(),
        skipped = model.coordinates().len() - reserves.len(),
        "created coordinate actuator set"
    );
    Ok(reserves)
}
