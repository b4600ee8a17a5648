//! Controllers producing actuator controls.

mod excitation;
mod prescribed;
mod synergy;

pub use excitation::ExcitationController;
pub use prescribed::PrescribedController;
pub use synergy::SynergyController;
