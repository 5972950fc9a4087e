// Core services
pub mod calibrations;
pub mod equipment;
pub mod jobs;

pub use calibrations::{CalibrationService, DueCalibration};
pub use equipment::EquipmentService;
pub use jobs::JobService;
