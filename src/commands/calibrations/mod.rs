pub mod record_calibration_command;

pub use record_calibration_command::RecordCalibrationCommand;
