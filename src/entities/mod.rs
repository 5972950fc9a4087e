pub mod calibration;
pub mod equipment;
pub mod job;
pub mod notification;
