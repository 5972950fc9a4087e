pub mod create_job_command;
pub mod return_equipment_command;
pub mod transition_job_command;

pub use create_job_command::CreateJobCommand;
pub use return_equipment_command::{ReturnEquipmentCommand, ReturnOutcome};
pub use transition_job_command::{JobDetailsPatch, TransitionJobCommand, TransitionOutcome};
