pub mod register_equipment_command;

pub use register_equipment_command::RegisterEquipmentCommand;
