pub mod fields;
pub mod inventory;
pub mod segment;
pub mod status;
