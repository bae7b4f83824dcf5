pub mod admin;
pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod prescription;

pub use admin::*;
pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use prescription::*;
