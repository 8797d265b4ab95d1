pub mod admin;
pub mod attendance;
pub mod media;
pub mod settings;
pub mod staff;
