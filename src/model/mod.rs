pub mod attendance;
pub mod department;
pub mod role;
pub mod settings;
pub mod staff;
