pub mod backup;
pub mod core;
pub mod session;
pub mod students;
