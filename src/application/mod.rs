pub mod ports;
pub mod services;
pub mod use_cases;
pub mod workers;

// Re-export commonly used items
pub use services::*;
pub use use_cases::*;
