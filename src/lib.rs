pub mod completion;
pub mod config;
pub mod liveness;
pub mod persona;
pub mod relay;
pub mod supervisor;
pub mod telegram_log;
