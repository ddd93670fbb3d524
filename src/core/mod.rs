pub mod cancel;
pub mod errors;
pub mod extract;
pub mod gate;
pub mod group;
pub mod merge;
pub mod models;
pub mod report;
pub mod scheduler;
