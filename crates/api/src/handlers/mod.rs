pub mod beep;
pub mod catalogue;
pub mod project;
pub mod task;
