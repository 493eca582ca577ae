pub mod report;
pub mod result;
