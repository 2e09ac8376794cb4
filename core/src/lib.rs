pub mod aggregator;
pub mod probe;
pub mod report;
pub mod scanner;
pub mod scheduler;
