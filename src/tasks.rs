// Evaluation building blocks, leaf modules first
pub mod bins;
pub mod dataset;
pub mod figures;
pub mod report;
pub mod speedup;
pub mod stats;
