// examsim: exam question similarity detection.
//
// This is the library root. Each module is one stage of the pipeline or
// the shared plumbing around it.

pub mod cleaning;
pub mod config;
pub mod embedding;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod similarity;
