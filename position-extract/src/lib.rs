//! Turns chess game records into sampled, encoded training positions
//! stored as NumPy batches.

pub mod batch_writer;
pub mod board;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod filters;
pub mod npy;
pub mod pipeline;
pub mod replay;
pub mod sampler;
pub mod stats;
pub mod tokenizer;
