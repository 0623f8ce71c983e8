pub mod worker;

pub use worker::{ArrayWorker, EXP_THREAD_THRESHOLD, MUL_THREAD_THRESHOLD, log2c};
