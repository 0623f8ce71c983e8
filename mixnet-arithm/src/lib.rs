pub mod arithm;
pub mod config;
pub mod eio;
pub mod errors;
pub mod util;
