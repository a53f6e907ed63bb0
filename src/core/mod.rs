pub mod callback;
pub mod constants;
pub mod engine;
pub mod geo;
pub mod map;
pub mod options;
