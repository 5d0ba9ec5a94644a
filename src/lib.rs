pub mod calendar;
pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod locale;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod score;
pub mod util;
