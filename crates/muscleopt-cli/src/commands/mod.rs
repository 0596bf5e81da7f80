pub mod names;
pub mod run;
pub mod setup;
