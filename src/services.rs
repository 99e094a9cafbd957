pub mod finalizer;
pub mod model_run;
pub mod payload;
pub mod runner;
pub mod stager;
