/*!
This crate implements the inspection prediction workflow: load the training and test tables, derive structured fields from the raw composite columns, drop rows with unparseable coordinates or missing values, select and encode the features, train a random forest, tune its hyperparameters with an exhaustive grid search ranked by out-of-bag RMSE, characterize the chosen configuration with repeated unseeded fits, and apply the model to the test table to produce per-restaurant probability scores.

Every stage consumes and returns explicit values; nothing is kept in ambient state. The entrypoints are [`run`](fn.run.html) and [`run_predict`](fn.run_predict.html).
*/

#![allow(clippy::tabs_in_doc_comments)]

pub mod artifact;
pub mod config;
pub mod encode;
pub mod filter;
pub mod grid;
pub mod normalize;
pub mod predict;
pub mod progress;
pub mod repeat;
pub mod report;
pub mod select;
pub mod source;
pub mod train;

mod run;

pub use self::artifact::ModelArtifact;
pub use self::progress::Progress;
pub use self::report::RunReport;
pub use self::run::{run, run_predict, PredictOptions, RunOptions};
