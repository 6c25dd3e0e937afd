pub mod apply;
pub mod config;
pub mod fit;
pub mod measure;
pub mod options;
pub mod overlaps;
pub mod run;
