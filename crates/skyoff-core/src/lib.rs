pub mod consts;
pub mod error;
pub mod fit;
pub mod graph;
pub mod image;
pub mod io;
pub mod measure;
pub mod overlap;
pub mod pipeline;
pub mod stats;
pub mod wcs;
