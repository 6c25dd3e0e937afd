pub mod pairwise;

pub use pairwise::{
    estimate_pair_offset, pixel_correspondence, Correspondence, PairEstimate, PairSide, PairStats,
};
