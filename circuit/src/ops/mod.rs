//! Reusable gadget templates for the graph builder.

pub mod bits;
pub mod cmp;
pub mod mimc;

pub use bits::BitGadgets;
pub use cmp::CmpGadgets;
pub use mimc::{MIMC_ROUNDS, MimcGadgets, reference_feistel, reference_sponge, round_constants};
