pub mod bins;
pub mod enrichment;

pub use bins::{classify, is_contaminating};
pub use enrichment::{enrichment_for, Enrichment, DEFAULT_ENRICHMENT};
