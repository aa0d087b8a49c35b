#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/aptpca-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod extractor;
pub use extractor::{ExtractionSummary, FactorExtraction, FactorExtractor, FactorSummary};

mod model;
pub use model::{ExtractorConfig, FactorModel, extract_factors};

mod rolling;
pub use rolling::{RollingConfig, RollingExtractor, WindowExtraction};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use aptpca_primitives::{CrossSectionalPanel, ShrinkageWeight};
    pub use aptpca_traits::DataProvider;

    pub use super::{ExtractorConfig, FactorExtraction, FactorModel, ModelError, extract_factors};
}
