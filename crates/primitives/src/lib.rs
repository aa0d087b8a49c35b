#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/aptpca-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod asset;
pub use asset::{Symbol, anonymous_symbols};

mod factor;
pub use factor::{FactorName, FactorSeries, FactorSet};

mod panel;
pub use panel::{CrossSectionalPanel, PanelError};

mod shrinkage;
pub use shrinkage::ShrinkageWeight;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
