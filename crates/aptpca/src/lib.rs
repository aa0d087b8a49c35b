//! # aptpca
//!
//! Arbitrage pricing theory factor extraction.
//!
//! Given a panel of asset returns, aptpca builds a shrinkage-adjusted second-moment
//! matrix, decomposes it with a deterministic symmetric eigensolver and returns the
//! leading factors, their loadings and the share of variance each explains.
//!
//! This crate re-exports the component crates behind feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `traits`: Data provider and shrinkage target traits
//! - `math`: Moment matrix, eigensolver and validation
//! - `model`: Factor extraction pipeline
//! - `utils`: Panel providers and price conversion
//! - `cli`: The `extract` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use aptpca::model::extract_factors;
//! use aptpca::primitives::CrossSectionalPanel;
//!
//! let panel = CrossSectionalPanel::from_returns(returns);
//! let result = extract_factors(&panel, 50.0, 3)?;
//! println!("{:?}", result.variance_explained());
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use aptpca_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use aptpca_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use aptpca_math as math;
#[cfg(feature = "model")]
#[doc(inline)]
pub use aptpca_model as model;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use aptpca_utils as utils;

