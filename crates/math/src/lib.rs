#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/aptpca-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod moment;
pub use moment::{MomentMatrix, MomentMatrixBuilder};

mod shrinkage;
pub use shrinkage::{GrandMean, MeanOuterProduct};

mod eigen;
pub use eigen::{EigenConfig, EigenDecomposition, Eigendecomposer};

mod validate;
pub use validate::{Validator, check_finite};

mod error;
pub use error::{ErrorKind, MathError};
