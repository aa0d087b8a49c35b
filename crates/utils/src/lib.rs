#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/aptpca-rs/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod returns;
pub use returns::{ReturnKind, prices_to_returns};

mod provider;
pub use provider::{CsvPanelProvider, FramePanelProvider, ProviderOptions};
