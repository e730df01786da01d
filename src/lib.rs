pub mod api;
pub mod bidding;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock_ssp;
pub mod model;
pub mod openrtb;

pub use bidding::MichaoAdapter;
pub use error::{AdapterError, Result};
