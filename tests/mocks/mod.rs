pub mod mock_list_api;

pub use mock_list_api::*;
