pub mod cors;
pub mod error_handler;
pub mod request_id;

pub use cors::{cors_layer, cors_layer_with_config, USER_ID_HEADER};
pub use error_handler::handle_not_found;
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
