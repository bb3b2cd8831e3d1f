mod params;
mod request;
mod response;
mod version;

pub use jsonrpc_types::{Error, ErrorCode, Id};
pub use serde_json::{Map, Value};

pub use self::params::Params;
pub use self::request::Request;
pub use self::response::{Failure, Response, Success};
pub use self::version::Version;
