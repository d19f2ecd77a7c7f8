pub use bytes::Bytes;

mod builder;
mod cursor;
mod dtoa;
mod error;
mod reader;
mod scratch;
mod tag;
mod value;
mod visit;

pub mod bson;
pub mod cbor;
pub mod json;
pub mod json_lines;
pub mod msgpack;
pub mod ubjson;

#[cfg(feature = "serde")]
mod de;
#[cfg(feature = "serde")]
mod ser;

pub use builder::*;
pub use cursor::*;
pub use error::*;
pub use scratch::*;
pub use tag::*;
pub use value::*;
pub use visit::*;
