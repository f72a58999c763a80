mod as_value;
mod builder;
mod column;
mod compiler;
mod dialect;
mod engine;
mod error;
mod executor;
mod generic_dialect;
mod query;
mod record;
mod registry;
mod table;
mod tag;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use builder::*;
pub use column::*;
pub use compiler::*;
pub use dialect::*;
pub use engine::*;
pub use error::*;
pub use executor::*;
pub use generic_dialect::*;
pub use query::*;
pub use record::*;
pub use registry::*;
pub use table::*;
pub use tag::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
