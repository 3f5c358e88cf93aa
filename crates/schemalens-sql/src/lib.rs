//! Dialect-aware SQL generation over the schemalens table model.

mod format;
mod writer;

pub use format::simple_format;
pub use writer::{CURRENT_PAGE_PARAM, PAGE_SIZE_PARAM, PagingStrategy, SqlWriter};
