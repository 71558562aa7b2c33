pub mod error;
pub mod feedback;
pub mod identity;
pub mod router;
pub mod service;
pub mod summary;

pub type PagenoteResult<T> = std::result::Result<T, error::PagenoteError>;
