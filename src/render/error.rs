//! Errors raised while binding values to parts

use thiserror::Error;

/// A value that no part of the mounted template can accept
///
/// A bind error aborts the render call. Parts check their whole input before
/// mutating, so the failing slot keeps its previous content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("{part} slot expects {expected}, got {found}")]
    WrongType {
        part: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("list item {index} is a {found}; lists hold only null, strings and templates")]
    InvalidListItem { index: usize, found: &'static str },

    #[error("template has {expected} slots but {found} values were supplied")]
    ValueCount { expected: usize, found: usize },
}
