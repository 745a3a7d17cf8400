//! Converts the per-subsystem error types from `shadowdb-write` and
//! `shadowdb-retrieval` into the aggregated `ShadowDbError`. Manual
//! functions rather than `From` impls — neither error type nor
//! `ShadowDbError` is local to this crate, so a blanket trait impl isn't
//! available under the orphan rule.

use shadowdb_core::errors::ShadowDbError;
use shadowdb_retrieval::SearchError;
use shadowdb_write::WriteOpError;

pub fn from_write_error(e: WriteOpError) -> ShadowDbError {
    match e {
        WriteOpError::Invalid(inner) => ShadowDbError::Write(inner),
        WriteOpError::Backend(inner) => ShadowDbError::Backend(inner),
    }
}

pub fn from_search_error(e: SearchError) -> ShadowDbError {
    match e {
        SearchError::Retrieval(inner) => ShadowDbError::Retrieval(inner),
        SearchError::Embedding(inner) => ShadowDbError::Embedding(inner),
        SearchError::Backend(inner) => ShadowDbError::Backend(inner),
    }
}
