//! Multi-query decoding
//!
//! Queries share nothing but the read-only index and the oracle, so they
//! decode in parallel on the rayon pool.

use crate::decoder::{DecodeResponse, Decoder};
use crate::oracle::Oracle;
use rayon::prelude::*;
use setcode_core::Result;

impl<'a, O> Decoder<'a, O>
where
    O: Oracle,
    O::Query: Sized,
{
    /// Decode every query, returning one result per query in input order
    ///
    /// A failing query does not affect the others.
    pub fn decode_batch(&self, queries: &[O::Query]) -> Vec<Result<DecodeResponse>> {
        let results: Vec<Result<DecodeResponse>> =
            queries.par_iter().map(|query| self.decode(query)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::debug!(
            target: "setcode::decode",
            queries = queries.len(),
            failed,
            "Batch decode finished"
        );
        results
    }
}
