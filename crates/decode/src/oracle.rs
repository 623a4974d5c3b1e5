//! Oracle capability
//!
//! The decoder never scores terms itself. It asks an [`Oracle`] for the
//! next-term distribution of every active hypothesis, once per step, as one
//! batched call.

use setcode_core::{OracleError, TermDistribution, TermId};

/// Step-wise next-term scorer conditioned on a query and a raw prefix
///
/// Implementations must be `Send + Sync`: one oracle may serve many queries
/// decoded in parallel. Errors are fatal for the query that observed them;
/// the decoder does not retry.
pub trait Oracle: Send + Sync {
    /// Opaque query representation
    type Query: ?Sized + Sync;

    /// Log-probabilities of the next term after `prefix`
    ///
    /// `prefix` is the raw emitted sequence in emission order, without any
    /// start token. Terms missing from the result are treated as impossible.
    fn next_term_log_probabilities(
        &self,
        query: &Self::Query,
        prefix: &[TermId],
    ) -> std::result::Result<TermDistribution, OracleError>;

    /// Distributions for every prefix of one decoding step, in input order
    ///
    /// The default calls [`next_term_log_probabilities`] once per prefix.
    /// Override to batch the work (e.g. one forward pass per step).
    ///
    /// [`next_term_log_probabilities`]: Oracle::next_term_log_probabilities
    fn next_term_log_probabilities_batch(
        &self,
        query: &Self::Query,
        prefixes: &[&[TermId]],
    ) -> std::result::Result<Vec<TermDistribution>, OracleError> {
        prefixes
            .iter()
            .map(|prefix| self.next_term_log_probabilities(query, prefix))
            .collect()
    }
}

impl<O: Oracle + ?Sized> Oracle for &O {
    type Query = O::Query;

    fn next_term_log_probabilities(
        &self,
        query: &Self::Query,
        prefix: &[TermId],
    ) -> std::result::Result<TermDistribution, OracleError> {
        (**self).next_term_log_probabilities(query, prefix)
    }

    fn next_term_log_probabilities_batch(
        &self,
        query: &Self::Query,
        prefixes: &[&[TermId]],
    ) -> std::result::Result<Vec<TermDistribution>, OracleError> {
        (**self).next_term_log_probabilities_batch(query, prefixes)
    }
}
