//! Decode property suite
//!
//! One module per externally observable guarantee of the decoder and index.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test decode_properties
//!
//! # Only the randomized checks
//! cargo test --test decode_properties prop_
//! ```

mod common;

mod bounded_beam;
mod canonical_collision;
mod degenerate_length;
mod legality;
mod permutation_invariance;
mod round_trip;
