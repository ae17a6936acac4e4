//! Test helpers for common test setup and utilities.
//!
//! Shared fixtures for unit tests, integration tests and benchmarks.

use rand::RngCore;

use crate::codes::{EpochSecrets, SECRET_BYTES};
use crate::receiver::{ReceivedDuringSlice, ReceptionTrace};

/// Deterministic secrets: chain value bytes `0..32`, chain key bytes `0xA5`.
pub fn fixed_secrets() -> EpochSecrets {
    let mut initial_chain_value = [0u8; SECRET_BYTES];
    for (index, byte) in initial_chain_value.iter_mut().enumerate() {
        *byte = index as u8;
    }
    EpochSecrets {
        initial_chain_value,
        chain_key: [0xA5; SECRET_BYTES],
    }
}

/// Build a trace from per-slice code lists; `None` is a silent slice.
pub fn trace_from_codes(slices: Vec<Option<Vec<u32>>>) -> ReceptionTrace {
    ReceptionTrace::from_slices(
        slices
            .into_iter()
            .map(|codes| codes.map(ReceivedDuringSlice::new))
            .collect(),
    )
}

/// A trace of `len` slices that is silent except for `codes` at `slice_index`.
///
/// # Panics
///
/// Panics if `slice_index >= len`.
pub fn single_slice_trace(len: usize, slice_index: usize, codes: Vec<u32>) -> ReceptionTrace {
    assert!(slice_index < len, "slice index must fall inside the trace");
    let mut slices = vec![None; len];
    slices[slice_index] = Some(codes);
    trace_from_codes(slices)
}

/// A random source that always fails, standing in for an exhausted entropy pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustedRng;

impl RngCore for ExhaustedRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source exhausted"))
    }
}
