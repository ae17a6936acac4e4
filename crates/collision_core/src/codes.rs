//! Ratcheted slice-code streams.
//!
//! A stream is derived from two 256-bit secrets: an initial chain value and a
//! chain key. Each frame publishes the current chain value as eight
//! little-endian `u32` slice codes, then ratchets the chain value forward with
//! `HMAC-SHA256(chain_key, chain_value)`. Knowing one frame's codes says
//! nothing useful about the next frame's.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::SimulationError;

type HmacSha256 = Hmac<Sha256>;

/// Number of slices (and therefore codes) in one frame.
pub const SLICES_PER_FRAME: usize = 8;

/// Size of each epoch secret in bytes.
pub const SECRET_BYTES: usize = 32;

pub type Secret = [u8; SECRET_BYTES];

/// One slice code per slice of an epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceCodeStream {
    codes: Vec<u32>,
}

impl SliceCodeStream {
    /// Wrap explicit codes, e.g. a disclosure captured elsewhere or a test fixture.
    pub fn from_codes(codes: Vec<u32>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    pub fn code_at(&self, slice_index: usize) -> Option<u32> {
        self.codes.get(slice_index).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// The two secrets a stream is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochSecrets {
    pub initial_chain_value: Secret,
    pub chain_key: Secret,
}

impl EpochSecrets {
    /// Draw both secrets from `rng`, failing if it cannot supply the bytes.
    pub fn draw<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self, SimulationError> {
        let mut initial_chain_value = [0u8; SECRET_BYTES];
        rng.try_fill_bytes(&mut initial_chain_value)?;
        let mut chain_key = [0u8; SECRET_BYTES];
        rng.try_fill_bytes(&mut chain_key)?;

        Ok(Self {
            initial_chain_value,
            chain_key,
        })
    }

    /// Expand the secrets into `epoch_length` frames of slice codes.
    pub fn expand(&self, epoch_length: usize) -> SliceCodeStream {
        let mut codes = Vec::with_capacity(epoch_length * SLICES_PER_FRAME);
        let mut chain_value = self.initial_chain_value;

        for _ in 0..epoch_length {
            codes.extend_from_slice(&frame_codes(&chain_value));
            chain_value = advance_chain(&self.chain_key, &chain_value);
        }

        SliceCodeStream { codes }
    }
}

/// Split a chain value into its eight little-endian slice codes.
pub fn frame_codes(chain_value: &Secret) -> [u32; SLICES_PER_FRAME] {
    let mut codes = [0u32; SLICES_PER_FRAME];
    for (code, word) in codes.iter_mut().zip(chain_value.chunks_exact(4)) {
        *code = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
    }
    codes
}

/// Ratchet a chain value one frame forward.
pub fn advance_chain(chain_key: &Secret, chain_value: &Secret) -> Secret {
    let mut mac =
        HmacSha256::new_from_slice(chain_key).expect("HMAC accepts keys of any length");
    mac.update(chain_value);
    let digest = mac.finalize().into_bytes();

    let mut next = [0u8; SECRET_BYTES];
    next.copy_from_slice(&digest);
    next
}

/// Generate a fresh epoch stream from newly drawn secrets.
pub fn generate<R: RngCore + ?Sized>(
    rng: &mut R,
    epoch_length: usize,
) -> Result<SliceCodeStream, SimulationError> {
    Ok(EpochSecrets::draw(rng)?.expand(epoch_length))
}
