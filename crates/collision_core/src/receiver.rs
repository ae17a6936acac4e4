//! Synthetic reception traces.
//!
//! A receiver alternates between bursts. At the start of each burst it draws
//! the burst length and how many transmitters are in range, then records the
//! codes of that many transmitters for every slice of the burst.

use rand::Rng;

use crate::codes::{generate, SliceCodeStream, SLICES_PER_FRAME};
use crate::error::SimulationError;

/// Codes heard by one receiver during one slice, in transmitter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedDuringSlice {
    codes: Vec<u32>,
}

impl ReceivedDuringSlice {
    pub fn new(codes: Vec<u32>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Number of received copies of `code`.
    pub fn occurrences(&self, code: u32) -> usize {
        self.codes.iter().filter(|&&received| received == code).count()
    }
}

/// Everything one receiver heard across an epoch; `None` marks a silent slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceptionTrace {
    slices: Vec<Option<ReceivedDuringSlice>>,
}

impl ReceptionTrace {
    pub fn from_slices(slices: Vec<Option<ReceivedDuringSlice>>) -> Self {
        Self { slices }
    }

    pub fn slices(&self) -> &[Option<ReceivedDuringSlice>] {
        &self.slices
    }

    pub fn received_at(&self, slice_index: usize) -> Option<&ReceivedDuringSlice> {
        self.slices.get(slice_index).and_then(Option::as_ref)
    }

    /// Copies of `code` heard at `slice_index`; zero for silent or out-of-range slices.
    pub fn occurrences_at(&self, slice_index: usize, code: u32) -> usize {
        self.received_at(slice_index)
            .map_or(0, |received| received.occurrences(code))
    }

    /// Slices in which at least one transmitter was heard.
    pub fn active_slices(&self) -> usize {
        self.slices.iter().filter(|slice| slice.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Parameters of the burst/profile proximity model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceptionModel<'a> {
    /// Frames per epoch.
    pub epoch_length: usize,
    /// Ascending cumulative thresholds; index `i` means `i` transmitters in range.
    pub reception_profile: &'a [f64],
    /// Longest burst, in slices.
    pub max_burst_period: usize,
}

impl<'a> ReceptionModel<'a> {
    pub fn new(epoch_length: usize, reception_profile: &'a [f64], max_burst_period: usize) -> Self {
        Self {
            epoch_length,
            reception_profile,
            max_burst_period,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.reception_profile.is_empty() {
            return Err(SimulationError::InvalidProfile(
                "reception profile must contain at least one entry".to_string(),
            ));
        }
        if self.max_burst_period == 0 {
            return Err(SimulationError::InvalidConfig(
                "receptionMaxBurstPeriod must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Most transmitters that can be in range at once.
    pub fn max_transmitters(&self) -> usize {
        self.reception_profile.len().saturating_sub(1)
    }

    /// Build one receiver's trace, drawing transmitter secrets and burst
    /// decisions from `rng`.
    pub fn simulate<R: Rng>(&self, rng: &mut R) -> Result<ReceptionTrace, SimulationError> {
        self.validate()?;

        // The same transmitters are reused for every burst of this receiver;
        // their codes are independent slice to slice so this does not bias matches.
        let transmitters = (0..self.max_transmitters())
            .map(|_| generate(&mut *rng, self.epoch_length))
            .collect::<Result<Vec<SliceCodeStream>, _>>()?;

        let total_slices = self.epoch_length * SLICES_PER_FRAME;
        let mut slices = Vec::with_capacity(total_slices);
        let mut proximate = 0usize;
        let mut next_decision = 0usize;

        for slice_index in 0..total_slices {
            if slice_index >= next_decision {
                next_decision = slice_index + rng.gen_range(1..=self.max_burst_period);
                let draw: f64 = rng.gen();
                if let Some(count) = select_transmitter_count(self.reception_profile, draw) {
                    proximate = count;
                }
            }

            let received = (proximate > 0).then(|| {
                ReceivedDuringSlice::new(
                    transmitters[..proximate]
                        .iter()
                        .map(|stream| stream.codes()[slice_index])
                        .collect(),
                )
            });
            slices.push(received);
        }

        Ok(ReceptionTrace { slices })
    }
}

/// Smallest index whose threshold is at or above `draw`, or `None` when the
/// draw exceeds every threshold.
pub fn select_transmitter_count(reception_profile: &[f64], draw: f64) -> Option<usize> {
    reception_profile
        .iter()
        .position(|&threshold| draw <= threshold)
}

/// True when the profile ascends and ends at 1.0, so every draw selects a count.
pub fn profile_is_well_formed(reception_profile: &[f64]) -> bool {
    let ascending = reception_profile
        .windows(2)
        .all(|pair| pair[0] <= pair[1]);
    ascending && reception_profile.last().is_some_and(|&last| last >= 1.0)
}
