//! Timed repeated queries.
//!
//! A [`Sampler`] runs a fixed number of cycles against an [`Instrument`],
//! aiming for one cycle per `cadence`. Cycle `i` is nominally due at
//! `i * cadence` after the start:
//!
//! ```text
//! cadence  |<------ 50ms ----->|<------ 50ms ----->|<------ 50ms ----->|
//! cycle    [q 20ms]  sleep 30  [q 80ms ..................][q 20ms] ...
//! result   Some(v)             None (overran)             Some(v)
//! ```
//!
//! A cycle that finishes inside its slot yields `Some(value)` and the
//! sampler sleeps for the rest of the slot. A cycle that uses up its whole
//! slot yields `None`, even if it produced a value, and the next cycle
//! starts at once. The result always has exactly `count` entries.
//!
//! A failing cycle (transport, timeout or decode error) aborts the whole
//! run.

use std::time::Duration;

use tokio::time::Instant;

use crate::decode::{DecoderRegistry, MessageDecodable, MessageDecoder};
use crate::error::{DecodeError, Result};
use crate::instrument::Instrument;
use crate::transport::Transport;

/// Default time between the starts of two cycles.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(25);

/// Repeated reads at a fixed cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    count: usize,
    cadence: Duration,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(1, DEFAULT_CADENCE)
    }
}

/// What a single cycle does before decoding.
#[derive(Debug, Clone, Copy)]
enum Cycle<'a> {
    /// Write the command, then read.
    Query(&'a str),
    /// Read only.
    Read,
}

impl Sampler {
    /// Creates a sampler taking `count` samples, one per `cadence`.
    ///
    /// A zero cadence runs the cycles back to back and never drops a value.
    #[must_use]
    pub const fn new(count: usize, cadence: Duration) -> Self {
        Self { count, cadence }
    }

    /// Sets the number of samples.
    #[must_use]
    pub const fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Sets the cadence.
    #[must_use]
    pub const fn cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Returns the number of samples.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.count
    }

    /// Returns the cadence.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.cadence
    }

    /// Queries `command` once per cycle and decodes each response as `V`.
    pub async fn sample<T, V>(
        &self,
        instrument: &mut Instrument<T>,
        command: &str,
    ) -> Result<Vec<Option<V>>>
    where
        T: Transport,
        V: MessageDecodable,
    {
        self.run(instrument, Cycle::Query(command), V::decode_in)
            .await
    }

    /// Queries `command` once per cycle and decodes each response with
    /// `decoder`.
    pub async fn sample_with<T, D>(
        &self,
        instrument: &mut Instrument<T>,
        command: &str,
        decoder: &D,
    ) -> Result<Vec<Option<D::Output>>>
    where
        T: Transport,
        D: MessageDecoder,
    {
        self.run(instrument, Cycle::Query(command), |_, message| {
            decoder.decode(message).map_err(Into::into)
        })
        .await
    }

    /// Writes `command` once, then reads and decodes one response per cycle.
    ///
    /// Nothing is written when `count` is zero.
    pub async fn sample_reads<T, V>(
        &self,
        instrument: &mut Instrument<T>,
        command: &str,
    ) -> Result<Vec<Option<V>>>
    where
        T: Transport,
        V: MessageDecodable,
    {
        if self.count == 0 {
            return Ok(Vec::new());
        }
        instrument.write(command).await?;
        self.run(instrument, Cycle::Read, V::decode_in).await
    }

    /// Writes `command` once, then reads one response per cycle and decodes
    /// it with `decoder`.
    pub async fn sample_reads_with<T, D>(
        &self,
        instrument: &mut Instrument<T>,
        command: &str,
        decoder: &D,
    ) -> Result<Vec<Option<D::Output>>>
    where
        T: Transport,
        D: MessageDecoder,
    {
        if self.count == 0 {
            return Ok(Vec::new());
        }
        instrument.write(command).await?;
        self.run(instrument, Cycle::Read, |_, message| {
            decoder.decode(message).map_err(Into::into)
        })
        .await
    }

    async fn run<T, V, F>(
        &self,
        instrument: &mut Instrument<T>,
        cycle: Cycle<'_>,
        decode: F,
    ) -> Result<Vec<Option<V>>>
    where
        T: Transport,
        F: Fn(&DecoderRegistry, &str) -> std::result::Result<V, DecodeError>,
    {
        let mut samples = Vec::with_capacity(self.count);

        for index in 0..self.count {
            let start = Instant::now();

            let message = match cycle {
                Cycle::Query(command) => instrument.exchange(command).await?,
                Cycle::Read => instrument.receive().await?,
            };
            let value = decode(instrument.registry(), &message)?;

            if self.cadence.is_zero() {
                samples.push(Some(value));
                continue;
            }

            let elapsed = start.elapsed();
            match self.cadence.checked_sub(elapsed) {
                Some(remaining) if !remaining.is_zero() => {
                    samples.push(Some(value));
                    if index + 1 < self.count {
                        tokio::time::sleep(remaining).await;
                    }
                }
                _ => {
                    tracing::debug!(
                        "sample {} overran its slot: {:?} >= {:?}",
                        index,
                        elapsed,
                        self.cadence
                    );
                    samples.push(None);
                }
            }
        }

        Ok(samples)
    }
}
