//! Labeled frame generation.
//!
//! [`FrameGenerator`] emits exactly `normal_target + injected_target`
//! frames. Each call picks injected or normal traffic with a fair coin
//! while both classes still have budget; once one class is exhausted the
//! rest of the run is the other class.

use crate::error::ConfigError;
use crate::frame::{CanFrame, Label};
use crate::signal::{sample, SignalKind, SignalTable};
use crate::timestamp::{Clock, Timing};
use crate::DATA_LENGTH;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Default number of normal frames.
pub const DEFAULT_NORMAL_TARGET: u64 = 3_347_013;
/// Default number of injected frames.
pub const DEFAULT_INJECTED_TARGET: u64 = 491_847;
/// Lowest default injected identifier, just above the vehicle table.
pub const DEFAULT_INJECTED_ID_MIN: u32 = 0x206;
/// Highest default injected identifier.
pub const DEFAULT_INJECTED_ID_MAX: u32 = 0x2FF;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of frames labeled normal.
    pub normal_target: u64,
    /// Number of frames labeled injected.
    pub injected_target: u64,
    /// Lowest injected identifier (inclusive).
    pub injected_id_min: u32,
    /// Highest injected identifier (inclusive).
    pub injected_id_max: u32,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Timestamp source.
    #[serde(default)]
    pub timing: Timing,
    /// Legitimate traffic sources.
    pub signals: SignalTable,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            normal_target: DEFAULT_NORMAL_TARGET,
            injected_target: DEFAULT_INJECTED_TARGET,
            injected_id_min: DEFAULT_INJECTED_ID_MIN,
            injected_id_max: DEFAULT_INJECTED_ID_MAX,
            seed: None,
            timing: Timing::WallClock,
            signals: SignalTable::vehicle(),
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both class targets.
    pub fn with_targets(mut self, normal: u64, injected: u64) -> Self {
        self.normal_target = normal;
        self.injected_target = injected;
        self
    }

    /// Set the injected identifier range (inclusive).
    pub fn with_injected_ids(mut self, min: u32, max: u32) -> Self {
        self.injected_id_min = min;
        self.injected_id_max = max;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set timestamp source.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Replace the signal table.
    pub fn with_signals(mut self, signals: SignalTable) -> Self {
        self.signals = signals;
        self
    }

    /// Total frames in a run, saturating at `u64::MAX`.
    ///
    /// [`validate`](Self::validate) rejects targets whose sum overflows.
    pub fn total_target(&self) -> u64 {
        self.normal_target.saturating_add(self.injected_target)
    }

    /// Check the configuration can produce a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normal_target.checked_add(self.injected_target).is_none() {
            return Err(ConfigError::TargetOverflow {
                normal_target: self.normal_target,
                injected_target: self.injected_target,
            });
        }

        if self.normal_target > 0 && self.signals.is_empty() {
            return Err(ConfigError::EmptySignalTable {
                normal_target: self.normal_target,
            });
        }
        self.signals.validate()?;

        if self.injected_target > 0 {
            let (min, max) = (self.injected_id_min, self.injected_id_max);
            if min > max {
                return Err(ConfigError::InvalidInjectedRange { min, max });
            }
            if let Some(id) = self.signals.ids().into_iter().find(|id| (min..=max).contains(id)) {
                return Err(ConfigError::InjectedRangeOverlap { id, min, max });
            }
        }

        Ok(())
    }
}

/// Frames emitted so far in each class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Frames labeled normal.
    pub normal: u64,
    /// Frames labeled injected.
    pub injected: u64,
}

impl RunCounters {
    /// Frames emitted in total.
    pub fn total(&self) -> u64 {
        self.normal + self.injected
    }

    /// Count for one label.
    pub fn get(&self, label: Label) -> u64 {
        match label {
            Label::Normal => self.normal,
            Label::Injected => self.injected,
        }
    }
}

/// Stateful generator for one run.
pub struct FrameGenerator<R = StdRng> {
    config: GeneratorConfig,
    signals: Vec<(u32, SignalKind)>,
    counters: RunCounters,
    rng: R,
    clock: Clock,
}

impl FrameGenerator<StdRng> {
    /// Create a generator seeded from `config.seed`, or from entropy when unset.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> FrameGenerator<R> {
    /// Create a generator drawing from the given random source.
    pub fn with_rng(config: GeneratorConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            signals: config.signals.iter().map(|s| (s.id, s.kind)).collect(),
            clock: Clock::from(config.timing),
            counters: RunCounters::default(),
            config,
            rng,
        })
    }

    /// Configuration of this run.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Current counters.
    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Frames still to be emitted.
    pub fn remaining(&self) -> u64 {
        self.config.total_target() - self.counters.total()
    }

    /// Check if both targets are reached.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Produce the next frame, or `None` once both targets are reached.
    pub fn next_frame(&mut self) -> Option<CanFrame> {
        let counters = self.counters;
        let inject = counters.injected < self.config.injected_target
            && (counters.normal >= self.config.normal_target || self.rng.gen::<f64>() < 0.5);

        let label = if inject {
            Label::Injected
        } else if counters.normal < self.config.normal_target {
            Label::Normal
        } else {
            return None;
        };

        let timestamp = self.clock.now();
        let frame = match label {
            Label::Injected => {
                let (id, data) = self.injected_payload();
                self.counters.injected += 1;
                CanFrame::new(timestamp, id, data, label)
            }
            Label::Normal => {
                let (id, data) = self.normal_payload();
                self.counters.normal += 1;
                CanFrame::new(timestamp, id, data, label)
            }
        };

        Some(frame)
    }

    /// Out-of-table identifier with random bytes.
    fn injected_payload(&mut self) -> (u32, [u8; DATA_LENGTH as usize]) {
        let id = self
            .rng
            .gen_range(self.config.injected_id_min..=self.config.injected_id_max);
        let mut data = [0u8; DATA_LENGTH as usize];
        for byte in data.iter_mut() {
            *byte = self.rng.gen();
        }
        (id, data)
    }

    /// Table identifier with its sampled payload.
    fn normal_payload(&mut self) -> (u32, [u8; DATA_LENGTH as usize]) {
        let (id, kind) = self.signals[self.rng.gen_range(0..self.signals.len())];
        (id, sample(&kind, &mut self.rng))
    }
}

impl<R: Rng> Iterator for FrameGenerator<R> {
    type Item = CanFrame;

    fn next(&mut self) -> Option<CanFrame> {
        self.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl<R: Rng> FusedIterator for FrameGenerator<R> {}
