//! Signal table for legitimate traffic
//!
//! Each known identifier has a [`SignalKind`] describing how its payload is
//! sampled. Only the leading one or two bytes carry a value; the rest of
//! the 8-byte payload is zero.
//!
//! ```rust
//! use canfuzz::signal::{sample, SignalKind};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let kind = SignalKind::Fluctuate { min: 2500, max: 3000 };
//! let payload = sample(&kind, &mut rng);
//! assert!(kind.contains(kind.decode(&payload)));
//! assert!(payload[2..].iter().all(|&b| b == 0));
//! ```

use crate::error::ConfigError;
use crate::DATA_LENGTH;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Payload sampling behavior of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// On/off state, redrawn with 50/50 odds on every frame.
    Toggle,

    /// Uniform integer in `min..=max`, redrawn on every frame.
    ///
    /// Values wider than one byte use two bytes, high byte first.
    Fluctuate { min: u16, max: u16 },
}

impl SignalKind {
    /// Number of leading payload bytes carrying the value.
    pub fn payload_width(&self) -> usize {
        match *self {
            SignalKind::Toggle => 1,
            SignalKind::Fluctuate { max, .. } if max > u8::MAX as u16 => 2,
            SignalKind::Fluctuate { .. } => 1,
        }
    }

    /// Reconstruct the sampled value from a payload.
    pub fn decode(&self, payload: &[u8]) -> u16 {
        match self.payload_width() {
            2 => u16::from_be_bytes([payload[0], payload[1]]),
            _ => payload[0] as u16,
        }
    }

    /// Check whether a value is one this signal can produce.
    pub fn contains(&self, value: u16) -> bool {
        match *self {
            SignalKind::Toggle => value <= 1,
            SignalKind::Fluctuate { min, max } => (min..=max).contains(&value),
        }
    }
}

/// Sample an 8-byte payload for a signal.
pub fn sample<R: Rng + ?Sized>(kind: &SignalKind, rng: &mut R) -> [u8; DATA_LENGTH as usize] {
    let mut data = [0u8; DATA_LENGTH as usize];

    match *kind {
        SignalKind::Toggle => data[0] = toggle(rng),
        SignalKind::Fluctuate { min, max } => {
            let value = fluctuate(min, max, rng);
            if kind.payload_width() == 2 {
                data[..2].copy_from_slice(&value.to_be_bytes());
            } else {
                data[0] = value as u8;
            }
        }
    }

    data
}

/// Uniform value in `min..=max`.
fn fluctuate<R: Rng + ?Sized>(min: u16, max: u16, rng: &mut R) -> u16 {
    rng.gen_range(min..=max)
}

/// 1 (on) or 0 (off) with equal probability.
fn toggle<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    if rng.gen::<f64>() < 0.5 {
        1
    } else {
        0
    }
}

/// A known traffic source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// CAN identifier.
    pub id: u32,
    /// Human-readable name.
    pub name: String,
    /// Payload behavior.
    #[serde(flatten)]
    pub kind: SignalKind,
}

impl Signal {
    /// Create a new signal.
    pub fn new(id: u32, name: &str, kind: SignalKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
        }
    }
}

/// Registry of legitimate identifiers, ordered by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Signal>", into = "Vec<Signal>")]
pub struct SignalTable {
    signals: BTreeMap<u32, Signal>,
}

impl SignalTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            signals: BTreeMap::new(),
        }
    }

    /// Vehicle table: engine and lighting toggles plus powertrain sensors.
    pub fn vehicle() -> Self {
        use SignalKind::*;

        Self::new()
            .with_signal(Signal::new(0x100, "EngineOnOff", Toggle))
            .with_signal(Signal::new(0x101, "FrontLight", Toggle))
            // °C
            .with_signal(Signal::new(0x200, "EngineTempSensor", Fluctuate { min: 80, max: 100 }))
            // ms
            .with_signal(Signal::new(0x201, "InjectorTimingSensor", Fluctuate { min: 60, max: 90 }))
            // %
            .with_signal(Signal::new(0x202, "OxygenSensor", Fluctuate { min: 90, max: 100 }))
            .with_signal(Signal::new(0x203, "FuelTankLevel", Fluctuate { min: 60, max: 80 }))
            .with_signal(Signal::new(0x204, "ThrottlePosition", Fluctuate { min: 40, max: 60 }))
            // RPM
            .with_signal(Signal::new(0x205, "EngineRPM", Fluctuate { min: 2500, max: 3000 }))
    }

    /// Add a signal, replacing any signal with the same identifier.
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.insert(signal);
        self
    }

    /// Add a signal, returning the one it replaced.
    pub fn insert(&mut self, signal: Signal) -> Option<Signal> {
        self.signals.insert(signal.id, signal)
    }

    /// Look up a signal.
    pub fn get(&self, id: u32) -> Option<&Signal> {
        self.signals.get(&id)
    }

    /// Check if an identifier is known.
    pub fn contains(&self, id: u32) -> bool {
        self.signals.contains_key(&id)
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        self.signals.keys().copied().collect()
    }

    /// Iterate over signals in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Number of signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Check every signal's range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for signal in self.iter() {
            if let SignalKind::Fluctuate { min, max } = signal.kind {
                if min > max {
                    return Err(ConfigError::InvalidSignalRange {
                        id: signal.id,
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse a table from JSON (a list of signals).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let table: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidSignalFile(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidSignalFile(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::vehicle()
    }
}

impl From<Vec<Signal>> for SignalTable {
    fn from(signals: Vec<Signal>) -> Self {
        signals
            .into_iter()
            .fold(SignalTable::new(), SignalTable::with_signal)
    }
}

impl From<SignalTable> for Vec<Signal> {
    fn from(table: SignalTable) -> Self {
        table.signals.into_values().collect()
    }
}
