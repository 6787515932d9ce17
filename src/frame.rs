//! CAN frame records
//!
//! This module defines the labeled record written to a dataset:
//! - [`Label`]: ground truth, normal (`R`) or injected (`T`)
//! - [`CanFrame`]: timestamp, identifier, length, payload and label
//!
//! It also owns the row format: one frame maps to exactly
//! [`ROW_FIELDS`] text fields.

use crate::timestamp::Timestamp;
use crate::DATA_LENGTH;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fields in a dataset row: timestamp, id, length, 8 bytes, label
pub const ROW_FIELDS: usize = 3 + DATA_LENGTH as usize + 1;

/// Ground-truth classification of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Legitimate traffic from the signal table
    #[serde(rename = "R")]
    Normal,
    /// Injected frame with an out-of-table identifier
    #[serde(rename = "T")]
    Injected,
}

impl Label {
    /// Single-letter tag used in the dataset
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "R",
            Label::Injected => "T",
        }
    }

    /// Parse a dataset tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "R" => Some(Label::Normal),
            "T" => Some(Label::Injected),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labeled CAN frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// When the frame was generated
    pub timestamp: Timestamp,
    /// CAN identifier
    pub id: u32,
    /// Data length code, always [`DATA_LENGTH`] for generated frames
    pub dlc: u8,
    /// Payload bytes
    pub data: [u8; DATA_LENGTH as usize],
    /// Ground truth
    pub label: Label,
}

impl CanFrame {
    /// Create a frame with the fixed data length
    pub fn new(timestamp: Timestamp, id: u32, data: [u8; DATA_LENGTH as usize], label: Label) -> Self {
        Self {
            timestamp,
            id,
            dlc: DATA_LENGTH,
            data,
            label,
        }
    }

    /// Check if the frame is labeled as injected
    pub fn is_injected(&self) -> bool {
        self.label == Label::Injected
    }

    /// Render the dataset row
    ///
    /// Identifier in uppercase hex without prefix or padding, length in
    /// decimal, each byte as two uppercase hex digits.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(ROW_FIELDS);
        row.push(self.timestamp.to_string());
        row.push(format!("{:X}", self.id));
        row.push(self.dlc.to_string());
        row.extend(self.data.iter().map(|b| format!("{:02X}", b)));
        row.push(self.label.as_str().to_string());
        row
    }

    /// Parse a dataset row
    pub fn from_row<'a, I>(fields: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() != ROW_FIELDS {
            return Err(format!(
                "expected {} fields, found {}",
                ROW_FIELDS,
                fields.len()
            ));
        }

        let timestamp: Timestamp = fields[0].parse().map_err(|e| format!("{}", e))?;
        if !is_hex(fields[1]) {
            return Err(format!("invalid identifier {:?}", fields[1]));
        }
        let id = u32::from_str_radix(fields[1], 16)
            .map_err(|_| format!("invalid identifier {:?}", fields[1]))?;
        let dlc: u8 = fields[2]
            .parse()
            .map_err(|_| format!("invalid length {:?}", fields[2]))?;
        if dlc != DATA_LENGTH {
            return Err(format!("length {} does not match {} payload bytes", dlc, DATA_LENGTH));
        }

        let mut data = [0u8; DATA_LENGTH as usize];
        for (slot, field) in data.iter_mut().zip(&fields[3..3 + DATA_LENGTH as usize]) {
            if field.len() != 2 || !is_hex(field) {
                return Err(format!("invalid payload byte {:?}", field));
            }
            *slot = u8::from_str_radix(field, 16)
                .map_err(|_| format!("invalid payload byte {:?}", field))?;
        }

        let tag = fields[ROW_FIELDS - 1];
        let label = Label::from_tag(tag).ok_or_else(|| format!("unknown label {:?}", tag))?;

        Ok(Self {
            timestamp,
            id,
            dlc,
            data,
            label,
        })
    }
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}
