//! Telemetry packet codec
//!
//! Every notification from a sensor peripheral carries exactly one frame. There
//! is no length prefix, checksum or trailer; the frame ends where the
//! notification ends.
//!
//! ```text
//! +-------------+-----+--------------------+-----+---------------------+
//! | device name | ',' | 14 x u32 BE millis | sep | 84 x i16 BE samples |
//! +-------------+-----+--------------------+-----+---------------------+
//! ```
//!
//! Samples are grouped in packs of six, one pack per timestamp.

use crate::errors::DecodeError;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Number of sample groups (packs) in one packet
pub const PACKS_PER_PACKET: usize = 14;

/// Number of signed samples in one pack
pub const SAMPLES_PER_PACK: usize = 6;

/// Total number of signed samples in one packet
pub const SAMPLES_PER_PACKET: usize = PACKS_PER_PACKET * SAMPLES_PER_PACK;

/// Byte terminating the device name
pub const NAME_DELIMITER: u8 = b',';

const TIMESTAMP_SIZE: usize = 4;
const SAMPLE_SIZE: usize = 2;
const TIMESTAMP_BLOCK: usize = PACKS_PER_PACKET * TIMESTAMP_SIZE;
const SAMPLE_BLOCK: usize = SAMPLES_PER_PACKET * SAMPLE_SIZE;

/// Bytes in a frame besides the device name: delimiter, timestamps, separator, samples
pub const FRAME_OVERHEAD: usize = 1 + TIMESTAMP_BLOCK + 1 + SAMPLE_BLOCK;

/// Exact frame length for a device name of `name_len` bytes
pub const fn frame_len(name_len: usize) -> usize {
    name_len + FRAME_OVERHEAD
}

// ----------------------------------------------------------------------------
// Device Side
// ----------------------------------------------------------------------------

/// Body side a device reports through the last character of its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side encoded by the trailing character of a device name, if any
    pub fn from_device_name(name: &str) -> Option<Side> {
        match name.chars().last() {
            Some('L') => Some(Side::Left),
            Some('R') => Some(Side::Right),
            _ => None,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }
}

// ----------------------------------------------------------------------------
// Packet Types
// ----------------------------------------------------------------------------

/// One decoded notification: a device name and fourteen packs of samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPacket {
    /// Device name as sent by the peripheral; the last character marks the side
    pub device_name: String,
    /// Millisecond timestamps, one per pack
    pub timestamps: [u32; PACKS_PER_PACKET],
    /// Signed samples, six per pack in pack order
    pub samples: [i16; SAMPLES_PER_PACKET],
}

/// One persisted row: a single pack of a packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRow {
    pub device_name: String,
    pub timestamp: u32,
    pub samples: [i16; SAMPLES_PER_PACK],
}

impl CaptureRow {
    /// Render the row as CSV fields in header order
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(2 + SAMPLES_PER_PACK);
        fields.push(self.device_name.clone());
        fields.push(self.timestamp.to_string());
        fields.extend(self.samples.iter().map(|s| s.to_string()));
        fields
    }
}

impl TelemetryPacket {
    /// Decode one notification payload
    ///
    /// The payload must be exactly one frame long. Shorter payloads fail with
    /// [`DecodeError::Truncated`], longer ones with [`DecodeError::TrailingBytes`].
    /// The byte between the timestamp and sample blocks is skipped unchecked.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let name_len = payload
            .iter()
            .position(|&b| b == NAME_DELIMITER)
            .ok_or(DecodeError::NoDelimiter {
                length: payload.len(),
            })?;

        let needed = frame_len(name_len);
        if payload.len() < needed {
            return Err(DecodeError::Truncated {
                needed,
                available: payload.len(),
            });
        }
        if payload.len() > needed {
            return Err(DecodeError::TrailingBytes {
                extra: payload.len() - needed,
            });
        }

        // Latin-1: one byte, one char
        let device_name: String = payload[..name_len].iter().map(|&b| char::from(b)).collect();

        let mut offset = name_len + 1;
        let mut timestamps = [0u32; PACKS_PER_PACKET];
        let timestamp_bytes =
            payload[offset..offset + TIMESTAMP_BLOCK].chunks_exact(TIMESTAMP_SIZE);
        for (slot, chunk) in timestamps.iter_mut().zip(timestamp_bytes) {
            *slot = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        offset += TIMESTAMP_BLOCK + 1;

        let mut samples = [0i16; SAMPLES_PER_PACKET];
        let sample_bytes = payload[offset..offset + SAMPLE_BLOCK].chunks_exact(SAMPLE_SIZE);
        for (slot, chunk) in samples.iter_mut().zip(sample_bytes) {
            *slot = i16::from_be_bytes([chunk[0], chunk[1]]);
        }

        Ok(Self {
            device_name,
            timestamps,
            samples,
        })
    }

    /// Encode the packet into its wire frame
    ///
    /// Name characters outside Latin-1 are written as `?`. A comma inside the
    /// name produces a frame that will not decode back to the same packet.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(frame_len(self.device_name.chars().count()));
        bytes.extend(
            self.device_name
                .chars()
                .map(|c| u8::try_from(c).unwrap_or(b'?')),
        );
        bytes.push(NAME_DELIMITER);
        for timestamp in &self.timestamps {
            bytes.extend_from_slice(&timestamp.to_be_bytes());
        }
        bytes.push(NAME_DELIMITER);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_be_bytes());
        }
        bytes
    }

    /// Side marker carried by the device name
    pub fn side(&self) -> Option<Side> {
        Side::from_device_name(&self.device_name)
    }

    /// Samples of pack `index`, if it exists
    pub fn pack(&self, index: usize) -> Option<&[i16]> {
        if index >= PACKS_PER_PACKET {
            return None;
        }
        let start = index * SAMPLES_PER_PACK;
        Some(&self.samples[start..start + SAMPLES_PER_PACK])
    }

    /// Expand the packet into one row per pack, in pack order
    pub fn rows(&self) -> Vec<CaptureRow> {
        self.timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &timestamp)| {
                let mut samples = [0i16; SAMPLES_PER_PACK];
                samples.copy_from_slice(self.pack(i)?);
                Some(CaptureRow {
                    device_name: self.device_name.clone(),
                    timestamp,
                    samples,
                })
            })
            .collect()
    }
}
