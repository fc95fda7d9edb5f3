//! Canonical 44-byte PCM WAV header.
//!
//! Agent audio is written as it streams in, so the total length is never known
//! when the header is produced. Both size fields (`RIFF` chunk size and `data`
//! chunk size) are therefore written as zero placeholders.

/// Length of the canonical PCM WAV header in bytes.
pub const HEADER_LEN: usize = 44;

/// Size of the PCM `fmt ` subchunk body.
const PCM_FMT_CHUNK_SIZE: u32 = 16;
/// Audio format code for uncompressed PCM.
const PCM_FORMAT: u16 = 1;

/// Why a [`WavSpec`] cannot be written as a header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WavError {
    #[error("Byte rate of {sample_rate} Hz x {channels} channels x {bits_per_sample} bits does not fit in 32 bits")]
    ByteRateOverflow {
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    },
    #[error("Block align of {channels} channels x {bits_per_sample} bits does not fit in 16 bits")]
    BlockAlignOverflow { channels: u16, bits_per_sample: u16 },
}

/// PCM stream parameters described by a WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            bits_per_sample: 16,
            channels: 1,
        }
    }
}

impl WavSpec {
    pub fn new(sample_rate: u32, bits_per_sample: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            bits_per_sample,
            channels,
        }
    }

    /// Bytes per second of audio: `sample_rate * channels * bits_per_sample / 8`.
    pub fn byte_rate(&self) -> Result<u32, WavError> {
        let byte_rate = u64::from(self.sample_rate)
            * u64::from(self.channels)
            * u64::from(self.bits_per_sample / 8);
        u32::try_from(byte_rate).map_err(|_| WavError::ByteRateOverflow {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        })
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> Result<u16, WavError> {
        let block_align = u32::from(self.channels) * u32::from(self.bits_per_sample / 8);
        u16::try_from(block_align).map_err(|_| WavError::BlockAlignOverflow {
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        })
    }

    /// Checks that every derived header field fits its width.
    pub fn validate(&self) -> Result<(), WavError> {
        self.byte_rate()?;
        self.block_align()?;
        Ok(())
    }
}

/// Builds the 44-byte little-endian header for `spec`.
pub fn header(spec: &WavSpec) -> Result<[u8; HEADER_LEN], WavError> {
    let byte_rate = spec.byte_rate()?;
    let block_align = spec.block_align()?;
    let mut header = [0u8; HEADER_LEN];

    header[0..4].copy_from_slice(b"RIFF");
    // 4..8 stays zero: total size is unknown for a streaming write.
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&PCM_FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
    header[22..24].copy_from_slice(&spec.channels.to_le_bytes());
    header[24..28].copy_from_slice(&spec.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&spec.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    // 40..44 stays zero: data length is unknown for a streaming write.

    Ok(header)
}
