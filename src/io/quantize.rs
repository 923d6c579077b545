#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Signed integer sample width, resolved at configuration time.
///
/// Blocks store `i32` values regardless of the selected width; quantization
/// scales into the format's range, so an `Int16` stream never produces a
/// value outside ±32767. Dispatch is a plain match - no compile-time
/// genericity over the sample type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    Int16,
    Int24,
    Int32,
}

impl SampleFormat {
    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::Int16 => 16,
            SampleFormat::Int24 => 24,
            SampleFormat::Int32 => 32,
        }
    }

    /// Largest representable amplitude: 2^(bits-1) - 1.
    pub fn max_amplitude(self) -> f64 {
        match self {
            SampleFormat::Int16 => 32_767.0,
            SampleFormat::Int24 => 8_388_607.0,
            SampleFormat::Int32 => 2_147_483_647.0,
        }
    }

    /// Clip to [-1, 1], then scale by the maximum representable value.
    #[inline]
    pub fn quantize(self, sample: f64) -> i32 {
        (clip(sample, 1.0) * self.max_amplitude()) as i32
    }

    /// Map a quantized value back to [-1, 1] for a floating-point device
    /// stream.
    #[inline]
    pub fn dequantize(self, sample: i32) -> f32 {
        (f64::from(sample) / self.max_amplitude()) as f32
    }
}

impl Default for SampleFormat {
    fn default() -> Self {
        SampleFormat::Int32
    }
}

/// Symmetric hard clip to ±`max`.
#[inline]
pub fn clip(sample: f64, max: f64) -> f64 {
    if sample >= 0.0 {
        sample.min(max)
    } else {
        sample.max(-max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_is_symmetric() {
        assert_eq!(clip(1.7, 1.0), 1.0);
        assert_eq!(clip(-1.7, 1.0), -1.0);
        assert_eq!(clip(0.25, 1.0), 0.25);
        assert_eq!(clip(-0.25, 1.0), -0.25);
    }

    #[test]
    fn quantize_scales_to_full_range() {
        assert_eq!(SampleFormat::Int16.quantize(1.0), 32_767);
        assert_eq!(SampleFormat::Int16.quantize(-1.0), -32_767);
        assert_eq!(SampleFormat::Int24.quantize(1.0), 8_388_607);
        assert_eq!(SampleFormat::Int32.quantize(1.0), 2_147_483_647);
        assert_eq!(SampleFormat::Int32.quantize(0.0), 0);
    }

    #[test]
    fn quantize_clips_out_of_range_input() {
        // An overdriven mix clips instead of wrapping.
        assert_eq!(SampleFormat::Int16.quantize(3.2), 32_767);
        assert_eq!(SampleFormat::Int16.quantize(-3.2), -32_767);
    }

    #[test]
    fn dequantize_inverts_quantize_within_tolerance() {
        for format in [SampleFormat::Int16, SampleFormat::Int24, SampleFormat::Int32] {
            for &value in &[0.0, 0.5, -0.5, 0.999, -0.999] {
                let round_tripped = f64::from(format.dequantize(format.quantize(value)));
                let step = 1.0 / format.max_amplitude();
                assert!(
                    (round_tripped - value).abs() < step + 1e-6,
                    "{format:?} lost more than one step on {value}"
                );
            }
        }
    }
}
