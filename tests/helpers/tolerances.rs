//! Comparison tolerances for decoded audio.

/// Float WAV data survives decoding exactly, up to rounding.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// One 16-bit quantization step.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;
