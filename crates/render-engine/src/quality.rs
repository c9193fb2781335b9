//! Target bitrate policy.

use vidsplice_common::config::QualityPreset;

/// Bits per second granted per output pixel, and the ceiling, for a preset.
pub fn bitrate_model(preset: QualityPreset) -> (f64, u64) {
    match preset {
        QualityPreset::Low => (0.1, 1_000_000),
        QualityPreset::Medium => (0.2, 2_500_000),
        QualityPreset::High => (0.4, 8_000_000),
    }
}

/// Encoder bitrate for `pixel_count` output pixels: linear in resolution,
/// capped per preset.
pub fn target_bitrate(preset: QualityPreset, pixel_count: u64) -> u64 {
    let (coefficient, cap) = bitrate_model(preset);
    let linear = (pixel_count as f64 * coefficient).floor() as u64;
    linear.min(cap)
}
