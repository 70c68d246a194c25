//! Statistical reduction of redundant calibration reads.
//!
//! Each (pixel, channel) position was sampled `lines` times; glitch reads
//! land low, so the lowest third of every column is discarded and the rest
//! averaged. Only the lowest third ever needs to be sorted.

/// Collapse a raw calibration buffer of `lines` rows into one u16 per
/// (pixel, channel) position.
///
/// `raw` is row-major: `lines` rows of `positions` samples. Samples are
/// little-endian u16 when `bytes_per_channel == 2`, otherwise a single byte
/// shifted into the high byte. Quadratic in `lines`, which stays small and
/// runs once per calibration.
pub fn sort_and_average(
    raw: &[u8],
    lines: usize,
    positions: usize,
    bytes_per_channel: usize,
) -> Vec<u16> {
    if lines == 0 {
        return vec![0; positions];
    }

    let row_stride = positions * bytes_per_channel;
    let sample = |line: usize, pos: usize| -> u16 {
        let at = line * row_stride + pos * bytes_per_channel;
        if bytes_per_channel == 2 {
            u16::from_le_bytes([raw[at], raw[at + 1]])
        } else {
            (raw[at] as u16) << 8
        }
    };

    let drop = lines / 3;
    let mut column = vec![0u16; lines];
    let mut out = Vec::with_capacity(positions);

    for pos in 0..positions {
        for (line, slot) in column.iter_mut().enumerate() {
            *slot = sample(line, pos);
        }

        // Partial selection sort: only the lowest `drop` values need their
        // final place, everything behind them is averaged regardless of
        // order.
        for i in 0..drop {
            for j in i + 1..lines {
                if column[j] < column[i] {
                    column.swap(i, j);
                }
            }
        }

        let kept = &column[drop..];
        let sum: u64 = kept.iter().map(|&v| v as u64).sum();
        out.push((sum / kept.len() as u64) as u16);
    }

    out
}
