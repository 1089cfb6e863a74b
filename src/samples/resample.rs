// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Linear-interpolation sample rate conversion for loaded samples.

/// Rates closer than this are treated as equal.
pub const RATE_TOLERANCE_HZ: f64 = 0.1;

/// Whether audio at `source_rate` must be converted to play at `target_rate`.
pub fn needs_resampling(source_rate: f64, target_rate: f64) -> bool {
    (source_rate - target_rate).abs() > RATE_TOLERANCE_HZ
}

/// The number of samples `len` input samples become at the target rate.
pub fn resampled_length(len: usize, source_rate: f64, target_rate: f64) -> usize {
    if !needs_resampling(source_rate, target_rate) || source_rate <= 0.0 {
        return len;
    }
    (len as f64 * target_rate / source_rate).round() as usize
}

/// Converts one channel from `source_rate` to `target_rate`.
///
/// Each output sample at index `i` reads the input at `i / ratio`, interpolating
/// between the two bracketing samples. The final input sample is held where there
/// is nothing to interpolate towards. Same-rate input is copied unchanged.
pub fn resample_linear(input: &[f32], source_rate: f64, target_rate: f64) -> Vec<f32> {
    if !needs_resampling(source_rate, target_rate) || source_rate <= 0.0 || target_rate <= 0.0
    {
        return input.to_vec();
    }

    let ratio = target_rate / source_rate;
    let output_len = resampled_length(input.len(), source_rate, target_rate);
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let source_pos = i as f64 / ratio;
        let index = source_pos.floor() as usize;
        let frac = (source_pos - index as f64) as f32;

        let sample = match (input.get(index), input.get(index + 1)) {
            (Some(s0), Some(s1)) => s0 + (s1 - s0) * frac,
            (Some(s0), None) => *s0,
            _ => 0.0,
        };
        output.push(sample);
    }

    output
}
