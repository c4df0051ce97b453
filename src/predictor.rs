// Flacon -- a bit-exact FLAC encoder and decoder
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The five fixed linear predictors (order 0 through 4).
//!
//! Grounded on claxon's `subframe::decode_fixed` for the reconstruction
//! side and the original Python reference's `fixed_predictor_residual_signal`
//! / `restore_linear_prediction` for the coefficient table and the encoder
//! side, which claxon (a decode-only library) has no counterpart for.

/// Coefficients of the fixed predictor of a given order, applied to the
/// `order` samples immediately preceding the one being predicted (most
/// recent first).
const FIXED_PREDICTOR_COEFFICIENTS: [&[i64]; 5] =
    [&[], &[1], &[2, -1], &[3, -3, 1], &[4, -6, 4, -1]];

/// Computes the residual of `samples` under the fixed predictor of the
/// given `order`.
///
/// The first `order` samples are warmup samples and are not predicted;
/// the returned vector holds only the `samples.len() - order` residual
/// values for the remaining samples.
pub fn residual(order: u8, samples: &[i32]) -> Vec<i32> {
    let order = order as usize;
    let coeffs = FIXED_PREDICTOR_COEFFICIENTS[order];
    samples[order..]
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let history = &samples[i..i + order];
            let prediction: i64 = coeffs
                .iter()
                .zip(history.iter().rev())
                .map(|(&c, &s)| c * s as i64)
                .sum();
            (sample as i64 - prediction) as i32
        })
        .collect()
}

/// Reconstructs the full sample sequence of a fixed-predictor subframe from
/// its `warmup` samples and `residual` values.
pub fn reconstruct(order: u8, warmup: &[i32], residual: &[i32]) -> Vec<i32> {
    let order_usize = order as usize;
    debug_assert_eq!(warmup.len(), order_usize);
    let coeffs = FIXED_PREDICTOR_COEFFICIENTS[order as usize];
    let mut samples = Vec::with_capacity(order_usize + residual.len());
    samples.extend_from_slice(warmup);
    for &r in residual {
        let history = &samples[samples.len() - order_usize..];
        let prediction: i64 = coeffs
            .iter()
            .zip(history.iter().rev())
            .map(|(&c, &s)| c * s as i64)
            .sum();
        samples.push((r as i64 + prediction) as i32);
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_zero_residual_is_the_samples_themselves() {
        let samples = [1, -2, 3, -4];
        assert_eq!(residual(0, &samples), vec![1, -2, 3, -4]);
    }

    #[test]
    fn ramp_is_exactly_predicted_by_order_one() {
        let samples = [10, 11, 12, 13, 14];
        assert_eq!(residual(1, &samples), vec![1, 1, 1, 1]);
    }

    #[test]
    fn constant_signal_is_exactly_predicted_by_every_order() {
        let samples = [42; 10];
        for order in 0..=4u8 {
            let r = residual(order, &samples);
            assert!(r.iter().all(|&x| x == 0), "order {order} residual: {r:?}");
        }
    }

    #[test]
    fn reconstruct_inverts_residual_for_all_orders() {
        let samples = [5, -3, 17, 42, -8, 0, 1000, -1000, 7, -7];
        for order in 0..=4u8 {
            let o = order as usize;
            let warmup = &samples[..o];
            let r = residual(order, &samples);
            assert_eq!(reconstruct(order, warmup, &r), samples.to_vec());
        }
    }
}
