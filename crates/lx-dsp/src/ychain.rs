//! Correction chain
//!
//! Per decimated row and lane: a rational correction `y1 = P(r)/Q(r)`, two
//! polynomial stages, then the affine output transform. All evaluation is
//! Horner form, highest-order coefficient first. The only guarded division
//! is the y1 denominator, floored at 1e-12 in magnitude with its sign kept
//! (a denominator crossing zero keeps its side instead of snapping
//! positive).

use lx_core::{Params, CLAMP_FLOOR};

/// Horner evaluation, highest-order coefficient first. An empty sequence
/// evaluates to zero.
#[inline]
pub fn horner(coeffs: &[f64], x: f64) -> f64 {
    let mut acc = 0.0;
    for &c in coeffs {
        acc = acc * x + c;
    }
    acc
}

#[inline]
fn clamp_denominator(den: f64) -> f64 {
    if den.abs() < CLAMP_FLOOR {
        CLAMP_FLOOR.copysign(den)
    } else {
        den
    }
}

/// Evaluate the chain for every element of `ravg`, writing the y2, y3, and
/// yt planes. All slices share the same row-major lane layout and length.
pub fn evaluate(params: &Params, ravg: &[f32], y2: &mut [f32], y3: &mut [f32], yt: &mut [f32]) {
    debug_assert!(y2.len() >= ravg.len() && y3.len() >= ravg.len() && yt.len() >= ravg.len());

    for (i, &r) in ravg.iter().enumerate() {
        let r = r as f64;
        let num = horner(&params.y1_num, r);
        let den = clamp_denominator(horner(&params.y1_den, r));
        let y1 = num / den;
        let v2 = horner(&params.y2_coeffs, y1);
        let v3 = horner(&params.y3_coeffs, v2);
        y2[i] = v2 as f32;
        y3[i] = v3 as f32;
        yt[i] = (params.e * v3 + params.f) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horner_is_highest_order_first() {
        // 2x^2 + 3x + 4 at x = 10.
        assert_eq!(horner(&[2.0, 3.0, 4.0], 10.0), 234.0);
    }

    #[test]
    fn test_horner_empty_is_zero() {
        assert_eq!(horner(&[], 5.0), 0.0);
    }

    #[test]
    fn test_identity_chain() {
        let params = Params {
            y1_num: vec![1.0, 0.0],
            y1_den: vec![1.0],
            y2_coeffs: vec![1.0, 0.0],
            y3_coeffs: vec![1.0, 0.0],
            e: 1.0,
            f: 0.0,
            ..Params::default()
        };
        let ravg = [0.5f32, -2.0, 1000.0, 0.0];
        let mut y2 = [0.0f32; 4];
        let mut y3 = [0.0f32; 4];
        let mut yt = [0.0f32; 4];
        evaluate(&params, &ravg, &mut y2, &mut y3, &mut yt);
        assert_eq!(yt, ravg);
    }

    #[test]
    fn test_affine_output_transform() {
        let params = Params {
            e: 3.0,
            f: -1.0,
            ..Params::default()
        };
        let ravg = [2.0f32];
        let mut y2 = [0.0f32];
        let mut y3 = [0.0f32];
        let mut yt = [0.0f32];
        evaluate(&params, &ravg, &mut y2, &mut y3, &mut yt);
        assert_eq!(y3[0], 2.0);
        assert_eq!(yt[0], 5.0);
    }

    #[test]
    fn test_yt_tracks_y3_for_any_row() {
        let params = Params {
            y2_coeffs: vec![0.5, 1.0, -2.0],
            y3_coeffs: vec![1.0, 0.25],
            e: -1.5,
            f: 0.75,
            ..Params::default()
        };
        let ravg: Vec<f32> = (-8..8).map(|v| v as f32 * 0.3).collect();
        let mut y2 = vec![0.0f32; ravg.len()];
        let mut y3 = vec![0.0f32; ravg.len()];
        let mut yt = vec![0.0f32; ravg.len()];
        evaluate(&params, &ravg, &mut y2, &mut y3, &mut yt);
        for i in 0..ravg.len() {
            let expected = (params.e * y3[i] as f64 + params.f) as f32;
            assert!((yt[i] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_denominator_clamp_preserves_sign() {
        // Q(r) = r, evaluated at tiny values either side of zero.
        let params = Params {
            y1_num: vec![1.0],
            y1_den: vec![1.0, 0.0],
            ..Params::default()
        };
        let ravg = [1e-20f32, -1e-20];
        let mut y2 = [0.0f32; 2];
        let mut y3 = [0.0f32; 2];
        let mut yt = [0.0f32; 2];
        evaluate(&params, &ravg, &mut y2, &mut y3, &mut yt);

        // 1 / ±1e-12 = ±1e12.
        assert!(yt[0] > 0.0 && yt[0].is_finite());
        assert!(yt[1] < 0.0 && yt[1].is_finite());
        assert!((yt[0].abs() - 1e12).abs() / 1e12 < 1e-6);
    }

    #[test]
    fn test_large_denominator_not_clamped() {
        let params = Params {
            y1_num: vec![6.0],
            y1_den: vec![2.0],
            ..Params::default()
        };
        let ravg = [0.0f32];
        let mut y2 = [0.0f32];
        let mut y3 = [0.0f32];
        let mut yt = [0.0f32];
        evaluate(&params, &ravg, &mut y2, &mut y3, &mut yt);
        assert_eq!(yt[0], 3.0);
    }
}
