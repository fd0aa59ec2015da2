//! Face alignment via 4-DOF similarity transform.
//!
//! Warps a detected face onto the canonical 112×112 ArcFace crop using the
//! five InsightFace reference landmarks.

use image::{Rgb, RgbImage};

/// ArcFace reference landmarks for a 112×112 output.
const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub const ALIGNED_SIZE: u32 = 112;

/// Least-squares similarity transform (scale, rotation, translation) mapping
/// `src` onto `dst`, in closed form over centred coordinates.
///
/// Returns [a, -b, tx, b, a, ty]:
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
fn estimate_similarity_transform(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> [f32; 6] {
    let n = src.len() as f32;
    let centroid = |pts: &[(f32, f32); 5]| {
        let (sx, sy) = pts.iter().fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    };
    let (msx, msy) = centroid(src);
    let (mdx, mdy) = centroid(dst);

    let mut spread = 0.0f32;
    let mut num_a = 0.0f32;
    let mut num_b = 0.0f32;
    for (s, d) in src.iter().zip(dst.iter()) {
        let (sx, sy) = (s.0 - msx, s.1 - msy);
        let (dx, dy) = (d.0 - mdx, d.1 - mdy);
        spread += sx * sx + sy * sy;
        num_a += sx * dx + sy * dy;
        num_b += sx * dy - sy * dx;
    }

    if spread < 1e-12 {
        // Degenerate landmarks (all coincident): translate only.
        return [1.0, 0.0, mdx - msx, 0.0, 1.0, mdy - msy];
    }

    let a = num_a / spread;
    let b = num_b / spread;
    let tx = mdx - (a * msx - b * msy);
    let ty = mdy - (b * msx + a * msy);

    [a, -b, tx, b, a, ty]
}

/// Apply a 2×3 similarity warp, sampling the source bilinearly.
/// Out-of-bounds samples are black.
fn warp_affine(src: &RgbImage, matrix: &[f32; 6], out_size: u32) -> RgbImage {
    let (a, tx) = (matrix[0], matrix[2]);
    let (b, ty) = (matrix[3], matrix[5]);

    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return RgbImage::new(out_size, out_size);
    }
    let ia = a / det;
    let ib = b / det;

    let (w, h) = (src.width() as i64, src.height() as i64);
    let sample = |x: i64, y: i64, c: usize| -> f32 {
        if x >= 0 && x < w && y >= 0 && y < h {
            src.get_pixel(x as u32, y as u32)[c] as f32
        } else {
            0.0
        }
    };

    RgbImage::from_fn(out_size, out_size, |ox, oy| {
        // src = M⁻¹ · (dst − t)
        let dx = ox as f32 - tx;
        let dy = oy as f32 - ty;
        let sx = ia * dx + ib * dy;
        let sy = -ib * dx + ia * dy;

        let x0 = sx.floor() as i64;
        let y0 = sy.floor() as i64;
        let fx = sx - x0 as f32;
        let fy = sy - y0 as f32;

        let mut px = [0u8; 3];
        for (c, out) in px.iter_mut().enumerate() {
            let val = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                + sample(x0 + 1, y0 + 1, c) * fx * fy;
            *out = val.round().clamp(0.0, 255.0) as u8;
        }
        Rgb(px)
    })
}

/// Align a detected face to a canonical 112×112 RGB crop suitable for
/// ArcFace embedding extraction.
pub fn align_face(image: &RgbImage, landmarks: &[(f32, f32); 5]) -> RgbImage {
    let matrix = estimate_similarity_transform(landmarks, &REFERENCE_LANDMARKS_112);
    warp_affine(image, &matrix, ALIGNED_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let pts = REFERENCE_LANDMARKS_112;
        let m = estimate_similarity_transform(&pts, &pts);

        assert!((m[0] - 1.0).abs() < 1e-4, "a = {}", m[0]);
        assert!(m[1].abs() < 1e-4, "-b = {}", m[1]);
        assert!(m[2].abs() < 1e-3, "tx = {}", m[2]);
        assert!(m[3].abs() < 1e-4, "b = {}", m[3]);
        assert!((m[4] - 1.0).abs() < 1e-4, "a2 = {}", m[4]);
        assert!(m[5].abs() < 1e-3, "ty = {}", m[5]);
    }

    #[test]
    fn test_scaled_transform() {
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x * 2.0, y * 2.0));
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert!((m[0] - 0.5).abs() < 1e-3, "a = {}, expected 0.5", m[0]);
        assert!(m[3].abs() < 1e-3, "b = {}", m[3]);
    }

    #[test]
    fn test_translated_transform() {
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x + 10.0, y - 5.0));
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert!((m[0] - 1.0).abs() < 1e-4);
        assert!((m[2] + 10.0).abs() < 1e-3, "tx = {}", m[2]);
        assert!((m[5] - 5.0).abs() < 1e-3, "ty = {}", m[5]);
    }

    #[test]
    fn test_degenerate_landmarks() {
        let src = [(10.0, 10.0); 5];
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert_eq!(m[0], 1.0);
        assert_eq!(m[3], 0.0);
    }

    #[test]
    fn test_align_face_output_size() {
        let image = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
        let aligned = align_face(&image, &REFERENCE_LANDMARKS_112);
        assert_eq!(aligned.dimensions(), (ALIGNED_SIZE, ALIGNED_SIZE));
    }

    #[test]
    fn test_landmark_roundtrip() {
        // A bright patch at the source left eye must land near the reference left eye.
        let mut image = RgbImage::new(200, 200);
        let src_landmarks: [(f32, f32); 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];
        let (lx, ly) = (src_landmarks[0].0 as u32, src_landmarks[0].1 as u32);
        for y in ly - 2..=ly + 2 {
            for x in lx - 2..=lx + 2 {
                image.put_pixel(x, y, Rgb([255, 0, 255]));
            }
        }

        let aligned = align_face(&image, &src_landmarks);

        let ref_x = REFERENCE_LANDMARKS_112[0].0.round() as u32;
        let ref_y = REFERENCE_LANDMARKS_112[0].1.round() as u32;
        let mut max_red = 0u8;
        for y in ref_y - 1..=ref_y + 1 {
            for x in ref_x - 1..=ref_x + 1 {
                max_red = max_red.max(aligned.get_pixel(x, y)[0]);
            }
        }
        assert!(max_red > 100, "expected bright patch near ({ref_x}, {ref_y}), max={max_red}");
    }
}
