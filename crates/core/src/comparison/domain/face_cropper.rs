use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::face_image::FaceImage;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CropError {
    #[error("invalid crop dimensions: {width}x{height}")]
    InvalidCropDimensions { width: i64, height: i64 },
}

/// Clamps a detector box to a `width` x `height` image.
///
/// The origin is moved onto the image when negative. A box running past the
/// right or bottom edge is shortened to end at that edge; otherwise its size
/// is kept as is.
pub fn clamp(bbox: &BoundingBox, width: u32, height: u32) -> Result<BoundingBox, CropError> {
    let (image_w, image_h) = (width as i64, height as i64);
    let left = (bbox.left as i64).max(0);
    let top = (bbox.top as i64).max(0);

    let crop_w = if left + bbox.width as i64 > image_w {
        image_w - left
    } else {
        bbox.width as i64
    };
    let crop_h = if top + bbox.height as i64 > image_h {
        image_h - top
    } else {
        bbox.height as i64
    };

    if crop_w <= 0 || crop_h <= 0 {
        return Err(CropError::InvalidCropDimensions {
            width: crop_w,
            height: crop_h,
        });
    }

    Ok(BoundingBox::new(
        left as i32,
        top as i32,
        crop_w as i32,
        crop_h as i32,
    ))
}

/// Copies the clamped face region of `source` into a new image.
///
/// The source is only borrowed; its owner decides when to release it.
pub fn crop(source: &FaceImage, bbox: &BoundingBox) -> Result<FaceImage, CropError> {
    let region = clamp(bbox, source.width(), source.height())?;
    if region != *bbox {
        log::debug!("Clamped face box {bbox:?} to {region:?}");
    }

    let channels = source.channels() as usize;
    let src_stride = source.width() as usize * channels;
    let row_len = region.width as usize * channels;
    let x0 = region.left as usize * channels;

    let mut data = Vec::with_capacity(row_len * region.height as usize);
    for y in region.top as usize..region.bottom() as usize {
        let start = y * src_stride + x0;
        data.extend_from_slice(&source.data()[start..start + row_len]);
    }

    Ok(FaceImage::new(
        data,
        region.width as u32,
        region.height as u32,
        source.channels(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Image where each pixel's first channel encodes its position.
    fn gradient(width: u32, height: u32) -> FaceImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(y * width + x) as u8, x as u8, y as u8]);
            }
        }
        FaceImage::new(data, width, height, 3)
    }

    #[rstest]
    #[case::inside(BoundingBox::new(5, 5, 10, 10), BoundingBox::new(5, 5, 10, 10))]
    #[case::negative_origin(BoundingBox::new(-10, -10, 50, 50), BoundingBox::new(0, 0, 40, 40))]
    #[case::past_right_edge(BoundingBox::new(30, 0, 20, 10), BoundingBox::new(30, 0, 10, 10))]
    #[case::past_bottom_edge(BoundingBox::new(0, 35, 10, 10), BoundingBox::new(0, 35, 10, 5))]
    #[case::negative_left_keeps_width(BoundingBox::new(-5, 0, 20, 10), BoundingBox::new(0, 0, 20, 10))]
    #[case::whole_image(BoundingBox::new(0, 0, 40, 40), BoundingBox::new(0, 0, 40, 40))]
    fn test_clamp(#[case] input: BoundingBox, #[case] expected: BoundingBox) {
        assert_eq!(clamp(&input, 40, 40).unwrap(), expected);
    }

    #[rstest]
    #[case::starts_past_right_edge(BoundingBox::new(50, 0, 10, 10), -10, 10)]
    #[case::starts_on_right_edge(BoundingBox::new(40, 0, 10, 10), 0, 10)]
    #[case::zero_height(BoundingBox::new(0, 0, 10, 0), 10, 0)]
    #[case::negative_width(BoundingBox::new(0, 0, -3, 10), -3, 10)]
    #[case::left_near_i32_max(BoundingBox::new(i32::MAX - 5, 0, 10, 10), 40 - (i32::MAX as i64 - 5), 10)]
    fn test_clamp_rejects_empty_region(
        #[case] input: BoundingBox,
        #[case] width: i64,
        #[case] height: i64,
    ) {
        assert_eq!(
            clamp(&input, 40, 40).unwrap_err(),
            CropError::InvalidCropDimensions { width, height }
        );
    }

    #[test]
    fn test_crop_copies_sub_rectangle() {
        let source = gradient(8, 6);
        let face = crop(&source, &BoundingBox::new(2, 1, 3, 2)).unwrap();

        assert_eq!(face.width(), 3);
        assert_eq!(face.height(), 2);
        assert_eq!(face.channels(), 3);
        let px = face.as_ndarray();
        assert_eq!((px[[0, 0, 1]], px[[0, 0, 2]]), (2, 1));
        assert_eq!((px[[1, 2, 1]], px[[1, 2, 2]]), (4, 2));
    }

    #[test]
    fn test_crop_of_overflowing_box_covers_whole_image() {
        let source = gradient(40, 40);
        let face = crop(&source, &BoundingBox::new(-10, -10, 50, 50)).unwrap();
        assert_eq!((face.width(), face.height()), (40, 40));
        assert_eq!(face.data(), source.data());
    }

    #[test]
    fn test_crop_keeps_grayscale_channels() {
        let source = FaceImage::new((0..16).collect(), 4, 4, 1);
        let face = crop(&source, &BoundingBox::new(1, 1, 2, 2)).unwrap();
        assert_eq!(face.data(), &[5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_fails_outside_image() {
        let source = gradient(10, 10);
        assert!(matches!(
            crop(&source, &BoundingBox::new(12, 0, 5, 5)),
            Err(CropError::InvalidCropDimensions { .. })
        ));
    }

    #[rstest]
    #[case::left_near_i32_max(BoundingBox::new(i32::MAX - 5, 0, 10, 10))]
    #[case::top_near_i32_max(BoundingBox::new(0, i32::MAX - 5, 10, 10))]
    #[case::huge_size(BoundingBox::new(0, 0, i32::MAX, i32::MAX))]
    #[case::minimum_origin(BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX))]
    fn test_crop_of_extreme_box_stays_in_bounds(#[case] bbox: BoundingBox) {
        let source = gradient(40, 40);
        match crop(&source, &bbox) {
            Ok(face) => {
                assert!(face.width() <= 40 && face.height() <= 40);
                assert_eq!(
                    face.data().len(),
                    (face.width() * face.height() * 3) as usize
                );
            }
            Err(e) => assert!(matches!(e, CropError::InvalidCropDimensions { .. })),
        }
    }

    #[test]
    fn test_crop_does_not_release_source() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let source = gradient(10, 10).with_release_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let face = crop(&source, &BoundingBox::new(0, 0, 5, 5)).unwrap();
        drop(face);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(source);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_message() {
        let err = CropError::InvalidCropDimensions {
            width: -2,
            height: 5,
        };
        assert_eq!(err.to_string(), "invalid crop dimensions: -2x5");
    }
}
