/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 图像读取与 patch 切分
 */

use approx::assert_abs_diff_eq;
use image::{GrayImage, Luma};

use crate::assert_err;
use crate::data::{PatchBatch, extract_patches, load_gray_image};
use crate::nn::ModelError;
use crate::tensor::Tensor;

fn ramp_image(h: usize, w: usize) -> Tensor {
    let data = (0..h * w).map(|i| i as f32).collect();
    Tensor::try_new(data, &[1, h, w]).unwrap()
}

#[test]
fn test_extract_patches_non_overlapping() {
    let image = ramp_image(4, 4);
    let patches = extract_patches(&image, (2, 2), (2, 2)).unwrap();
    assert_eq!(patches.shape(), &[4, 1, 2, 2]);
    // 行优先：左上、右上、左下、右下
    assert_eq!(patches.slice_axis0(0, 1).unwrap().to_vec(), vec![0., 1., 4., 5.]);
    assert_eq!(patches.slice_axis0(1, 2).unwrap().to_vec(), vec![2., 3., 6., 7.]);
    assert_eq!(patches.slice_axis0(3, 4).unwrap().to_vec(), vec![10., 11., 14., 15.]);
}

#[test]
fn test_extract_patches_drops_incomplete_border() {
    let image = ramp_image(5, 7);
    let patches = extract_patches(&image, (2, 3), (2, 3)).unwrap();
    // 行方向 0, 2；列方向 0, 3
    assert_eq!(patches.shape(), &[4, 1, 2, 3]);

    let overlapping = extract_patches(&image, (3, 3), (1, 2)).unwrap();
    assert_eq!(overlapping.shape(), &[9, 1, 3, 3]);
}

#[test]
fn test_extract_patches_invalid() {
    let image = ramp_image(4, 4);
    assert_err!(extract_patches(&image, (5, 2), (1, 1)), ModelError::InvalidOperation(_));
    assert_err!(extract_patches(&image, (2, 2), (0, 1)), ModelError::InvalidOperation(_));
    assert_err!(
        extract_patches(&Tensor::zeros(&[4, 4]), (2, 2), (2, 2)),
        ModelError::ShapeMismatch { .. }
    );
}

#[test]
fn test_patch_batch_from_images() {
    let images = [ramp_image(4, 4), ramp_image(2, 6)];
    let batch = PatchBatch::from_images(&images, (2, 2), (2, 2)).unwrap();
    assert_eq!(batch.n_img(), 2);
    assert_eq!(batch.patches.shape(), &[7, 1, 2, 2]);
    assert_eq!(batch.index_set.ranges(), &[(0, 4), (4, 7)]);
}

#[test]
fn test_load_gray_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    let img = GrayImage::from_fn(3, 2, |x, y| Luma([if (x + y) % 2 == 0 { 255 } else { 0 }]));
    img.save(&path).unwrap();

    let tensor = load_gray_image(&path).unwrap();
    assert_eq!(tensor.shape(), &[1, 2, 3]);
    assert_abs_diff_eq!(tensor.to_vec()[0], 1.);
    assert_abs_diff_eq!(tensor.to_vec()[1], 0.);
    assert_abs_diff_eq!(tensor.sum(), 3.);
}
