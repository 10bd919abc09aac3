/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 变形、切片、拼接与逐样本归约
 */

use crate::assert_err;
use crate::errors::TensorError;
use crate::tensor::Tensor;

#[test]
fn test_reshape() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[2, 3]);
    let reshaped = tensor.reshape(&[3, 2]).unwrap();
    assert_eq!(reshaped.shape(), &[3, 2]);
    assert_eq!(reshaped.to_vec(), tensor.to_vec());

    assert_err!(
        tensor.reshape(&[4, 2]),
        TensorError::ReshapeError { from, to } if from == &[2, 3] && to == &[4, 2]
    );
}

#[test]
fn test_flatten_batch() {
    let tensor = Tensor::zeros(&[4, 2, 3, 5]);
    assert_eq!(tensor.flatten_batch().unwrap().shape(), &[4, 30]);
}

#[test]
fn test_slice_axis0() {
    let tensor = Tensor::new(&[1., 2., 3., 4., 5., 6.], &[3, 2]);
    assert_eq!(tensor.slice_axis0(1, 3).unwrap(), Tensor::new(&[3., 4., 5., 6.], &[2, 2]));
    assert_eq!(tensor.slice_axis0(0, 0).unwrap().shape(), &[0, 2]);
    assert_err!(
        tensor.slice_axis0(2, 4),
        TensorError::RangeOutOfBound { from: 2, to: 4, len: 3 }
    );
}

#[test]
fn test_concat_axis0() {
    let a = Tensor::new(&[1., 2.], &[1, 2]);
    let b = Tensor::new(&[3., 4., 5., 6.], &[2, 2]);
    let c = Tensor::concat_axis0(&[a.clone(), b]).unwrap();
    assert_eq!(c, Tensor::new(&[1., 2., 3., 4., 5., 6.], &[3, 2]));

    assert_err!(Tensor::concat_axis0(&[]), TensorError::EmptyList);
    assert_err!(
        Tensor::concat_axis0(&[a, Tensor::zeros(&[1, 3])]),
        TensorError::InconsitentShape
    );
}

#[test]
fn test_mean_per_sample() {
    // 2 个样本，每个是 [1, 2, 2] 的指标图
    let tensor = Tensor::new(&[1., 2., 3., 4., 0., 0., 0., 2.], &[2, 1, 2, 2]);
    let mean = tensor.mean_per_sample().unwrap();
    assert_eq!(mean, Tensor::new(&[2.5, 0.5], &[2]));
}

#[test]
fn test_mean_axis0_keepdims() {
    let tensor = Tensor::new(&[1., 2., 3., 4.], &[2, 2]);
    assert_eq!(tensor.mean_axis0_keepdims(), Some(Tensor::new(&[2., 3.], &[1, 2])));
    assert_eq!(Tensor::zeros(&[0, 2]).mean_axis0_keepdims(), None);
}

#[test]
fn test_scores_to_tiles_and_unsqueeze() {
    let scores = Tensor::new(&[0.1, 0.9], &[2]);
    let tiles = scores.scores_to_tiles(3);
    assert_eq!(tiles.shape(), &[2, 1, 3, 3]);
    assert_eq!(tiles.slice_axis0(1, 2).unwrap().to_vec(), vec![0.9; 9]);

    assert_eq!(scores.unsqueeze(1).shape(), &[2, 1]);
}
