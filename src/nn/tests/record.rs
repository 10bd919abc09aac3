/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 诊断记录
 */

use crate::nn::{ColorAxis, Record, RecordValue};
use crate::tensor::Tensor;

fn sample_record() -> Record {
    let mut record = Record::new();
    record.add_data("loc_mse", 1.23456);
    record.add_data("l2_reg", 0.001);
    record.add_im_data("mos_p", &Tensor::new(&[0.2, 0.8], &[2]));
    record.add_imgs("x_c", &Tensor::zeros(&[3, 1, 4, 4]), ColorAxis::Range(-0.25, 0.25));
    record
}

#[test]
fn test_record_accessors() {
    let record = sample_record();
    assert_eq!(record.len(), 4);
    assert!(!record.is_empty());
    assert_eq!(record.names().collect::<Vec<_>>(), vec!["loc_mse", "l2_reg", "mos_p", "x_c"]);

    assert_eq!(record.scalar("loc_mse"), Some(1.23456));
    assert_eq!(record.scalar("mos_p"), None);
    assert_eq!(record.im_data("mos_p"), Some(&Tensor::new(&[0.2, 0.8], &[2])));
    let (imgs, caxis) = record.imgs("x_c").unwrap();
    assert_eq!(imgs.shape(), &[3, 1, 4, 4]);
    assert_eq!(caxis, ColorAxis::Range(-0.25, 0.25));
    assert!(matches!(record.get("l2_reg"), Some(RecordValue::Scalar(_))));
    assert!(record.get("subj").is_none());
}

#[test]
fn test_record_overwrite_keeps_position() {
    let mut record = sample_record();
    record.add_data("loc_mse", 2.);
    assert_eq!(record.len(), 4);
    assert_eq!(record.names().next(), Some("loc_mse"));
    assert_eq!(record.scalar("loc_mse"), Some(2.));
}

#[test]
fn test_record_summary() {
    let record = sample_record();
    assert_eq!(record.summary(), "loc_mse: 1.2346, l2_reg: 0.0010");
    assert_eq!(Record::new().summary(), "");
}

#[test]
fn test_record_save() {
    let dir = tempfile::tempdir().unwrap();
    let mut record = sample_record();
    record.add_imgs(
        "met_s",
        &Tensor::new(&[0.1, 0.5, 0.9], &[3]).scores_to_tiles(10),
        ColorAxis::Auto,
    );

    let img_paths = record.save_imgs(dir.path()).unwrap();
    assert_eq!(img_paths.len(), 2);
    // 3 张 10x10 图块排成 2x2 网格，格间留 1 像素
    let tiled = image::open(&img_paths[1]).unwrap().to_luma8();
    assert_eq!(tiled.dimensions(), (21, 21));
    assert_eq!(tiled.get_pixel(0, 0).0[0], 0);
    assert_eq!(tiled.get_pixel(20, 0).0[0], 128);
    assert_eq!(tiled.get_pixel(0, 20).0[0], 255);

    let npy_paths = record.save_im_data(dir.path()).unwrap();
    assert_eq!(npy_paths.len(), 1);
    let loaded: ndarray::ArrayD<f32> = ndarray_npy::read_npy(&npy_paths[0]).unwrap();
    assert_eq!(loaded.as_slice().unwrap(), &[0.2, 0.8]);
}
