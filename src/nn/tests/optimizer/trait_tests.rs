/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : Optimizer trait 通用行为测试
 */

use super::param_with_grad;
use crate::nn::optimizer::{Adam, Optimizer, SGD, Updates};
use crate::tensor::Tensor;

fn all_optimizers() -> Vec<Box<dyn Optimizer>> {
    vec![
        Box::new(SGD::new(0.01)),
        Box::new(SGD::with_momentum(0.01, 0.9)),
        Box::new(Adam::new_default(0.01)),
    ]
}

#[test]
fn test_learning_rate_modification() {
    for mut optimizer in all_optimizers() {
        assert_eq!(optimizer.learning_rate(), 0.01);
        optimizer.set_learning_rate(0.001);
        assert_eq!(optimizer.learning_rate(), 0.001);
    }
}

#[test]
fn test_updates_follow_param_order() {
    let a = param_with_grad("a", &[1.0, 2.0], &[0.1, 0.1]);
    let b = param_with_grad("b", &[3.0], &[-0.1]);
    for mut optimizer in all_optimizers() {
        let updates = optimizer.updates(&[&b, &a]);
        assert_eq!(updates.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(updates.get("a").unwrap().shape(), &[2]);
        // 梯度为正则参数减小
        assert!(updates.get("a").unwrap().to_vec()[0] < 1.0);
        assert!(updates.get("b").unwrap().to_vec()[0] > 3.0);
    }
}

#[test]
fn test_empty_param_list() {
    for mut optimizer in all_optimizers() {
        assert!(optimizer.updates(&[]).is_empty());
    }
}

#[test]
fn test_updates_collection() {
    let mut updates = Updates::new();
    assert!(updates.is_empty());
    updates.push("w", Tensor::ones(&[2]));
    updates.push("b", Tensor::zeros(&[1]));
    assert_eq!(updates.len(), 2);
    assert_eq!(updates.get("b"), Some(&Tensor::zeros(&[1])));
    assert_eq!(updates.get("c"), None);
    assert_eq!(updates.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["w", "b"]);
}
