/*
 * @Author       : 老董
 * @Date         : 2026-10-09
 * @Description  : 张量的逐元素四则运算。
 *                 1. 张量与纯数：返回的张量形状与该张量相同；
 *                 2. 张量与张量：两者形状必须严格一致，否则panic（不做广播）。
 */

use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub, SubAssign};

fn check_same_shape(a: &Tensor, b: &Tensor, operator: Operator) {
    assert!(
        a.is_same_shape(b),
        "{}",
        TensorError::OperatorError {
            operator,
            tensor1_shape: a.shape().to_vec(),
            tensor2_shape: b.shape().to_vec(),
        }
    );
}

macro_rules! impl_tensor_binary_op {
    ($trait:ident, $method:ident, $op:tt, $operator:expr) => {
        impl<'a, 'b> $trait<&'b Tensor> for &'a Tensor {
            type Output = Tensor;

            fn $method(self, other: &'b Tensor) -> Tensor {
                check_same_shape(self, other, $operator);
                Tensor::from_array(self.as_array() $op other.as_array())
            }
        }
        impl<'b> $trait<&'b Tensor> for Tensor {
            type Output = Tensor;

            fn $method(self, other: &'b Tensor) -> Tensor {
                (&self).$method(other)
            }
        }
        impl $trait for Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                (&self).$method(&other)
            }
        }
        impl<'a> $trait<f32> for &'a Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(self.as_array() $op scalar)
            }
        }
        impl $trait<f32> for Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(self.into_array() $op scalar)
            }
        }
    };
}

impl_tensor_binary_op!(Add, add, +, Operator::Add);
impl_tensor_binary_op!(Sub, sub, -, Operator::Sub);
impl_tensor_binary_op!(Mul, mul, *, Operator::Mul);
impl_tensor_binary_op!(Div, div, /, Operator::Div);

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓f32 与带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl<'a> Mul<&'a Tensor> for f32 {
    type Output = Tensor;

    fn mul(self, tensor: &'a Tensor) -> Tensor {
        tensor * self
    }
}
impl<'a> Add<&'a Tensor> for f32 {
    type Output = Tensor;

    fn add(self, tensor: &'a Tensor) -> Tensor {
        tensor + self
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑f32 与带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓原地运算↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl<'a> AddAssign<&'a Tensor> for Tensor {
    fn add_assign(&mut self, other: &'a Tensor) {
        check_same_shape(self, other, Operator::Add);
        *self.as_array_mut() += other.as_array();
    }
}
impl<'a> SubAssign<&'a Tensor> for Tensor {
    fn sub_assign(&mut self, other: &'a Tensor) {
        check_same_shape(self, other, Operator::Sub);
        *self.as_array_mut() -= other.as_array();
    }
}
impl MulAssign<f32> for Tensor {
    fn mul_assign(&mut self, scalar: f32) {
        *self.as_array_mut() *= scalar;
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑原地运算↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/
