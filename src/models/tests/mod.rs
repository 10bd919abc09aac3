
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::models::BieconConfig;
use crate::nn::ModelBaseConfig;
use crate::tensor::Tensor;

/// 16x16 的 patch：feat 输出为 [64]，计算量小
fn small_config(use_dropout: bool) -> BieconConfig {
    BieconConfig {
        use_dropout,
        base: ModelBaseConfig {
            input_size: [16, 16],
            lr: 1e-3,
            seed: Some(1),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn random_patches(n: usize, seed: u64) -> Tensor {
    let mut rng = StdRng::seed_from_u64(seed);
    Tensor::new_uniform(-0.25, 0.25, &[n, 1, 16, 16], &mut rng)
}
