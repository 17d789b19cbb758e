//! Adam optimizer.

use super::config::ModelConfig;
use super::network::Parameters;
use ndarray::{Array, Dimension, Zip};

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-7;

/// Adam state: first and second moment estimates for every tensor.
pub(crate) struct Adam {
    learning_rate: f32,
    step: i32,
    m: Parameters,
    v: Parameters,
}

impl Adam {
    pub fn new(config: &ModelConfig, learning_rate: f32) -> Self {
        Self {
            learning_rate,
            step: 0,
            m: Parameters::zeros(config),
            v: Parameters::zeros(config),
        }
    }

    /// Apply one update to `params` from `grads`.
    pub fn step(&mut self, params: &mut Parameters, grads: &Parameters) {
        self.step += 1;
        let lr_t = self.learning_rate * (1.0 - BETA2.powi(self.step)).sqrt()
            / (1.0 - BETA1.powi(self.step));

        update(
            &mut params.embedding,
            &grads.embedding,
            &mut self.m.embedding,
            &mut self.v.embedding,
            lr_t,
        );
        update(
            &mut params.hidden_kernel,
            &grads.hidden_kernel,
            &mut self.m.hidden_kernel,
            &mut self.v.hidden_kernel,
            lr_t,
        );
        update(
            &mut params.hidden_bias,
            &grads.hidden_bias,
            &mut self.m.hidden_bias,
            &mut self.v.hidden_bias,
            lr_t,
        );
        update(
            &mut params.output_kernel,
            &grads.output_kernel,
            &mut self.m.output_kernel,
            &mut self.v.output_kernel,
            lr_t,
        );
        update(
            &mut params.output_bias,
            &grads.output_bias,
            &mut self.m.output_bias,
            &mut self.v.output_bias,
            lr_t,
        );
    }
}

fn update<D: Dimension>(
    param: &mut Array<f32, D>,
    grad: &Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    lr_t: f32,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + EPSILON);
        });
}
