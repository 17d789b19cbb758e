//! Embedding → average pooling → ReLU → sigmoid network.

use super::config::ModelConfig;
use crate::error::{GuardError, Result};
use crate::vocab::UNKNOWN_INDEX;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Range of the uniform embedding initializer.
const EMBEDDING_INIT_RANGE: f32 = 0.05;

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` inside the loss.
pub(crate) const EPSILON: f32 = 1e-7;

/// Trainable tensors. Also used for gradients and optimizer moments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameters {
    /// `input_dim × output_dim`
    pub embedding: Array2<f32>,
    /// `output_dim × hidden_units`
    pub hidden_kernel: Array2<f32>,
    pub hidden_bias: Array1<f32>,
    /// `hidden_units × 1`
    pub output_kernel: Array2<f32>,
    pub output_bias: Array1<f32>,
}

impl Parameters {
    pub fn zeros(config: &ModelConfig) -> Self {
        Self {
            embedding: Array2::zeros((config.input_dim, config.output_dim)),
            hidden_kernel: Array2::zeros((config.output_dim, config.hidden_units)),
            hidden_bias: Array1::zeros(config.hidden_units),
            output_kernel: Array2::zeros((config.hidden_units, 1)),
            output_bias: Array1::zeros(1),
        }
    }

    /// Embedding uniform in ±0.05, Glorot-uniform kernels, zero biases.
    pub fn initialize(config: &ModelConfig, rng: &mut StdRng) -> Self {
        let mut params = Self::zeros(config);
        params
            .embedding
            .mapv_inplace(|_| rng.gen_range(-EMBEDDING_INIT_RANGE..=EMBEDDING_INIT_RANGE));
        glorot_uniform(&mut params.hidden_kernel, rng);
        glorot_uniform(&mut params.output_kernel, rng);
        params
    }

    /// `(name, shape)` of every tensor, in serialization order.
    pub fn shapes(config: &ModelConfig) -> Vec<(&'static str, Vec<usize>)> {
        vec![
            ("embedding/embeddings", vec![config.input_dim, config.output_dim]),
            ("dense/kernel", vec![config.output_dim, config.hidden_units]),
            ("dense/bias", vec![config.hidden_units]),
            ("dense_1/kernel", vec![config.hidden_units, 1]),
            ("dense_1/bias", vec![1]),
        ]
    }

    /// Flat views of every tensor, in serialization order.
    pub fn tensors(&self) -> [&[f32]; 5] {
        [
            slice_of(self.embedding.as_slice()),
            slice_of(self.hidden_kernel.as_slice()),
            slice_of(self.hidden_bias.as_slice()),
            slice_of(self.output_kernel.as_slice()),
            slice_of(self.output_bias.as_slice()),
        ]
    }

    /// Rebuild parameters from flat tensors in serialization order.
    pub fn from_tensors(config: &ModelConfig, mut tensors: Vec<Vec<f32>>) -> Result<Self> {
        if tensors.len() != 5 {
            return Err(GuardError::InvalidModel(format!(
                "expected 5 weight tensors, found {}",
                tensors.len()
            )));
        }
        let output_bias = tensors.pop().unwrap_or_default();
        let output_kernel = tensors.pop().unwrap_or_default();
        let hidden_bias = tensors.pop().unwrap_or_default();
        let hidden_kernel = tensors.pop().unwrap_or_default();
        let embedding = tensors.pop().unwrap_or_default();

        let shape_err = |e: ndarray::ShapeError| GuardError::InvalidModel(e.to_string());
        Ok(Self {
            embedding: Array2::from_shape_vec((config.input_dim, config.output_dim), embedding)
                .map_err(shape_err)?,
            hidden_kernel: Array2::from_shape_vec(
                (config.output_dim, config.hidden_units),
                hidden_kernel,
            )
            .map_err(shape_err)?,
            hidden_bias: Array1::from_shape_vec(config.hidden_units, hidden_bias)
                .map_err(shape_err)?,
            output_kernel: Array2::from_shape_vec((config.hidden_units, 1), output_kernel)
                .map_err(shape_err)?,
            output_bias: Array1::from_shape_vec(1, output_bias).map_err(shape_err)?,
        })
    }
}

fn slice_of(s: Option<&[f32]>) -> &[f32] {
    // Owned arrays built by this module are always in standard layout.
    s.unwrap_or(&[])
}

fn glorot_uniform(kernel: &mut Array2<f32>, rng: &mut StdRng) {
    let (fan_in, fan_out) = kernel.dim();
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    kernel.mapv_inplace(|_| rng.gen_range(-limit..=limit));
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Intermediate values of one forward pass, kept for backpropagation.
pub(crate) struct Activations {
    /// `batch × output_dim`
    pub pooled: Array2<f32>,
    /// `batch × hidden_units`, before ReLU.
    pub hidden_pre: Array2<f32>,
    /// `batch × hidden_units`
    pub hidden: Array2<f32>,
    /// Sigmoid outputs, one per sample.
    pub output: Array1<f32>,
}

/// Binary text classifier over fixed-length token sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct TextClassifier {
    config: ModelConfig,
    pub(crate) params: Parameters,
}

impl TextClassifier {
    /// Create a freshly initialized classifier; the same seed yields the
    /// same weights.
    pub fn new(config: ModelConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            params: Parameters::initialize(&config, &mut rng),
            config,
        }
    }

    pub(crate) fn from_parameters(config: ModelConfig, params: Parameters) -> Self {
        Self { config, params }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Total number of trainable scalars.
    pub fn parameter_count(&self) -> usize {
        self.params.tensors().iter().map(|t| t.len()).sum()
    }

    fn embedding_row(&self, token: u32) -> usize {
        let row = token as usize;
        if row < self.config.input_dim {
            row
        } else {
            UNKNOWN_INDEX as usize
        }
    }

    pub(crate) fn check_length(&self, sequence: &[u32]) -> Result<()> {
        if sequence.len() != self.config.input_length {
            return Err(GuardError::InvalidModel(format!(
                "sequence length {} does not match model input length {}",
                sequence.len(),
                self.config.input_length
            )));
        }
        Ok(())
    }

    pub(crate) fn forward(&self, batch: &[&[u32]]) -> Activations {
        let p = &self.params;
        let mut pooled = Array2::<f32>::zeros((batch.len(), self.config.output_dim));
        for (i, sequence) in batch.iter().enumerate() {
            let scale = 1.0 / sequence.len().max(1) as f32;
            let mut row = pooled.row_mut(i);
            for &token in sequence.iter() {
                row.scaled_add(scale, &p.embedding.row(self.embedding_row(token)));
            }
        }

        let mut hidden_pre = pooled.dot(&p.hidden_kernel);
        hidden_pre += &p.hidden_bias;
        let hidden = hidden_pre.mapv(|v| v.max(0.0));

        let mut logits = hidden.dot(&p.output_kernel);
        logits += &p.output_bias;
        let output = logits.column(0).mapv(sigmoid);

        Activations {
            pooled,
            hidden_pre,
            hidden,
            output,
        }
    }

    /// Gradients of the mean binary cross-entropy over the batch.
    pub(crate) fn backward(
        &self,
        batch: &[&[u32]],
        targets: &[f32],
        acts: &Activations,
    ) -> Parameters {
        let p = &self.params;
        let n = batch.len().max(1) as f32;

        // d(loss)/d(logit) for sigmoid + cross-entropy.
        let mut d_logits = Array2::<f32>::zeros((batch.len(), 1));
        for (i, (&y, &t)) in acts.output.iter().zip(targets).enumerate() {
            d_logits[[i, 0]] = (y - t) / n;
        }

        let output_kernel = acts.hidden.t().dot(&d_logits);
        let output_bias = d_logits.sum_axis(Axis(0));

        let mut d_hidden = d_logits.dot(&p.output_kernel.t());
        d_hidden.zip_mut_with(&acts.hidden_pre, |g, &pre| {
            if pre <= 0.0 {
                *g = 0.0;
            }
        });

        let hidden_kernel = acts.pooled.t().dot(&d_hidden);
        let hidden_bias = d_hidden.sum_axis(Axis(0));
        let d_pooled = d_hidden.dot(&p.hidden_kernel.t());

        let mut embedding = Array2::<f32>::zeros(p.embedding.raw_dim());
        for (i, sequence) in batch.iter().enumerate() {
            let scale = 1.0 / sequence.len().max(1) as f32;
            for &token in sequence.iter() {
                embedding
                    .row_mut(self.embedding_row(token))
                    .scaled_add(scale, &d_pooled.row(i));
            }
        }

        Parameters {
            embedding,
            hidden_kernel,
            hidden_bias,
            output_kernel,
            output_bias,
        }
    }

    /// Probability that `sequence` is harmful.
    pub fn predict(&self, sequence: &[u32]) -> Result<f32> {
        self.check_length(sequence)?;
        Ok(self.forward(&[sequence]).output[0])
    }

    /// Probabilities for several sequences at once.
    pub fn predict_batch<S: AsRef<[u32]>>(&self, sequences: &[S]) -> Result<Vec<f32>> {
        let batch: Vec<&[u32]> = sequences.iter().map(|s| s.as_ref()).collect();
        for sequence in &batch {
            self.check_length(sequence)?;
        }
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.forward(&batch).output.to_vec())
    }
}

/// Mean binary cross-entropy and the number of correct predictions.
pub(crate) fn batch_loss(outputs: &Array1<f32>, targets: &[f32]) -> (f32, usize) {
    let mut loss = 0.0f32;
    let mut correct = 0usize;
    for (&y, &t) in outputs.iter().zip(targets) {
        let y = y.clamp(EPSILON, 1.0 - EPSILON);
        loss -= t * y.ln() + (1.0 - t) * (1.0 - y).ln();
        if (y > 0.5) == (t > 0.5) {
            correct += 1;
        }
    }
    (loss / outputs.len().max(1) as f32, correct)
}
