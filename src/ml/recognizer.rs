// ============================================================
// Layer 5 — Burn Recognizer
// ============================================================
// The concrete Model behind the pipeline traits: a CrnnModel
// trained with CTC loss and Adam, decoded with best-path or
// beam search.
//
// Backend split (as in Burn's training guide):
//   - train_batch runs on B (an AutodiffBackend) for gradients
//   - infer_batch runs on model.valid(), i.e. B::InnerBackend,
//     with dropout disabled and no autodiff bookkeeping
//
// Construction mirrors how the pipeline uses the model:
//   - train:    restore the checkpoint if one exists, else start fresh
//   - validate / infer: must_restore = true, fail if nothing is saved
//
// Reference: Burn Book §5 (Training), Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion},
};

use crate::data::batcher::ImageBatcher;
use crate::domain::batch::{Batch, Charset, RecognitionResult};
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::Model;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::ctc::ctc_loss;
use crate::ml::decoder::DecoderMode;
use crate::ml::model::{CrnnConfig, CrnnModel};

/// Training backend used by the CLI.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Settings the recognizer needs beyond the charset.
#[derive(Debug, Clone)]
pub struct RecognizerSettings {
    pub batch_size:    usize,
    pub img_height:    usize,
    pub hidden:        usize,
    pub dropout:       f64,
    pub learning_rate: f64,
    pub decoder:       DecoderMode,
    pub must_restore:  bool,
}

pub struct BurnRecognizer<B: AutodiffBackend, O> {
    model:       CrnnModel<B>,
    optim:       O,
    charset:     Charset,
    settings:    RecognizerSettings,
    checkpoints: CheckpointManager,
    device:      B::Device,
}

/// Build a recognizer with an Adam optimiser.
pub fn build_recognizer<B: AutodiffBackend>(
    charset:     Charset,
    settings:    RecognizerSettings,
    checkpoints: CheckpointManager,
    device:      B::Device,
) -> Result<BurnRecognizer<B, impl Optimizer<CrnnModel<B>, B>>> {
    let optim = AdamConfig::new().with_epsilon(1e-8).init::<B, CrnnModel<B>>();
    BurnRecognizer::new(charset, settings, checkpoints, device, optim)
}

impl<B, O> BurnRecognizer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<CrnnModel<B>, B>,
{
    pub fn new(
        charset:     Charset,
        settings:    RecognizerSettings,
        checkpoints: CheckpointManager,
        device:      B::Device,
        optim:       O,
    ) -> Result<Self> {
        if charset.is_empty() {
            return Err(PipelineError::invalid_config("charset is empty"));
        }

        let config = CrnnConfig::new(
            charset.len() + 1,
            settings.img_height,
            settings.hidden,
            settings.dropout,
        );
        let mut model: CrnnModel<B> = config.init(&device);

        if checkpoints.has_model() {
            model = checkpoints.load_model(model, &device)?;
        } else if settings.must_restore {
            return Err(PipelineError::CheckpointMissing { path: checkpoints.dir().to_path_buf() });
        } else {
            tracing::info!("Init with new values");
        }

        tracing::info!(
            "Recognizer ready: {} classes, batch size {}, decoder {:?}",
            charset.len() + 1,
            settings.batch_size,
            settings.decoder
        );

        Ok(Self { model, optim, charset, settings, checkpoints, device })
    }

    /// Class index of the CTC blank (always the last class).
    fn blank(&self) -> usize {
        self.charset.len()
    }

    fn check_batch(&self, batch: &Batch) -> Result<()> {
        if batch.len() != self.settings.batch_size {
            return Err(PipelineError::invalid_config(format!(
                "model expects batches of {}, got {}",
                self.settings.batch_size,
                batch.len()
            )));
        }
        Ok(())
    }
}

impl<B, O> Model for BurnRecognizer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<CrnnModel<B>, B>,
{
    fn batch_size(&self) -> usize {
        self.settings.batch_size
    }

    fn train_batch(&mut self, batch: &Batch) -> Result<f64> {
        self.check_batch(batch)?;
        if batch.ground_truth().is_none() {
            return Err(PipelineError::training("training batch has no ground truth"));
        }

        let input = ImageBatcher::<B>::new(self.device.clone()).batch(batch, &self.charset)?;
        let log_probs = self.model.forward(input.images);
        let loss = ctc_loss(log_probs, &input.targets, self.blank());

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        if !loss_val.is_finite() {
            return Err(PipelineError::training(format!("loss is {loss_val}")));
        }

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self.optim.step(self.settings.learning_rate, self.model.clone(), grads);

        Ok(loss_val)
    }

    fn infer_batch(&mut self, batch: &Batch) -> Result<RecognitionResult> {
        self.check_batch(batch)?;

        // model.valid() → CrnnModel<B::InnerBackend>, dropout disabled
        let model  = self.model.valid();
        let images = ImageBatcher::<B::InnerBackend>::new(self.device.clone()).images(batch)?;

        let log_probs = model.forward(images);
        let [_, time, classes] = log_probs.dims();
        let values: Vec<f32> = log_probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PipelineError::inference(format!("cannot read model output: {e:?}")))?;

        Ok(values
            .chunks(time * classes)
            .map(|sample| self.settings.decoder.decode(sample, classes, &self.charset))
            .collect())
    }

    fn save(&mut self) -> Result<()> {
        self.checkpoints.save_model(&self.model)
    }
}
