// ============================================================
// Layer 5 — Word Recognition Network
// ============================================================
// A compact convolutional recognizer trained with CTC.
//
//   [N, 1, 32, 128]  grayscale word images
//        │ conv 3×3 (32)  + ReLU + maxpool 2×2
//   [N, 32, 16, 64]
//        │ conv 3×3 (64)  + ReLU + maxpool 2×2
//   [N, 64, 8, 32]
//        │ conv 3×3 (128) + ReLU + maxpool 2×1
//   [N, 128, 4, 32]
//        │ fold height into features, width becomes time
//   [N, 32, 512]
//        │ linear + ReLU + dropout, linear
//   [N, 32, classes]  log-probabilities per time step
//
// Class `classes - 1` is the CTC blank.
//
// Reference: Shi et al. (2016) CRNN
//            Graves et al. (2006) Connectionist Temporal Classification

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{log_softmax, relu},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CrnnConfig {
    /// Charset size + 1 for the blank
    pub num_classes: usize,
    /// Input height; must be divisible by 8
    pub img_height:  usize,
    pub hidden:      usize,
    pub dropout:     f64,
}

impl CrnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CrnnModel<B> {
        let conv = |channels: [usize; 2]| {
            Conv2dConfig::new(channels, [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device)
        };
        let feature_height = self.img_height / 8;

        CrnnModel {
            conv1:   conv([1, 32]),
            conv2:   conv([32, 64]),
            conv3:   conv([64, 128]),
            pool:    MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            pool_h:  MaxPool2dConfig::new([2, 1]).with_strides([2, 1]).init(),
            fc:      LinearConfig::new(128 * feature_height, self.hidden).init(device),
            head:    LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct CrnnModel<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub conv3:   Conv2d<B>,
    pub pool:    MaxPool2d,
    pub pool_h:  MaxPool2d,
    pub fc:      Linear<B>,
    pub head:    Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> CrnnModel<B> {
    /// images: [batch, 1, height, width] → log-probs: [batch, width / 4, classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 3> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = self.pool_h.forward(relu(self.conv3.forward(x)));

        // [N, C, H, T] → [N, T, H, C] → [N, T, H*C]
        let [batch, channels, height, time] = x.dims();
        let x = x.swap_dims(1, 3).reshape([batch, time, height * channels]);

        let x = self.dropout.forward(relu(self.fc.forward(x)));
        log_softmax(self.head.forward(x), 2)
    }
}
