// ============================================================
// Layer 6 — Web Model Export
// ============================================================
// Writes the trained network as a TensorFlow.js layers model, the
// format the web app loads with tf.loadLayersModel:
//
//   model.json              ← format, modelTopology, weightsManifest
//   group1-shard1of1.bin    ← every weight, little-endian f32
//
// Burn and the web runtime lay tensors out differently:
//
//   conv kernel    burn [out, in, kh, kw]   web [kh, kw, in, out]
//   dense kernel   burn [in, out]           web [in, out]
//   flatten        burn C·H·W               web H·W·C
//
// so conv kernels are transposed and the rows of the first dense
// kernel are reordered from channel-major to channel-last.
//
// Reference: TensorFlow.js layers-model format (model.json + shards)

use anyhow::{anyhow, Context, Result};
use burn::{module::Param, prelude::*};
use serde_json::{json, Value};
use std::{fs, path::Path};

use crate::ml::model::{EmotionCnn, EmotionCnnConfig};

pub const MANIFEST_FILE: &str = "model.json";
pub const SHARD_FILE:    &str = "group1-shard1of1.bin";

/// One named weight in the order it is written to the shard.
#[derive(Debug, Clone)]
struct WebWeight {
    name:   String,
    shape:  Vec<usize>,
    values: Vec<f32>,
}

/// Write model.json and the weight shard into `dir`, replacing both.
pub fn write_layers_model<B: Backend>(
    dir:    &Path,
    model:  &EmotionCnn<B>,
    config: &EmotionCnnConfig,
) -> Result<()> {
    let weights = web_weights(model, config)?;

    let mut shard = Vec::with_capacity(weights.iter().map(|w| w.values.len() * 4).sum());
    for w in &weights {
        for v in &w.values {
            shard.extend_from_slice(&v.to_le_bytes());
        }
    }

    let manifest = json!({
        "format":        "layers-model",
        "generatedBy":   concat!("fer-train ", env!("CARGO_PKG_VERSION")),
        "convertedBy":   Value::Null,
        "modelTopology": topology(config),
        "weightsManifest": [{
            "paths":   [SHARD_FILE],
            "weights": weights
                .iter()
                .map(|w| json!({ "name": w.name, "shape": w.shape, "dtype": "float32" }))
                .collect::<Vec<_>>(),
        }],
    });

    let shard_path = dir.join(SHARD_FILE);
    fs::write(&shard_path, &shard)
        .with_context(|| format!("Cannot write weights to '{}'", shard_path.display()))?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string(&manifest)?)
        .with_context(|| format!("Cannot write '{}'", manifest_path.display()))?;

    tracing::debug!("Exported {} bytes of web weights to '{}'", shard.len(), dir.display());
    Ok(())
}

/// Kernels and biases of every trainable layer in web layout.
fn web_weights<B: Backend>(model: &EmotionCnn<B>, config: &EmotionCnnConfig) -> Result<Vec<WebWeight>> {
    let k      = config.kernel_size;
    let side   = config.feature_map_size();
    let conv1  = conv_kernel_hwio(&values(model.conv1.weight.val())?, [config.conv1_filters, 1, k, k]);
    let conv2  = conv_kernel_hwio(
        &values(model.conv2.weight.val())?,
        [config.conv2_filters, config.conv1_filters, k, k],
    );
    let dense1 = dense_rows_channels_last(
        &values(model.hidden.weight.val())?,
        config.conv2_filters,
        side,
        config.hidden_size,
    );
    let dense2 = values(model.output.weight.val())?;

    Ok(vec![
        weight("conv2d_1/kernel", vec![k, k, 1, config.conv1_filters], conv1),
        weight("conv2d_1/bias", vec![config.conv1_filters], bias(&model.conv1.bias, config.conv1_filters)?),
        weight("conv2d_2/kernel", vec![k, k, config.conv1_filters, config.conv2_filters], conv2),
        weight("conv2d_2/bias", vec![config.conv2_filters], bias(&model.conv2.bias, config.conv2_filters)?),
        weight("dense_1/kernel", vec![config.flattened_size(), config.hidden_size], dense1),
        weight("dense_1/bias", vec![config.hidden_size], bias(&model.hidden.bias, config.hidden_size)?),
        weight("dense_2/kernel", vec![config.hidden_size, config.num_classes], dense2),
        weight("dense_2/bias", vec![config.num_classes], bias(&model.output.bias, config.num_classes)?),
    ])
}

fn weight(name: &str, shape: Vec<usize>, values: Vec<f32>) -> WebWeight {
    WebWeight { name: name.to_string(), shape, values }
}

fn values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read weights: {e:?}"))
}

fn bias<B: Backend>(bias: &Option<Param<Tensor<B, 1>>>, len: usize) -> Result<Vec<f32>> {
    match bias {
        Some(b) => values(b.val()),
        None    => Ok(vec![0.0; len]),
    }
}

/// Reorder a conv kernel from [out, in, kh, kw] to [kh, kw, in, out].
fn conv_kernel_hwio(src: &[f32], [out, inp, kh, kw]: [usize; 4]) -> Vec<f32> {
    let mut dst = vec![0.0; src.len()];
    for o in 0..out {
        for i in 0..inp {
            for h in 0..kh {
                for w in 0..kw {
                    dst[((h * kw + w) * inp + i) * out + o] = src[((o * inp + i) * kh + h) * kw + w];
                }
            }
        }
    }
    dst
}

/// Reorder the rows of a dense kernel fed by a flattened
/// [channels, side, side] feature map so they follow [side, side, channels].
fn dense_rows_channels_last(src: &[f32], channels: usize, side: usize, units: usize) -> Vec<f32> {
    let mut dst = vec![0.0; src.len()];
    for c in 0..channels {
        for h in 0..side {
            for w in 0..side {
                let from = ((c * side + h) * side + w) * units;
                let to   = ((h * side + w) * channels + c) * units;
                dst[to..to + units].copy_from_slice(&src[from..from + units]);
            }
        }
    }
    dst
}

// ─── Topology ────────────────────────────────────────────────────────────────

fn glorot_uniform() -> Value {
    json!({
        "class_name": "VarianceScaling",
        "config": { "scale": 1, "mode": "fan_avg", "distribution": "uniform", "seed": null }
    })
}

fn zeros() -> Value {
    json!({ "class_name": "Zeros", "config": {} })
}

fn conv2d(name: &str, filters: usize, k: usize, input: Option<usize>) -> Value {
    let mut config = json!({
        "name":                 name,
        "trainable":            true,
        "filters":              filters,
        "kernel_size":          [k, k],
        "strides":              [1, 1],
        "padding":              "valid",
        "data_format":          "channels_last",
        "dilation_rate":        [1, 1],
        "activation":           "relu",
        "use_bias":             true,
        "kernel_initializer":   glorot_uniform(),
        "bias_initializer":     zeros(),
        "kernel_regularizer":   null,
        "bias_regularizer":     null,
        "activity_regularizer": null,
        "kernel_constraint":    null,
        "bias_constraint":      null,
    });
    if let Some(side) = input {
        config["batch_input_shape"] = json!([null, side, side, 1]);
        config["dtype"] = json!("float32");
    }
    json!({ "class_name": "Conv2D", "config": config })
}

fn max_pool(name: &str, p: usize) -> Value {
    json!({
        "class_name": "MaxPooling2D",
        "config": {
            "name":        name,
            "trainable":   true,
            "pool_size":   [p, p],
            "strides":     [p, p],
            "padding":     "valid",
            "data_format": "channels_last",
        }
    })
}

fn dense(name: &str, units: usize, activation: &str) -> Value {
    json!({
        "class_name": "Dense",
        "config": {
            "name":                 name,
            "trainable":            true,
            "units":                units,
            "activation":           activation,
            "use_bias":             true,
            "kernel_initializer":   glorot_uniform(),
            "bias_initializer":     zeros(),
            "kernel_regularizer":   null,
            "bias_regularizer":     null,
            "activity_regularizer": null,
            "kernel_constraint":    null,
            "bias_constraint":      null,
        }
    })
}

/// Sequential layer list matching EmotionCnn, in web layer naming.
fn topology(config: &EmotionCnnConfig) -> Value {
    let k = config.kernel_size;
    let p = config.pool_size;
    json!({
        "class_name": "Sequential",
        "config": {
            "name": "sequential_1",
            "layers": [
                conv2d("conv2d_1", config.conv1_filters, k, Some(config.image_size)),
                max_pool("max_pooling2d_1", p),
                conv2d("conv2d_2", config.conv2_filters, k, None),
                max_pool("max_pooling2d_2", p),
                { "class_name": "Flatten", "config": { "name": "flatten_1", "trainable": true } },
                dense("dense_1", config.hidden_size, "relu"),
                {
                    "class_name": "Dropout",
                    "config": {
                        "name": "dropout_1", "trainable": true,
                        "rate": config.dropout, "noise_shape": null, "seed": null,
                    }
                },
                dense("dense_2", config.num_classes, "softmax"),
            ]
        },
        "keras_version": "tfjs-layers 4.22.0",
        "backend":       "tensor_flow.js",
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn read_f32(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn test_conv_kernel_transpose() {
        // out=2, in=1, 1x2 kernel: src[o][0][0][w] = 10*o + w
        let src = vec![0.0, 1.0, 10.0, 11.0];
        let dst = conv_kernel_hwio(&src, [2, 1, 1, 2]);
        // dst[0][w][0][o]
        assert_eq!(dst, vec![0.0, 10.0, 1.0, 11.0]);
    }

    #[test]
    fn test_dense_rows_follow_channels_last_flatten() {
        // 2 channels, 2x2 map, 1 unit; burn row index c*4 + h*2 + w is the value
        let src: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let dst = dense_rows_channels_last(&src, 2, 2, 1);
        // web row (h*2 + w)*2 + c must hold burn row c*4 + h*2 + w
        assert_eq!(dst, vec![0.0, 4.0, 1.0, 5.0, 2.0, 6.0, 3.0, 7.0]);
    }

    #[test]
    fn test_layers_model_manifest_matches_shard() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = EmotionCnnConfig::new(14, 7);
        let model: EmotionCnn<TestBackend> = config.init(&device);
        write_layers_model(dir.path(), &model, &config).unwrap();

        let manifest: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["format"], "layers-model");

        let layers = manifest["modelTopology"]["config"]["layers"].as_array().unwrap();
        let classes: Vec<&str> = layers.iter().map(|l| l["class_name"].as_str().unwrap()).collect();
        assert_eq!(
            classes,
            ["Conv2D", "MaxPooling2D", "Conv2D", "MaxPooling2D", "Flatten", "Dense", "Dropout", "Dense"]
        );
        assert_eq!(layers[0]["config"]["batch_input_shape"], json!([null, 14, 14, 1]));
        assert_eq!(layers[7]["config"]["activation"], "softmax");

        let group = &manifest["weightsManifest"][0];
        assert_eq!(group["paths"], json!([SHARD_FILE]));

        // 14 → 12 → 6 → 4 → 2, so the dense input is 64·2·2
        let expected = [
            ("conv2d_1/kernel", vec![3, 3, 1, 32]),
            ("conv2d_1/bias", vec![32]),
            ("conv2d_2/kernel", vec![3, 3, 32, 64]),
            ("conv2d_2/bias", vec![64]),
            ("dense_1/kernel", vec![256, 128]),
            ("dense_1/bias", vec![128]),
            ("dense_2/kernel", vec![128, 7]),
            ("dense_2/bias", vec![7]),
        ];
        let entries = group["weights"].as_array().unwrap();
        assert_eq!(entries.len(), expected.len());
        let mut total = 0usize;
        for (entry, (name, shape)) in entries.iter().zip(&expected) {
            assert_eq!(entry["name"], *name);
            assert_eq!(entry["dtype"], "float32");
            assert_eq!(entry["shape"], json!(shape));
            total += shape.iter().product::<usize>();
        }

        let shard = fs::read(dir.path().join(SHARD_FILE)).unwrap();
        assert_eq!(shard.len(), total * 4);
    }

    #[test]
    fn test_shard_holds_transposed_parameters() {
        let dir    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = EmotionCnnConfig::new(14, 7);
        let model: EmotionCnn<TestBackend> = config.init(&device);
        write_layers_model(dir.path(), &model, &config).unwrap();

        let shard = read_f32(&fs::read(dir.path().join(SHARD_FILE)).unwrap());

        // conv2d_1/kernel comes first: web [h][w][0][o] == burn [o][0][h][w]
        let burn_conv1 = values(model.conv1.weight.val()).unwrap();
        let (o, h, w) = (5, 2, 1);
        assert_eq!(shard[(h * 3 + w) * 32 + o], burn_conv1[(o * 3 + h) * 3 + w]);

        // dense_1/kernel follows the two conv layers
        let offset = 9 * 32 + 32 + 9 * 32 * 64 + 64;
        let burn_dense1 = values(model.hidden.weight.val()).unwrap();
        let (c, h, w, u) = (3, 1, 0, 17);
        let web_row  = (h * 2 + w) * 64 + c;
        let burn_row = (c * 2 + h) * 2 + w;
        assert_eq!(shard[offset + web_row * 128 + u], burn_dense1[burn_row * 128 + u]);
    }
}
