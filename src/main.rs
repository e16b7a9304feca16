//! Command-line driver: caption one preprocessed image with an ONNX
//! show-and-tell model.
//!
//! ```bash
//! im2txt --model-dir ~/.cache/im2txt --input image.txt --shape 1,346,346,3
//! ```

mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use im2txt_lib::onnx::default_model_root;
use im2txt_lib::{BeamConfig, CaptionGenerator};

#[derive(Parser, Debug)]
#[command(name = "im2txt")]
#[command(about = "Generate image captions with beam search")]
#[command(version)]
struct Args {
    /// Directory holding the encoder/decoder graphs and the vocabulary.
    /// Defaults to $IM2TXT_MODEL_DIR or the user cache directory.
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Image tensor as whitespace-separated floats (decoded, resized, scaled to [0, 1])
    #[arg(short, long)]
    input: PathBuf,

    /// Tensor shape, comma separated
    #[arg(long, default_value = "1,346,346,3")]
    shape: String,

    #[arg(long)]
    beam_size: Option<usize>,

    #[arg(long)]
    max_length: Option<usize>,

    #[arg(long)]
    length_normalization: Option<f32>,

    /// Print captions as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn beam_config(&self) -> BeamConfig {
        let mut config = BeamConfig::from_env();
        if let Some(beam_size) = self.beam_size {
            config.beam_size = beam_size;
        }
        if let Some(max_length) = self.max_length {
            config.max_caption_length = max_length;
        }
        if let Some(factor) = self.length_normalization {
            config.length_normalization_factor = factor;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.beam_config();
    let model_dir = args.model_dir.clone().unwrap_or_else(default_model_root);
    let shape = input::parse_shape(&args.shape)?;
    let image = input::load_image_tensor(&args.input, &shape)?;

    let mut generator = CaptionGenerator::from_model_dir(&model_dir, config)
        .with_context(|| format!("loading model from {}", model_dir.display()))?;
    let captions = generator.caption(&image.view())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&captions)?);
        return Ok(());
    }

    for (i, caption) in captions.iter().enumerate() {
        println!(
            "{}) {} (p={:.6})   {:?}",
            i,
            caption.text,
            caption.probability(),
            caption.token_ids
        );
    }
    Ok(())
}
