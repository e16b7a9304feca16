use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use ndarray::{ArrayD, IxDyn};

/// Parses `1,346,346,3` style shapes.
pub fn parse_shape(raw: &str) -> Result<Vec<usize>> {
    let dims = raw
        .split(',')
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .with_context(|| format!("invalid dimension {d:?} in shape {raw:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(!dims.is_empty(), "shape must have at least one dimension");
    ensure!(dims.iter().all(|&d| d > 0), "shape {raw:?} has a zero dimension");
    Ok(dims)
}

/// Reads an image tensor stored as whitespace-separated floats.
pub fn load_image_tensor(path: &Path, shape: &[usize]) -> Result<ArrayD<f32>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let values = content
        .split_whitespace()
        .map(|v| {
            v.parse::<f32>()
                .with_context(|| format!("invalid value {v:?} in {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let expected: usize = shape.iter().product();
    if values.len() != expected {
        bail!(
            "{} holds {} values but shape {:?} needs {}",
            path.display(),
            values.len(),
            shape,
            expected
        );
    }
    Ok(ArrayD::from_shape_vec(IxDyn(shape), values)?)
}
