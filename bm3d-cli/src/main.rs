use bm3d_line::plane::io::{load_gray_plane, save_gray_plane};
use bm3d_line::{
    Bm3dConfig, Denoiser, DistanceMetric, GroupWeighting, GroupingMode, NoiseParams, OwnedPlane,
    PlaneView, Precision, SearchWindow, Shrinkage, Stage, StageTimings,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Streaming BM3D denoiser (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum InputFormat {
    /// Raw planar 8-bit luma frames.
    Yuv400,
    /// Raw planar 8-bit Y, U and V frames.
    Yuv444,
    /// A single image file decoded to grayscale.
    Image,
}

impl InputFormat {
    fn planes(self) -> usize {
        match self {
            Self::Yuv444 => 3,
            Self::Yuv400 | Self::Image => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum MetricConfig {
    SquaredL2,
    AbsoluteL1,
}

impl From<MetricConfig> for DistanceMetric {
    fn from(value: MetricConfig) -> Self {
        match value {
            MetricConfig::SquaredL2 => DistanceMetric::SquaredL2,
            MetricConfig::AbsoluteL1 => DistanceMetric::AbsoluteL1,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum WeightingConfig {
    Uniform,
    InverseNonzero,
}

impl From<WeightingConfig> for GroupWeighting {
    fn from(value: WeightingConfig) -> Self {
        match value {
            WeightingConfig::Uniform => GroupWeighting::Uniform,
            WeightingConfig::InverseNonzero => GroupWeighting::InverseNonzero,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum PrecisionConfig {
    Fixed,
    Float,
}

impl From<PrecisionConfig> for Precision {
    fn from(value: PrecisionConfig) -> Self {
        match value {
            PrecisionConfig::Fixed => Precision::Fixed,
            PrecisionConfig::Float => Precision::Float,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum GroupingConfig {
    SharedLuma,
    PerChannel,
}

impl From<GroupingConfig> for GroupingMode {
    fn from(value: GroupingConfig) -> Self {
        match value {
            GroupingConfig::SharedLuma => GroupingMode::SharedLuma,
            GroupingConfig::PerChannel => GroupingMode::PerChannel,
        }
    }
}

/// Settings of one filtering pass.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
struct PassConfigJson {
    /// Defaults to the pass's own group size (16 hard, 32 Wiener).
    #[serde(skip_serializing_if = "Option::is_none")]
    max_group_size: Option<usize>,
    patch_step: usize,
    search_radius_h: usize,
    search_step_h: usize,
    search_radius_v: usize,
    search_step_v: usize,
    metric: MetricConfig,
    weighting: WeightingConfig,
    precision: PrecisionConfig,
    grouping: GroupingConfig,
    parallel: bool,
    workers: usize,
    /// Overrides the top-level luma sigma for this pass.
    sigma: Option<f64>,
    /// Overrides the chroma sigma for this pass.
    chroma_sigma: Option<f64>,
    max_mean_distance: u64,
    /// Overrides the admission limit of the chroma planes.
    chroma_max_mean_distance: Option<u64>,
}

impl PassConfigJson {
    fn from_config(cfg: &Bm3dConfig) -> Self {
        Self {
            max_group_size: Some(cfg.max_group_size),
            patch_step: cfg.patch_step,
            search_radius_h: cfg.search.radius_h,
            search_step_h: cfg.search.step_h,
            search_radius_v: cfg.search.radius_v,
            search_step_v: cfg.search.step_v,
            metric: MetricConfig::SquaredL2,
            weighting: WeightingConfig::Uniform,
            precision: PrecisionConfig::Fixed,
            grouping: GroupingConfig::SharedLuma,
            parallel: cfg.parallel,
            workers: cfg.workers,
            sigma: None,
            chroma_sigma: None,
            max_mean_distance: NoiseParams::default().max_mean_distance[0],
            chroma_max_mean_distance: None,
        }
    }

    fn to_config(
        &self,
        width: usize,
        height: usize,
        channels: usize,
        shrinkage: Shrinkage,
    ) -> Bm3dConfig {
        let base = match shrinkage {
            Shrinkage::HardThreshold => Bm3dConfig::new(width, height),
            Shrinkage::Wiener => Bm3dConfig::wiener(width, height),
        };
        Bm3dConfig {
            max_group_size: self.max_group_size.unwrap_or(base.max_group_size),
            patch_step: self.patch_step,
            search: SearchWindow {
                radius_h: self.search_radius_h,
                step_h: self.search_step_h,
                radius_v: self.search_radius_v,
                step_v: self.search_step_v,
            },
            metric: self.metric.into(),
            shrinkage,
            weighting: self.weighting.into(),
            precision: self.precision.into(),
            channels,
            grouping: self.grouping.into(),
            parallel: self.parallel,
            workers: self.workers,
            ..base
        }
    }

    fn noise(&self, sigma: f64, chroma_sigma: Option<f64>, channels: usize) -> NoiseParams {
        let luma = self.sigma.unwrap_or(sigma);
        let chroma = self.chroma_sigma.or(chroma_sigma).unwrap_or(luma);
        let mut sigmas = vec![chroma; channels];
        sigmas[0] = luma;
        let chroma_limit = self
            .chroma_max_mean_distance
            .unwrap_or(self.max_mean_distance);
        let mut limits = vec![chroma_limit; channels];
        limits[0] = self.max_mean_distance;
        NoiseParams::per_channel(sigmas).with_channel_max_mean_distance(limits)
    }
}

impl Default for PassConfigJson {
    fn default() -> Self {
        Self {
            max_group_size: None,
            ..Self::from_config(&Bm3dConfig::default())
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
struct Config {
    input_path: String,
    format: InputFormat,
    /// Frame size for raw input; ignored for images.
    width: usize,
    height: usize,
    /// Number of frames to process; 0 processes the whole file.
    frames: usize,
    output_path: Option<String>,
    /// Clean input in the same format, used for PSNR reporting.
    reference_path: Option<String>,
    sigma: f64,
    chroma_sigma: Option<f64>,
    two_pass: bool,
    hard: PassConfigJson,
    wiener: PassConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            format: InputFormat::Yuv400,
            width: 0,
            height: 0,
            frames: 0,
            output_path: None,
            reference_path: None,
            sigma: 10.0,
            chroma_sigma: None,
            two_pass: true,
            hard: PassConfigJson::default(),
            wiener: PassConfigJson::default(),
        }
    }
}

impl Config {
    fn example() -> Self {
        Self {
            input_path: "noisy_352x288.yuv".to_string(),
            width: 352,
            height: 288,
            output_path: Some("denoised_352x288.yuv".to_string()),
            reference_path: Some("clean_352x288.yuv".to_string()),
            hard: PassConfigJson::from_config(&Bm3dConfig::new(0, 0)),
            wiener: PassConfigJson::from_config(&Bm3dConfig::wiener(0, 0)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    index: usize,
    psnr_noisy: Option<f64>,
    psnr_denoised: Option<f64>,
}

#[derive(Debug, Serialize)]
struct Output {
    width: usize,
    height: usize,
    channels: usize,
    passes: usize,
    frames: Vec<FrameRecord>,
    mean_psnr: Option<f64>,
    mean_group_size: f64,
    timings_ms: BTreeMap<&'static str, f64>,
}

type Frame = Vec<OwnedPlane>;

/// Reads every frame of `path`, returning them with the frame size.
fn read_frames(
    path: &str,
    format: InputFormat,
    width: usize,
    height: usize,
    limit: usize,
) -> Result<(Vec<Frame>, usize, usize), Box<dyn std::error::Error>> {
    if format == InputFormat::Image {
        let plane = load_gray_plane(path)?;
        let (w, h) = (plane.width(), plane.height());
        return Ok((vec![vec![plane]], w, h));
    }
    if width == 0 || height == 0 {
        return Err("width and height must be set for raw input".into());
    }
    let bytes = fs::read(path)?;
    let plane_len = width * height;
    let frame_len = plane_len * format.planes();
    if bytes.len() % frame_len != 0 {
        return Err(format!(
            "{path}: {} bytes is not a whole number of {frame_len}-byte frames",
            bytes.len()
        )
        .into());
    }
    let count = match limit {
        0 => bytes.len() / frame_len,
        n => n.min(bytes.len() / frame_len),
    };
    let mut frames = Vec::with_capacity(count);
    for frame in bytes.chunks_exact(frame_len).take(count) {
        let planes = frame
            .chunks_exact(plane_len)
            .map(|p| OwnedPlane::from_u8(p, width, height))
            .collect::<Result<Vec<_>, _>>()?;
        frames.push(planes);
    }
    Ok((frames, width, height))
}

fn psnr(a: &[OwnedPlane], b: &[OwnedPlane]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (pa, pb) in a.iter().zip(b) {
        for (&x, &y) in pa.data().iter().zip(pb.data()) {
            let d = f64::from(x) - f64::from(y);
            sum += d * d;
            count += 1;
        }
    }
    let mse = sum / count.max(1) as f64;
    if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (255.0 * 255.0 / mse).log10()
    }
}

fn views(frame: &[OwnedPlane]) -> Vec<PlaneView<'_, u16>> {
    frame.iter().map(OwnedPlane::view).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("bm3d_line=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{}", serde_json::to_string_pretty(&Config::example())?);
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.input_path.is_empty() {
        return Err("input_path must be set in the config".into());
    }

    let (noisy, width, height) = read_frames(
        &config.input_path,
        config.format,
        config.width,
        config.height,
        config.frames,
    )?;
    let reference = match &config.reference_path {
        Some(path) => Some(read_frames(path, config.format, width, height, config.frames)?.0),
        None => None,
    };
    let channels = config.format.planes();

    let timings = Arc::new(StageTimings::new());
    let mut hard = Denoiser::new(config.hard.to_config(
        width,
        height,
        channels,
        Shrinkage::HardThreshold,
    ))?;
    hard.set_observer(timings.clone());
    let hard_noise = config
        .hard
        .noise(config.sigma, config.chroma_sigma, channels);

    let mut wiener = if config.two_pass {
        let mut denoiser =
            Denoiser::new(config.wiener.to_config(width, height, channels, Shrinkage::Wiener))?;
        denoiser.set_observer(timings.clone());
        Some(denoiser)
    } else {
        None
    };
    let wiener_noise = config
        .wiener
        .noise(config.sigma, config.chroma_sigma, channels);

    let mut records = Vec::with_capacity(noisy.len());
    let mut raw_out = Vec::new();
    for (index, frame) in noisy.iter().enumerate() {
        let noisy_views = views(frame);
        let basic = hard.denoise(&noisy_views, None, &hard_noise)?;
        let denoised = match wiener.as_mut() {
            Some(wiener) => {
                let basic_views = views(&basic);
                wiener.denoise(&noisy_views, Some(&basic_views), &wiener_noise)?
            }
            None => basic,
        };

        let clean = reference.as_ref().and_then(|r| r.get(index));
        let record = FrameRecord {
            index,
            psnr_noisy: clean.map(|c| psnr(frame, c)),
            psnr_denoised: clean.map(|c| psnr(&denoised, c)),
        };
        tracing::info!(
            frame = index,
            psnr = record.psnr_denoised.unwrap_or(f64::NAN),
            "frame denoised"
        );
        records.push(record);

        match (&config.output_path, config.format) {
            (Some(path), InputFormat::Image) => save_gray_plane(path, &denoised[0])?,
            (Some(_), _) => {
                for plane in &denoised {
                    raw_out.extend(plane.to_u8());
                }
            }
            (None, _) => {}
        }
    }
    if let (Some(path), false) = (&config.output_path, config.format == InputFormat::Image) {
        fs::write(path, &raw_out)?;
    }

    let scored: Vec<f64> = records.iter().filter_map(|r| r.psnr_denoised).collect();
    let mean_psnr = if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    };
    let timings_ms = Stage::ALL
        .iter()
        .map(|&stage| (stage.name(), timings.total(stage).as_secs_f64() * 1e3))
        .collect();
    let output = Output {
        width,
        height,
        channels,
        passes: if config.two_pass { 2 } else { 1 },
        frames: records,
        mean_psnr,
        mean_group_size: timings.mean_group_size(),
        timings_ms,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
