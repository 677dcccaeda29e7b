use std::path::{Path, PathBuf};

use image::GrayImage;
use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::annotation::{self, AnnotationRecord};
use crate::error::{Error, Result};
use crate::eros::Eros;
use crate::event_log;
use crate::skeleton::{normalized_center, normalized_keypoints};
use crate::skeleton_log;
use crate::sync::StreamAligner;

/// Default number of warm-up frames dropped while the surface populates.
pub const DEFAULT_WARMUP_FRAMES: usize = 200;

/// Configuration surface of the export pipeline.
#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub eros_kernel: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Gaussian blur kernel size, odd. Sigma is derived from it.
    pub gauss_kernel: u32,
    /// Frames skipped between retained frames; `None` retains every frame.
    pub skip: Option<u32>,
    /// Frames dropped at the start of each sequence while the surface fills.
    pub warmup_frames: usize,
    /// Dataset root containing `yarp/` and receiving `training/`/`tester/`.
    pub data_home: PathBuf,
    pub from_scratch: bool,
    pub write_annotation: bool,
    pub write_images: bool,
    pub dev: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if self.gauss_kernel == 0 || self.gauss_kernel % 2 == 0 {
            return Err(Error::invalid_parameter(format!(
                "blur kernel must be odd and positive, got {}",
                self.gauss_kernel
            )));
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.skip.map(|s| s as usize + 1).unwrap_or(1)
    }
}

/// Blur sigma for a given odd kernel size, matching the auto rule used by
/// the usual Gaussian blur implementations: `0.3*((k-1)*0.5 - 1) + 0.8`.
pub fn gaussian_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Export a single recording: build the surface frame by frame and pair
/// every retained frame with an annotation record.
///
/// Returns the records; images are written as a side effect when enabled.
pub fn export_sequence(
    dvs_dir: &Path,
    skeleton_file: &Path,
    images_dir: &Path,
    sequence: &str,
    config: &ExportConfig,
) -> Result<Vec<AnnotationRecord>> {
    config.validate()?;

    let poses = skeleton_log::read_skeleton_log(skeleton_file)?;
    let events = event_log::read_event_log(dvs_dir)?;
    info!(
        "{}: {} events, {} skeleton samples",
        sequence,
        events.len(),
        poses.len()
    );

    let mut eros = Eros::new(config.eros_kernel, config.frame_width, config.frame_height)?;
    let stride = config.stride();
    let (w, h) = (config.frame_width, config.frame_height);

    let mut records = Vec::new();
    let mut prev_keypoints: Option<Vec<f64>> = None;
    for (fi, batch) in StreamAligner::new(events, poses).enumerate() {
        debug!("{}: frame {} ({} events)", sequence, fi, batch.events.len());
        for ev in &batch.events {
            eros.update(ev.x, ev.y)?;
        }

        if fi < config.warmup_frames {
            // Surface still filling up; only track the pose for keypoints_prev
            prev_keypoints = Some(normalized_keypoints(&batch.pose, w, h));
            continue;
        }
        if fi % stride != 0 {
            continue;
        }

        let keypoints = normalized_keypoints(&batch.pose, w, h);
        let img_name = format!("{}_{}.png", sequence, fi);

        if config.write_images {
            let frame = GrayImage::from_raw(w, h, eros.get_frame())
                .expect("surface length matches frame dimensions");
            let blurred = image::imageops::blur(&frame, gaussian_sigma(config.gauss_kernel));
            blurred.save(images_dir.join(&img_name))?;
        }

        records.push(AnnotationRecord {
            img_name,
            ts: batch.timestamp,
            keypoints: keypoints.clone(),
            center: normalized_center(&batch.pose, w, h),
            keypoints_prev: prev_keypoints.take().unwrap_or_else(|| keypoints.clone()),
            original_sample: sequence.to_string(),
        });
        prev_keypoints = Some(keypoints);
    }
    Ok(records)
}

/// Export every recording under `<data_home>/yarp/`.
///
/// Each sequence directory holds the event log at `ch0dvs/` and the skeleton
/// ground truth at `ch<cam>GT50Hzskeleton/data.log`, with the camera channel
/// taken from the fourth character of the sequence name. A sequence with a
/// missing input is warned and skipped; malformed data aborts the run.
/// Returns the number of exported sequences.
pub fn run(config: &ExportConfig) -> Result<usize> {
    config.validate()?;

    let split = if config.dev { "tester" } else { "training" };
    let images_dir = config.data_home.join(split).join("h36m_EROS");
    let anno_dir = config.data_home.join(split).join("h36m_anno");
    std::fs::create_dir_all(&images_dir)?;
    std::fs::create_dir_all(&anno_dir)?;
    let json_path = anno_dir.join("poses.json");

    let input_dir = config.data_home.join("yarp");
    if !input_dir.is_dir() {
        return Err(Error::MissingInput(input_dir));
    }
    let mut sequences: Vec<String> = std::fs::read_dir(&input_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    sequences.sort();

    let bar = ProgressBar::new(sequences.len() as u64);
    let mut from_scratch = config.from_scratch;
    let mut exported = 0;
    for sequence in &sequences {
        bar.inc(1);

        let Some(cam) = sequence.chars().nth(3) else {
            warn!("{}: name too short to carry a camera channel, skipping", sequence);
            continue;
        };
        let dvs_dir = input_dir.join(sequence).join("ch0dvs");
        let skeleton_file = input_dir
            .join(sequence)
            .join(format!("ch{}GT50Hzskeleton", cam))
            .join("data.log");

        let records = match export_sequence(&dvs_dir, &skeleton_file, &images_dir, sequence, config)
        {
            Ok(records) => records,
            Err(Error::MissingInput(path)) => {
                warn!("{}: missing input {}, skipping", sequence, path.display());
                continue;
            }
            Err(e) => return Err(e),
        };

        if config.write_annotation {
            if from_scratch || !json_path.is_file() {
                annotation::write_new(&json_path, &records)?;
                from_scratch = false;
            } else {
                annotation::append(&json_path, &records)?;
            }
        }
        exported += 1;
        info!("{}: exported {} frames", sequence, records.len());

        if config.dev {
            break;
        }
    }
    bar.finish();
    Ok(exported)
}
