// Derived outputs of a selected region.
//
// From one crop we produce four artifacts:
//
// * `crop`: the pixels as selected.
// * `normalized`: every element divided by 255. Written as an image by
//   scaling back with rounding, which reproduces the crop exactly.
// * `standardized`: `(x - mean) / std` over all elements (divisor 1 when
//   the crop is flat). Written as `clamp(v * 127 + 127)`; this display
//   mapping clips and truncates, so the image cannot be turned back into
//   the values. The exact values only live in the dump.
// * `raw dump`: text with the three element lists, each headed by its
//   element count.
//
// Every artifact is written on its own; one failed write is reported and
// does not stop the others.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::error::Error;
use crate::sink::PersistenceSink;
use crate::types::{Frame, Region};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    Crop,
    Normalized,
    Standardized,
    RawDump,
    /// Coordinate report of the one-shot crop tool.
    Coordinates,
}

impl ArtifactKind {
    pub fn file_name(self, image_ext: &str) -> String {
        match self {
            ArtifactKind::Crop => format!("roi.{image_ext}"),
            ArtifactKind::Normalized => format!("roi_normalized.{image_ext}"),
            ArtifactKind::Standardized => format!("roi_standardized.{image_ext}"),
            ArtifactKind::RawDump => "processed_data.txt".to_string(),
            ArtifactKind::Coordinates => "roi_data.txt".to_string(),
        }
    }
}

/// Elements scaled into [0, 1].
pub fn normalize(samples: &[u8]) -> Vec<f64> {
    samples.iter().map(|&v| v as f64 / 255.0).collect()
}

/// Back to 8 bits. Exact inverse of [`normalize`] for 8-bit input.
pub fn denormalize(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Zero mean, unit (population) variance. Returns the values with the mean
/// and the divisor that was used.
pub fn standardize(samples: &[u8]) -> (Vec<f64>, f64, f64) {
    if samples.is_empty() {
        return (Vec::new(), 0.0, 1.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt();
    let divisor = if std > 0.0 { std } else { 1.0 };
    let values = samples.iter().map(|&v| (v as f64 - mean) / divisor).collect();
    (values, mean, divisor)
}

/// Lossy display mapping of standardized values.
pub fn standardized_display(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .map(|&v| (v * 127.0 + 127.0).clamp(0.0, 255.0) as u8)
        .collect()
}

pub struct ArtifactSet {
    pub crop: Frame,
    pub normalized: Vec<f64>,
    pub normalized_frame: Frame,
    pub standardized: Vec<f64>,
    pub standardized_frame: Frame,
}

impl ArtifactSet {
    pub fn derive(crop: Frame) -> Self {
        let samples = crop.samples();
        let (w, h, ch) = (crop.width, crop.height, crop.channels);

        let normalized = normalize(&samples);
        let normalized_frame = Frame::from_samples(w, h, ch, &denormalize(&normalized));

        let (standardized, _, _) = standardize(&samples);
        let standardized_frame = Frame::from_samples(w, h, ch, &standardized_display(&standardized));

        Self {
            crop,
            normalized,
            normalized_frame,
            standardized,
            standardized_frame,
        }
    }

    pub fn raw_dump(&self) -> String {
        fn section<T: std::fmt::Display>(out: &mut String, title: &str, values: &[T]) {
            let _ = writeln!(out, "{title}: {}", values.len());
            let line: Vec<String> = values.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }

        let mut out = String::new();
        section(&mut out, "ROI", &self.crop.samples());
        section(&mut out, "Normalized", &self.normalized);
        section(&mut out, "Standardized", &self.standardized);
        out
    }

    /// Write all four artifacts into `dir`.
    pub fn write<S: PersistenceSink + ?Sized>(&self, dir: &Path, image_ext: &str, sink: &mut S) -> SaveReport {
        let mut report = SaveReport::default();
        let path = |kind: ArtifactKind| dir.join(kind.file_name(image_ext));

        let p = path(ArtifactKind::Crop);
        report.push(ArtifactKind::Crop, sink.save_frame(&p, &self.crop), p);
        let p = path(ArtifactKind::Normalized);
        report.push(ArtifactKind::Normalized, sink.save_frame(&p, &self.normalized_frame), p);
        let p = path(ArtifactKind::Standardized);
        report.push(ArtifactKind::Standardized, sink.save_frame(&p, &self.standardized_frame), p);
        let p = path(ArtifactKind::RawDump);
        report.push(ArtifactKind::RawDump, sink.save_text(&p, &self.raw_dump()), p);
        report
    }
}

/// Crop tool output: the cropped image plus a one-line coordinate file.
pub fn write_crop_report<S: PersistenceSink + ?Sized>(
    crop: &Frame,
    region: &Region,
    dir: &Path,
    image_ext: &str,
    sink: &mut S,
) -> SaveReport {
    let mut report = SaveReport::default();
    let image_path = dir.join(format!("cropped_image.{image_ext}"));
    report.push(ArtifactKind::Crop, sink.save_frame(&image_path, crop), image_path);

    let text = format!(
        "ROI Coordinates: x={}, y={}, w={}, h={}\n",
        region.x1,
        region.y1,
        region.width(),
        region.height()
    );
    let text_path = dir.join(ArtifactKind::Coordinates.file_name(image_ext));
    report.push(ArtifactKind::Coordinates, sink.save_text(&text_path, &text), text_path);
    report
}

#[derive(Debug)]
pub struct ArtifactOutcome {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub result: Result<(), Error>,
}

#[derive(Debug, Default)]
pub struct SaveReport {
    pub outcomes: Vec<ArtifactOutcome>,
}

impl SaveReport {
    fn push(&mut self, kind: ArtifactKind, result: Result<(), Error>, path: PathBuf) {
        self.outcomes.push(ArtifactOutcome { kind, path, result });
    }

    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// One log line per artifact.
    pub fn log(&self) {
        for o in &self.outcomes {
            match &o.result {
                Ok(()) => info!("Saved {:?} to {}", o.kind, o.path.display()),
                Err(e) => error!("Failed to save {:?}: {e}", o.kind),
            }
        }
    }
}
