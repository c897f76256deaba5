// Copyright @yucwang 2026

use crate::core::transfer::{correct_opacity, StepSampler};
use crate::math::constants::{Float, Vector3f, Vector4f};
use crate::volumes::label_volume::LabelVolume;

/// Class stored in a label volume voxel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Label {
    Empty,
    Risk,
    Target,
    /// Reserved marker, only the UI palette gives it a colour of its own.
    Sentinel,
    Unknown(u8),
}

impl From<u8> for Label {
    fn from(value: u8) -> Self {
        match value {
            0 => Label::Empty,
            1 => Label::Risk,
            2 => Label::Target,
            255 => Label::Sentinel,
            other => Label::Unknown(other),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LabelPalette {
    Render,
    Ui,
}

impl LabelPalette {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "render" => Some(LabelPalette::Render),
            "ui" => Some(LabelPalette::Ui),
            _ => None,
        }
    }
}

const TRANSPARENT: [Float; 4] = [0.0, 0.0, 0.0, 0.0];
const RISK_RED: [Float; 4] = [1.0, 0.0, 0.0, 0.5];
const TARGET_GREEN: [Float; 4] = [0.0, 1.0, 0.0, 0.5];
const SENTINEL_BLUE: [Float; 4] = [0.0, 0.0, 1.0, 1.0];
// Unrecognised labels are painted opaque so bad data never disappears silently.
const UNKNOWN_BLACK: [Float; 4] = [0.0, 0.0, 0.0, 1.0];

impl Label {
    pub fn color(self, palette: LabelPalette) -> Vector4f {
        let rgba = match (self, palette) {
            (Label::Empty, _) => TRANSPARENT,
            (Label::Risk, _) => RISK_RED,
            (Label::Target, _) => TARGET_GREEN,
            (Label::Sentinel, LabelPalette::Ui) => SENTINEL_BLUE,
            (Label::Sentinel, LabelPalette::Render) => UNKNOWN_BLACK,
            (Label::Unknown(_), _) => UNKNOWN_BLACK,
        };
        Vector4f::from(rgba)
    }
}

/// Discrete label discipline: nearest-voxel read, palette lookup, opacity correction.
pub struct LabelClassifier<'a> {
    pub volume: &'a LabelVolume,
    pub palette: LabelPalette,
}

impl<'a> LabelClassifier<'a> {
    pub fn classify(&self, uvw: Vector3f) -> Label {
        Label::from(self.volume.label_at(uvw))
    }
}

impl<'a> StepSampler for LabelClassifier<'a> {
    fn sample(&self, uvw: Vector3f, step: Float) -> Vector4f {
        let color = self.classify(uvw).color(self.palette);
        Vector4f::new(color.x, color.y, color.z, correct_opacity(color.w, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_palette() {
        let p = LabelPalette::Render;
        assert_eq!(Label::from(0).color(p), Vector4f::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(Label::from(1).color(p), Vector4f::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(Label::from(2).color(p), Vector4f::new(0.0, 1.0, 0.0, 0.5));
        for value in 3..=255u8 {
            assert_eq!(Label::from(value).color(p), Vector4f::new(0.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn ui_palette() {
        let p = LabelPalette::Ui;
        assert_eq!(Label::from(1).color(p), Vector4f::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(Label::from(255).color(p), Vector4f::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(Label::from(7).color(p), Vector4f::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(Label::from(254).color(p), Vector4f::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn label_from_u8() {
        assert_eq!(Label::from(0), Label::Empty);
        assert_eq!(Label::from(255), Label::Sentinel);
        assert_eq!(Label::from(42), Label::Unknown(42));
        assert_eq!(LabelPalette::from_name("ui"), Some(LabelPalette::Ui));
        assert_eq!(LabelPalette::from_name("debug"), None);
    }

    #[test]
    fn classifier_is_deterministic_and_corrects_opacity() {
        let volume = LabelVolume::from_data(2, 1, 1, vec![1, 9]).expect("labels");
        let classifier = LabelClassifier { volume: &volume, palette: LabelPalette::Render };
        let uvw = Vector3f::new(0.1, 0.5, 0.5);
        let first = classifier.sample(uvw, 1.0);
        for _ in 0..10 {
            assert_eq!(classifier.sample(uvw, 1.0), first);
        }
        assert_eq!(first, Vector4f::new(1.0, 0.0, 0.0, 0.5));
        assert!((classifier.sample(uvw, 2.0).w - 0.75).abs() < 1e-6);

        let unknown = classifier.sample(Vector3f::new(0.9, 0.5, 0.5), 0.5);
        assert_eq!(unknown, Vector4f::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn classifier_boundary_selects_one_neighbour() {
        let volume = LabelVolume::from_data(2, 1, 1, vec![1, 2]).expect("labels");
        let classifier = LabelClassifier { volume: &volume, palette: LabelPalette::Render };
        let sample = classifier.sample(Vector3f::new(0.5, 0.0, 0.0), 1.0);
        assert!(sample == Vector4f::from(RISK_RED) || sample == Vector4f::from(TARGET_GREEN));
    }
}
