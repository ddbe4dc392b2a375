use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which face-proposal backend the region detector runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    HogSvm,
    #[default]
    Haar,
    Mtcnn,
}

impl DetectorKind {
    pub const ALL: &[DetectorKind] = &[DetectorKind::HogSvm, DetectorKind::Haar, DetectorKind::Mtcnn];

    /// HOG/SVM and Haar cascades work on luma; the CNN cascade wants colour.
    pub fn uses_grayscale(self) -> bool {
        !matches!(self, DetectorKind::Mtcnn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetectorKind::HogSvm => "hog_svm",
            DetectorKind::Haar => "haar",
            DetectorKind::Mtcnn => "mtcnn",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::HogSvm => write!(f, "HOG-SVM"),
            DetectorKind::Haar => write!(f, "Haar cascade"),
            DetectorKind::Mtcnn => write!(f, "MTCNN"),
        }
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectorKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown detector '{s}' (expected hog_svm, haar or mtcnn)"))
    }
}

/// Which landmark regressor each model slot is built with.
///
/// Opaque to the pool; only the model factory interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkDetectorKind {
    Clm,
    Clnf,
    #[default]
    Ceclm,
}

impl LandmarkDetectorKind {
    pub const ALL: &[LandmarkDetectorKind] = &[
        LandmarkDetectorKind::Clm,
        LandmarkDetectorKind::Clnf,
        LandmarkDetectorKind::Ceclm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LandmarkDetectorKind::Clm => "clm",
            LandmarkDetectorKind::Clnf => "clnf",
            LandmarkDetectorKind::Ceclm => "ceclm",
        }
    }
}

impl fmt::Display for LandmarkDetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LandmarkDetectorKind::Clm => write!(f, "CLM"),
            LandmarkDetectorKind::Clnf => write!(f, "CLNF"),
            LandmarkDetectorKind::Ceclm => write!(f, "CE-CLM"),
        }
    }
}

impl FromStr for LandmarkDetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LandmarkDetectorKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown landmark detector '{s}' (expected clm, clnf or ceclm)"))
    }
}
