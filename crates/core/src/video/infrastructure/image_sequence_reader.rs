use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, FrameSourceError};

/// Reads a directory of still images as a frame sequence.
///
/// Files are ordered by name and decoded lazily to RGB with the `image`
/// crate. Every image must match the configured size.
pub struct ImageSequenceReader {
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequenceReader {
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self, FrameSourceError> {
        let entries = fs::read_dir(dir).map_err(|source| FrameSourceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| FrameSourceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(FrameSourceError::Empty(dir.to_path_buf()));
        }
        paths.sort();
        log::info!("Found {} images in {}", paths.len(), dir.display());
        Ok(Self {
            paths,
            width,
            height,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read(&self, index: usize, path: &Path) -> Result<Frame, FrameSourceError> {
        let img = image::open(path)
            .map_err(|source| FrameSourceError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgb8();
        if img.width() != self.width || img.height() != self.height {
            return Err(FrameSourceError::DimensionMismatch {
                path: path.to_path_buf(),
                expected_width: self.width,
                expected_height: self.height,
                actual_width: img.width(),
                actual_height: img.height(),
            });
        }
        Ok(Frame::new(img.into_raw(), self.width, self.height, 3, index))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceReader {
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_> {
        Box::new(
            self.paths
                .iter()
                .enumerate()
                .map(|(i, path)| self.read(i, path)),
        )
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.paths.len())
    }
}

/// `count` black frames of a fixed size.
pub struct BlankFrameSource {
    count: usize,
    width: u32,
    height: u32,
}

impl BlankFrameSource {
    pub fn new(count: usize, width: u32, height: u32) -> Self {
        Self {
            count,
            width,
            height,
        }
    }
}

impl FrameSource for BlankFrameSource {
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, FrameSourceError>> + '_> {
        let (width, height) = (self.width, self.height);
        Box::new((0..self.count).map(move |i| Ok(Frame::blank(width, height, i))))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.count)
    }
}
