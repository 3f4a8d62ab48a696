//! Writing accepted frames to disk.
//!
//! File names depend only on the source video's stem and the frame index
//! (`<stem>_<index:04>.<ext>`), so rerunning a batch overwrites the same
//! files instead of accumulating new ones. Directories are created on the
//! first write, so a batch that writes nothing leaves no trace.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use image::DynamicImage;

use crate::{
    configuration::{Configuration, ImageFormat, OutputLayout},
    enumerator::VideoFile,
    error::SharpFramesError,
};

/// File name for frame `index` of a video with the given stem.
pub fn frame_file_name(stem: &str, index: u64, format: ImageFormat) -> String {
    format!("{stem}_{index:04}.{}", format.extension())
}

/// Writes frames under an output root.
#[derive(Debug, Clone)]
pub struct ImageWriter {
    root: PathBuf,
    layout: OutputLayout,
    format: ImageFormat,
}

impl ImageWriter {
    pub fn new<P: AsRef<Path>>(root: P, layout: OutputLayout, format: ImageFormat) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            layout,
            format,
        }
    }

    pub fn from_configuration(config: &Configuration) -> Self {
        Self::new(&config.output, config.layout, config.image_format)
    }

    /// Directory that receives the frames of `video`.
    pub fn directory_for(&self, video: &VideoFile) -> PathBuf {
        match self.layout {
            OutputLayout::Flat => self.root.clone(),
            OutputLayout::Nested => self.root.join(video.stem()),
        }
    }

    /// Full destination path of frame `index` of `video`.
    pub fn path_for(&self, video: &VideoFile, index: u64) -> PathBuf {
        self.directory_for(video)
            .join(frame_file_name(&video.stem(), index, self.format))
    }

    /// Encode `image` and write it, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`SharpFramesError::WriteError`] if the directory cannot be
    /// created or the image cannot be encoded or written.
    pub fn write(
        &self,
        video: &VideoFile,
        index: u64,
        image: &DynamicImage,
    ) -> Result<PathBuf, SharpFramesError> {
        let directory = self.directory_for(video);
        fs::create_dir_all(&directory).map_err(|error| SharpFramesError::WriteError {
            path: directory.clone(),
            reason: error.to_string(),
        })?;

        let path = self.path_for(video, index);
        let encodable = match (self.format, image) {
            // JPEG has no alpha channel.
            (ImageFormat::Jpeg, DynamicImage::ImageRgba8(_)) => {
                Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
            }
            _ => Cow::Borrowed(image),
        };

        encodable
            .save_with_format(&path, self.format.to_encoded_format())
            .map_err(|error| SharpFramesError::WriteError {
                path: path.clone(),
                reason: error.to_string(),
            })?;

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
