//! Discovering the videos of a batch.
//!
//! [`VideoEnumerator`] describes *where* to look; every call to
//! [`VideoEnumerator::iter`] starts a fresh, lazy walk. Directories are read
//! one at a time as the walk reaches them and their entries are sorted, so
//! two walks over an unchanged tree yield the same sequence.

use std::{
    ffi::OsStr,
    fs::{self, FileType},
    path::{Path, PathBuf},
};

use crate::error::SharpFramesError;

/// File extensions treated as videos when walking a directory.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg", "mpg", "mts", "ogv", "ts",
    "webm", "wmv",
];

/// Whether `path` carries one of the [`VIDEO_EXTENSIONS`], ignoring case.
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// A candidate video discovered by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VideoFile {
    path: PathBuf,
}

impl VideoFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its extension, used to name output images.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string())
    }
}

/// The input side of a batch: a directory (optionally walked recursively)
/// or a single file.
#[derive(Debug, Clone)]
pub struct VideoEnumerator {
    root: PathBuf,
    recursive: bool,
}

impl VideoEnumerator {
    /// # Errors
    ///
    /// Returns [`SharpFramesError::NotFound`] if `root` does not exist.
    pub fn new<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Self, SharpFramesError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(SharpFramesError::NotFound(root));
        }
        Ok(Self { root, recursive })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new walk.
    ///
    /// A file root yields exactly that file, whatever its extension. A
    /// directory root yields its video files in path order, descending into
    /// subdirectories only when recursive.
    pub fn iter(&self) -> VideoFiles {
        let mut walk = VideoFiles {
            pending: Vec::new(),
            directories: Vec::new(),
            recursive: self.recursive,
        };
        if self.root.is_file() {
            walk.pending.push(VideoFile::new(&self.root));
        } else {
            walk.directories.push(self.root.clone());
        }
        walk
    }
}

impl<'a> IntoIterator for &'a VideoEnumerator {
    type Item = VideoFile;
    type IntoIter = VideoFiles;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator returned by [`VideoEnumerator::iter`].
#[derive(Debug)]
pub struct VideoFiles {
    /// Videos of the directory being drained, in reverse order.
    pending: Vec<VideoFile>,
    /// Directories still to read, in reverse order.
    directories: Vec<PathBuf>,
    recursive: bool,
}

impl VideoFiles {
    /// Read one directory, queueing its videos and (when recursive) its
    /// subdirectories. Subdirectories are visited after the directory's own
    /// files.
    fn read_directory(&mut self, directory: &Path) {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(error) => {
                log::warn!("Cannot read directory '{}': {error}", directory.display());
                return;
            }
        };

        let mut children: Vec<(PathBuf, FileType)> = entries
            .filter_map(|entry| {
                match entry.and_then(|entry| Ok((entry.path(), entry.file_type()?))) {
                    Ok(child) => Some(child),
                    Err(error) => {
                        log::warn!(
                            "Skipping unreadable entry in '{}': {error}",
                            directory.display()
                        );
                        None
                    }
                }
            })
            .collect();
        children.sort_by(|(left, _), (right, _)| left.cmp(right));

        let mut subdirectories = Vec::new();
        for (path, file_type) in children {
            // Symlinked directories are never entered, so a link to an
            // ancestor cannot loop the walk. Symlinked files are followed.
            if file_type.is_dir() {
                if self.recursive {
                    subdirectories.push(path);
                } else {
                    log::debug!("'{}' is a directory, not descending", path.display());
                }
            } else if file_type.is_symlink() && path.is_dir() {
                log::debug!("'{}' is a directory symlink, not descending", path.display());
            } else if path.is_file() && has_video_extension(&path) {
                self.pending.push(VideoFile::new(path));
            } else {
                log::debug!("'{}' is not a video file", path.display());
            }
        }

        self.pending.reverse();
        subdirectories.reverse();
        self.directories.extend(subdirectories);
    }
}

impl Iterator for VideoFiles {
    type Item = VideoFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(video) = self.pending.pop() {
                return Some(video);
            }
            let directory = self.directories.pop()?;
            self.read_directory(&directory);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_video_extensions_case_insensitively() {
        assert!(has_video_extension(Path::new("a.mp4")));
        assert!(has_video_extension(Path::new("clips/B.MKV")));
        assert!(!has_video_extension(Path::new("notes.txt")));
        assert!(!has_video_extension(Path::new("mp4")));
    }

    #[test]
    fn stem_drops_directory_and_extension() {
        assert_eq!(VideoFile::new("videos/holiday.clip.mp4").stem(), "holiday.clip");
    }

    #[test]
    fn missing_root_is_not_found() {
        let result = VideoEnumerator::new("definitely/not/here", false);
        assert!(matches!(result, Err(SharpFramesError::NotFound(_))));
    }
}
