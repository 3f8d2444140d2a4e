//! Frame sequences: ordered image/annotation-file pairs.

use std::path::{Path, PathBuf};

use crate::constants::{ANNOTATION_EXTENSION, IMAGE_EXTENSIONS};
use crate::format::error::FormatError;
use crate::format::frame_json;
use crate::model::Annotation;

/// Provides frames to the editor.
///
/// Index `i` always refers to the same image and annotation file for the
/// lifetime of the source.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    /// Short human-readable name for frame `index`.
    fn frame_name(&self, index: usize) -> String;

    /// Pixel dimensions of the frame image.
    fn image_size(&self, index: usize) -> Result<(u32, u32), FormatError>;

    fn load_annotations(&self, index: usize) -> Result<Vec<Annotation>, FormatError>;

    /// Number of stored entries for a frame, used by cross-frame navigation.
    fn count_annotations(&self, index: usize) -> Result<usize, FormatError> {
        self.load_annotations(index).map(|anns| anns.len())
    }

    fn save_annotations(
        &mut self,
        index: usize,
        annotations: &[Annotation],
    ) -> Result<(), FormatError>;
}

/// One image and the annotation file that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePair {
    pub image: PathBuf,
    pub annotations: PathBuf,
}

/// Pair images with annotation files.
///
/// Both lists are sorted by file name first. Each image is matched with the
/// first annotation file whose stem contains the image's stem; images
/// without a match are skipped.
pub fn match_pairs(mut images: Vec<PathBuf>, mut annotations: Vec<PathBuf>) -> Vec<FramePair> {
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    annotations.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut pairs = Vec::new();
    for image in images {
        let Some(stem) = file_stem(&image) else {
            continue;
        };
        let matched = annotations
            .iter()
            .find(|json| file_stem(json).is_some_and(|s| s.contains(stem)));
        match matched {
            Some(json) => pairs.push(FramePair {
                image,
                annotations: json.clone(),
            }),
            None => log::debug!("No annotation file for {}", image.display()),
        }
    }
    pairs
}

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// List regular files in `dir` with one of the given extensions.
fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, FormatError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Frames backed by an image folder and an annotation folder.
#[derive(Debug, Clone)]
pub struct FsFrameSource {
    pairs: Vec<FramePair>,
}

impl FsFrameSource {
    pub fn new(pairs: Vec<FramePair>) -> Self {
        Self { pairs }
    }

    /// Scan both folders and pair their files. Finding no pairs is an error.
    pub fn discover(image_dir: &Path, annotation_dir: &Path) -> Result<Self, FormatError> {
        let images = list_files(image_dir, IMAGE_EXTENSIONS)?;
        let annotations = list_files(annotation_dir, &[ANNOTATION_EXTENSION])?;
        log::debug!(
            "Found {} images and {} annotation files",
            images.len(),
            annotations.len()
        );

        let pairs = match_pairs(images, annotations);
        if pairs.is_empty() {
            return Err(FormatError::NoFramePairs {
                images: image_dir.to_path_buf(),
                annotations: annotation_dir.to_path_buf(),
            });
        }
        log::info!("Discovered {} frames", pairs.len());
        Ok(Self::new(pairs))
    }

    pub fn pairs(&self) -> &[FramePair] {
        &self.pairs
    }

    fn pair(&self, index: usize) -> Result<&FramePair, FormatError> {
        self.pairs.get(index).ok_or(FormatError::FrameOutOfRange {
            index,
            count: self.pairs.len(),
        })
    }
}

impl FrameSource for FsFrameSource {
    fn frame_count(&self) -> usize {
        self.pairs.len()
    }

    fn frame_name(&self, index: usize) -> String {
        self.pairs
            .get(index)
            .and_then(|pair| pair.image.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn image_size(&self, index: usize) -> Result<(u32, u32), FormatError> {
        Ok(image::image_dimensions(&self.pair(index)?.image)?)
    }

    fn load_annotations(&self, index: usize) -> Result<Vec<Annotation>, FormatError> {
        frame_json::read_file(&self.pair(index)?.annotations)
    }

    fn count_annotations(&self, index: usize) -> Result<usize, FormatError> {
        frame_json::count_file(&self.pair(index)?.annotations)
    }

    fn save_annotations(
        &mut self,
        index: usize,
        annotations: &[Annotation],
    ) -> Result<(), FormatError> {
        let path = &self.pair(index)?.annotations;
        frame_json::write_file(path, annotations)?;
        log::debug!("Wrote {} annotations to {}", annotations.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_match_pairs_by_stem() {
        let pairs = match_pairs(
            paths(&["img/frame_002.png", "img/frame_001.jpg", "img/orphan.jpg"]),
            paths(&["ann/frame_002_boxes.json", "ann/frame_001.json"]),
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].image, PathBuf::from("img/frame_001.jpg"));
        assert_eq!(pairs[0].annotations, PathBuf::from("ann/frame_001.json"));
        assert_eq!(pairs[1].annotations, PathBuf::from("ann/frame_002_boxes.json"));
    }

    #[test]
    fn test_match_pairs_takes_first_sorted_match() {
        // "frame_1" is contained in both stems
        let pairs = match_pairs(
            paths(&["frame_1.png"]),
            paths(&["frame_12.json", "frame_1.json"]),
        );
        assert_eq!(pairs[0].annotations, PathBuf::from("frame_1.json"));
    }

    #[test]
    fn test_discover_reads_folders() {
        let images = tempfile::tempdir().unwrap();
        let jsons = tempfile::tempdir().unwrap();

        image::RgbImage::new(64, 48)
            .save(images.path().join("a.png"))
            .unwrap();
        std::fs::write(images.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(
            jsons.path().join("a.json"),
            r#"[{"box": [1, 1, 10, 10], "class": "Car"}]"#,
        )
        .unwrap();

        let mut source = FsFrameSource::discover(images.path(), jsons.path()).unwrap();
        assert_eq!(source.frame_count(), 1);
        assert_eq!(source.frame_name(0), "a.png");
        assert_eq!(source.image_size(0).unwrap(), (64, 48));
        assert_eq!(source.count_annotations(0).unwrap(), 1);

        let anns = vec![Annotation::new(BBox::new(2.0, 2.0, 20.0, 20.0), "Bus")];
        source.save_annotations(0, &anns).unwrap();
        assert_eq!(source.load_annotations(0).unwrap(), anns);

        assert!(matches!(
            source.load_annotations(3),
            Err(FormatError::FrameOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_discover_without_pairs() {
        let images = tempfile::tempdir().unwrap();
        let jsons = tempfile::tempdir().unwrap();
        assert!(matches!(
            FsFrameSource::discover(images.path(), jsons.path()),
            Err(FormatError::NoFramePairs { .. })
        ));
    }
}
