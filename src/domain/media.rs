//! Video media-type detection from the file extension.
//!
//! The upload gate only accepts files whose declared media type is video/*.

use std::path::Path;

/// Extensions accepted as symptom videos, with their media type.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
];

/// Media type for a video file path, or None when it is not a known video format.
pub fn video_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

pub fn is_video_file(path: &Path) -> bool {
    video_content_type(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn accepts_common_video_extensions() {
        for name in ["clip.mp4", "clip.MOV", "clip.webm", "clip.avi", "clip.mkv"] {
            assert!(is_video_file(&PathBuf::from(name)), "{name}");
        }
        assert_eq!(
            video_content_type(&PathBuf::from("clip.mp4")),
            Some("video/mp4")
        );
    }

    #[test]
    fn rejects_non_video_files() {
        for name in ["notes.txt", "photo.jpg", "report.pdf", "noextension"] {
            assert!(!is_video_file(&PathBuf::from(name)), "{name}");
        }
    }
}
