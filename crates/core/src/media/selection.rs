//! Default-source selection.
//!
//! Picks which source plays by default for a media kind: the caller's
//! preferred names first (in order), then the well-known defaults, then the
//! first source that carries the kind at all.

use super::types::{MediaKind, MediaSource};

/// Selects the default source name for `kind` among `sources`.
///
/// Returns `None` only when no source provides the kind.
pub fn select_default_source<'a>(
    sources: &'a [MediaSource],
    kind: MediaKind,
    preferred: &[String],
    defaults: &[String],
) -> Option<&'a str> {
    let candidates: Vec<&MediaSource> = sources.iter().filter(|s| s.has_kind(kind)).collect();

    preferred
        .iter()
        .chain(defaults.iter())
        .find_map(|wanted| {
            candidates
                .iter()
                .find(|s| &s.name == wanted)
                .map(|s| s.name.as_str())
        })
        .or_else(|| candidates.first().map(|s| s.name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<MediaSource> {
        vec![
            MediaSource::new("SG Frames", "file:///f.####.exr", vec![MediaKind::Image]),
            MediaSource::new("SG Movie", "file:///m.mov", vec![MediaKind::Image, MediaKind::Audio]),
            MediaSource::new("movie_dneg", "file:///d.mov", vec![MediaKind::Image, MediaKind::Audio]),
        ]
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_preferred_name_wins() {
        let sources = sources();
        let picked = select_default_source(
            &sources,
            MediaKind::Image,
            &names(&["SG Frames"]),
            &names(&["movie_dneg", "SG Movie"]),
        );
        assert_eq!(picked, Some("SG Frames"));
    }

    #[test]
    fn test_preferred_order_is_respected() {
        let sources = sources();
        let picked = select_default_source(
            &sources,
            MediaKind::Image,
            &names(&["missing", "SG Movie", "SG Frames"]),
            &[],
        );
        assert_eq!(picked, Some("SG Movie"));
    }

    #[test]
    fn test_falls_back_to_defaults() {
        let sources = sources();
        let picked = select_default_source(
            &sources,
            MediaKind::Image,
            &names(&["missing"]),
            &names(&["movie_dneg", "SG Movie"]),
        );
        assert_eq!(picked, Some("movie_dneg"));
    }

    #[test]
    fn test_falls_back_to_first_with_kind() {
        let sources = sources();
        let picked = select_default_source(&sources, MediaKind::Audio, &[], &[]);
        assert_eq!(picked, Some("SG Movie"));
    }

    #[test]
    fn test_preferred_name_without_kind_is_skipped() {
        let sources = sources();
        // "SG Frames" has no audio, so it can't be the audio default.
        let picked = select_default_source(
            &sources,
            MediaKind::Audio,
            &names(&["SG Frames"]),
            &names(&["movie_dneg"]),
        );
        assert_eq!(picked, Some("movie_dneg"));
    }

    #[test]
    fn test_no_source_with_kind() {
        let sources = vec![MediaSource::new("SG Frames", "file:///f.exr", vec![MediaKind::Image])];
        assert_eq!(select_default_source(&sources, MediaKind::Audio, &[], &[]), None);
        assert_eq!(select_default_source(&[], MediaKind::Image, &[], &[]), None);
    }
}
