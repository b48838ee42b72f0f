use eyre::Result;
use log::debug;

use crate::{Segment, TrackInfo, TrackKind, TrackListing, Transcript};

/// The two operations a caption backend must provide. Everything the
/// resolver knows about the network lives behind this trait, so the
/// precedence policy can be tested against a scripted source.
#[allow(async_fn_in_trait)]
pub trait CaptionSource {
    async fn list_tracks(&self, video_id: &str) -> Result<TrackListing>;
    async fn fetch_track(&self, video_id: &str, track: &TrackInfo) -> Result<Vec<Segment>>;
}

/// One (kind, language) attempt in the preference order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: TrackKind,
    pub lang: String,
}

/// Outcome of one resolution pass
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Transcript),
    Exhausted,
}

/// Manual tracks for every preferred language, then auto-generated ones.
/// The order of this list IS the fallback policy.
pub fn candidate_order(langs: &[String]) -> Vec<Candidate> {
    let mut order = Vec::with_capacity(langs.len() * 2);
    for kind in [TrackKind::Manual, TrackKind::Auto] {
        for lang in langs {
            order.push(Candidate {
                kind,
                lang: lang.clone(),
            });
        }
    }
    order
}

/// Walk the candidate list in order and return the first track that yields a
/// non-empty payload. Per-candidate failures (track absent, fetch error,
/// empty payload) advance to the next candidate; after the list is spent,
/// every remaining advertised track is scanned once in listing order.
/// Only a failing `list_tracks` call escapes as an error.
pub async fn resolve<S: CaptionSource>(source: &S, video_id: &str, langs: &[String]) -> Result<Resolution> {
    let listing = source.list_tracks(video_id).await?;
    debug!("{video_id}: {} caption tracks advertised", listing.tracks.len());

    let mut tried = vec![false; listing.tracks.len()];

    for candidate in candidate_order(langs) {
        let Some(idx) = listing
            .tracks
            .iter()
            .position(|t| t.kind == candidate.kind && t.language_code == candidate.lang)
        else {
            debug!("{video_id}: no {} track for '{}'", candidate.kind, candidate.lang);
            continue;
        };
        tried[idx] = true;
        if let Some(transcript) = try_track(source, video_id, &listing, idx).await {
            return Ok(Resolution::Found(transcript));
        }
    }

    // Last resort: any advertised track not already attempted
    for idx in 0..listing.tracks.len() {
        if tried[idx] {
            continue;
        }
        if let Some(transcript) = try_track(source, video_id, &listing, idx).await {
            return Ok(Resolution::Found(transcript));
        }
    }

    Ok(Resolution::Exhausted)
}

async fn try_track<S: CaptionSource>(
    source: &S,
    video_id: &str,
    listing: &TrackListing,
    idx: usize,
) -> Option<Transcript> {
    let track = &listing.tracks[idx];
    match source.fetch_track(video_id, track).await {
        Ok(segments) if !segments.is_empty() => Some(Transcript {
            video_id: video_id.to_string(),
            title: listing.title.clone(),
            language: track.language_code.clone(),
            kind: track.kind,
            segments,
        }),
        Ok(_) => {
            debug!(
                "{video_id}: {} track '{}' returned an empty payload",
                track.kind, track.language_code
            );
            None
        }
        Err(e) => {
            debug!(
                "{video_id}: fetch failed for {} track '{}': {e}",
                track.kind, track.language_code
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::bail;
    use std::collections::HashMap;

    /// Scripted source: tracks come from `listing`, payloads are looked up
    /// by the track's base_url. A missing entry simulates a fetch error.
    struct FakeSource {
        listing: TrackListing,
        payloads: HashMap<String, Vec<Segment>>,
    }

    impl CaptionSource for FakeSource {
        async fn list_tracks(&self, _video_id: &str) -> Result<TrackListing> {
            Ok(self.listing.clone())
        }

        async fn fetch_track(&self, _video_id: &str, track: &TrackInfo) -> Result<Vec<Segment>> {
            match self.payloads.get(&track.base_url) {
                Some(segments) => Ok(segments.clone()),
                None => bail!("simulated fetch failure for {}", track.base_url),
            }
        }
    }

    fn track(lang: &str, kind: TrackKind, url: &str) -> TrackInfo {
        TrackInfo {
            language_code: lang.to_string(),
            kind,
            base_url: url.to_string(),
        }
    }

    fn segments(text: &str) -> Vec<Segment> {
        vec![Segment {
            text: text.to_string(),
            start: 0.0,
            duration: 1.0,
        }]
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    fn source(tracks: Vec<TrackInfo>, payloads: Vec<(&str, Vec<Segment>)>) -> FakeSource {
        FakeSource {
            listing: TrackListing {
                title: "Test Video".to_string(),
                tracks,
            },
            payloads: payloads.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    #[test]
    fn test_candidate_order_manual_before_auto() {
        let order = candidate_order(&langs(&["en", "ko"]));
        let expect = [
            (TrackKind::Manual, "en"),
            (TrackKind::Manual, "ko"),
            (TrackKind::Auto, "en"),
            (TrackKind::Auto, "ko"),
        ];
        assert_eq!(order.len(), expect.len());
        for (candidate, (kind, lang)) in order.iter().zip(expect) {
            assert_eq!(candidate.kind, kind);
            assert_eq!(candidate.lang, lang);
        }
    }

    #[tokio::test]
    async fn test_prefers_english_over_korean() {
        let src = source(
            vec![
                track("ko", TrackKind::Manual, "ko-url"),
                track("en", TrackKind::Manual, "en-url"),
            ],
            vec![("ko-url", segments("안녕")), ("en-url", segments("hello"))],
        );

        match resolve(&src, "vid", &langs(&["en", "ko"])).await.unwrap() {
            Resolution::Found(t) => {
                assert_eq!(t.language, "en");
                assert_eq!(t.flattened_text(), "hello");
            }
            Resolution::Exhausted => panic!("expected a transcript"),
        }
    }

    #[tokio::test]
    async fn test_failed_preferred_track_falls_through() {
        // English track is advertised but its fetch fails; Korean wins.
        let src = source(
            vec![
                track("en", TrackKind::Manual, "en-url"),
                track("ko", TrackKind::Manual, "ko-url"),
            ],
            vec![("ko-url", segments("안녕"))],
        );

        match resolve(&src, "vid", &langs(&["en", "ko"])).await.unwrap() {
            Resolution::Found(t) => assert_eq!(t.language, "ko"),
            Resolution::Exhausted => panic!("expected a transcript"),
        }
    }

    #[tokio::test]
    async fn test_empty_payload_advances() {
        let src = source(
            vec![
                track("en", TrackKind::Manual, "en-url"),
                track("en", TrackKind::Auto, "asr-url"),
            ],
            vec![("en-url", vec![]), ("asr-url", segments("generated"))],
        );

        match resolve(&src, "vid", &langs(&["en"])).await.unwrap() {
            Resolution::Found(t) => {
                assert_eq!(t.kind, TrackKind::Auto);
                assert_eq!(t.flattened_text(), "generated");
            }
            Resolution::Exhausted => panic!("expected a transcript"),
        }
    }

    #[tokio::test]
    async fn test_final_scan_picks_up_unlisted_language() {
        // Only a German auto track exists; no candidate matches it, so the
        // trailing scan over remaining tracks must find it.
        let src = source(
            vec![track("de", TrackKind::Auto, "de-url")],
            vec![("de-url", segments("hallo welt"))],
        );

        match resolve(&src, "vid", &langs(&["en", "ko"])).await.unwrap() {
            Resolution::Found(t) => {
                assert_eq!(t.language, "de");
                assert_eq!(t.flattened_text(), "hallo welt");
            }
            Resolution::Exhausted => panic!("expected a transcript"),
        }
    }

    #[tokio::test]
    async fn test_no_tracks_is_exhausted_not_error() {
        let src = source(vec![], vec![]);
        let resolution = resolve(&src, "vid", &langs(&["en", "ko"])).await.unwrap();
        assert!(matches!(resolution, Resolution::Exhausted));
    }

    #[tokio::test]
    async fn test_all_fetches_failing_is_exhausted() {
        // Both tracks advertised, neither payload available.
        let src = source(
            vec![
                track("en", TrackKind::Manual, "en-url"),
                track("ko", TrackKind::Auto, "ko-url"),
            ],
            vec![],
        );
        let resolution = resolve(&src, "vid", &langs(&["en", "ko"])).await.unwrap();
        assert!(matches!(resolution, Resolution::Exhausted));
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        struct BrokenSource;

        impl CaptionSource for BrokenSource {
            async fn list_tracks(&self, _video_id: &str) -> Result<TrackListing> {
                bail!("network down")
            }
            async fn fetch_track(&self, _video_id: &str, _track: &TrackInfo) -> Result<Vec<Segment>> {
                unreachable!("fetch_track must not be called when listing fails")
            }
        }

        assert!(resolve(&BrokenSource, "vid", &langs(&["en"])).await.is_err());
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let src = source(
            vec![
                track("ko", TrackKind::Manual, "ko-url"),
                track("en", TrackKind::Manual, "en-url"),
            ],
            vec![("ko-url", segments("안녕")), ("en-url", segments("hello"))],
        );
        let prefs = langs(&["en", "ko"]);

        let first = match resolve(&src, "vid", &prefs).await.unwrap() {
            Resolution::Found(t) => t.flattened_text(),
            Resolution::Exhausted => panic!("expected a transcript"),
        };
        let second = match resolve(&src, "vid", &prefs).await.unwrap() {
            Resolution::Found(t) => t.flattened_text(),
            Resolution::Exhausted => panic!("expected a transcript"),
        };
        assert_eq!(first, second);
    }
}
