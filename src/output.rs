use crate::Transcript;

/// Render transcript as plain text (one segment per line, no timestamps)
pub fn render_text(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full transcript structure as pretty-printed JSON
pub fn render_json(transcript: &Transcript) -> String {
    serde_json::to_string_pretty(transcript).unwrap_or_default()
}

/// Render transcript as SRT cues, using the segment timing the flattened
/// form drops
pub fn render_srt(transcript: &Transcript) -> String {
    let mut out = String::new();
    for (i, seg) in transcript.segments.iter().enumerate() {
        let start = srt_timestamp(seg.start);
        let end = srt_timestamp(seg.start + seg.duration);
        out.push_str(&format!("{}\n{start} --> {end}\n{}\n\n", i + 1, seg.text));
    }
    out
}

fn srt_timestamp(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let h = millis / 3_600_000;
    let m = (millis % 3_600_000) / 60_000;
    let s = (millis % 60_000) / 1_000;
    let ms = millis % 1_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Segment, TrackKind};

    fn sample_transcript() -> Transcript {
        Transcript {
            video_id: "test123".to_string(),
            title: "Test Video".to_string(),
            language: "en".to_string(),
            kind: TrackKind::Manual,
            segments: vec![
                Segment {
                    text: "Hello world".to_string(),
                    start: 0.0,
                    duration: 1.5,
                },
                Segment {
                    text: "This is a test".to_string(),
                    start: 1.5,
                    duration: 2.0,
                },
            ],
        }
    }

    #[test]
    fn test_render_text() {
        let t = sample_transcript();
        let output = render_text(&t);
        assert_eq!(output, "Hello world\nThis is a test");
    }

    #[test]
    fn test_render_text_empty() {
        let t = Transcript {
            video_id: "empty".to_string(),
            title: "Empty".to_string(),
            language: "en".to_string(),
            kind: TrackKind::Manual,
            segments: vec![],
        };
        assert_eq!(render_text(&t), "");
    }

    #[test]
    fn test_render_json_round_trips() {
        let t = sample_transcript();
        let json = render_json(&t);
        let parsed: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.video_id, "test123");
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.kind, TrackKind::Manual);
    }

    #[test]
    fn test_render_srt() {
        let t = sample_transcript();
        let srt = render_srt(&t);
        let expected = "1\n00:00:00,000 --> 00:00:01,500\nHello world\n\n\
                        2\n00:00:01,500 --> 00:00:03,500\nThis is a test\n\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn test_srt_timestamp_hours() {
        assert_eq!(srt_timestamp(3661.25), "01:01:01,250");
    }
}
