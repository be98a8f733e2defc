//! Segment renderer: partitions a text into plain and highlighted runs.
//!
//! # Responsibility
//! - Turn raw content plus annotations into an ordered, non-overlapping
//!   segment sequence for display.
//!
//! # Invariants
//! - Segments concatenate back to exactly the original content.
//! - Annotations are visited by ascending `range.start`, ties in input order.
//! - Contested characters belong to the first annotation visited; a later
//!   overlapping annotation only contributes its tail past the cursor, or
//!   nothing when fully covered.
//! - Offsets are char offsets; ranges past the content end are clamped.

use crate::model::annotation::{Annotation, AnnotationId};
use serde::{Deserialize, Serialize};

/// One contiguous run of the rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// `Some` for highlighted runs.
    pub annotation_id: Option<AnnotationId>,
    /// Inclusive char offset.
    pub start: usize,
    /// Exclusive char offset.
    pub end: usize,
}

impl Segment {
    pub fn is_highlighted(&self) -> bool {
        self.annotation_id.is_some()
    }
}

/// Renders `content` with `annotations` into display segments.
///
/// The input does not need to be pre-sorted; a stable sort by start offset is
/// applied so already sorted input keeps its order.
pub fn render_segments(content: &str, annotations: &[Annotation]) -> Vec<Segment> {
    let boundaries = char_boundaries(content);
    let text_len = boundaries.len() - 1;

    let mut ordered: Vec<&Annotation> = annotations.iter().collect();
    ordered.sort_by_key(|annotation| annotation.range.start());

    let mut segments = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut last_index = 0;
    for annotation in ordered {
        let start = annotation.range.start().min(text_len);
        let end = annotation.range.end().min(text_len);

        if last_index < start {
            segments.push(slice_segment(content, &boundaries, last_index, start, None));
        }

        let highlight_start = last_index.max(start);
        if highlight_start < end {
            segments.push(slice_segment(
                content,
                &boundaries,
                highlight_start,
                end,
                Some(annotation.id),
            ));
        }

        last_index = last_index.max(end);
    }

    if last_index < text_len {
        segments.push(slice_segment(content, &boundaries, last_index, text_len, None));
    }

    segments
}

/// Byte offset of every char start, plus the total byte length at the end.
fn char_boundaries(content: &str) -> Vec<usize> {
    content
        .char_indices()
        .map(|(byte_index, _)| byte_index)
        .chain(std::iter::once(content.len()))
        .collect()
}

fn slice_segment(
    content: &str,
    boundaries: &[usize],
    start: usize,
    end: usize,
    annotation_id: Option<AnnotationId>,
) -> Segment {
    Segment {
        text: content[boundaries[start]..boundaries[end]].to_string(),
        annotation_id,
        start,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::render_segments;
    use crate::model::annotation::Annotation;
    use crate::model::range::SpanRange;
    use uuid::Uuid;

    fn annotation(start: i64, end: i64, text_len: usize) -> Annotation {
        let range = SpanRange::new(start, end, text_len).expect("valid span");
        Annotation::new(Uuid::new_v4(), Uuid::new_v4(), "u", "note", range)
    }

    #[test]
    fn no_annotations_yields_single_plain_segment() {
        let segments = render_segments("plain text", &[]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "plain text");
        assert!(!segments[0].is_highlighted());
    }

    #[test]
    fn empty_content_yields_no_segments() {
        assert!(render_segments("", &[]).is_empty());
    }

    #[test]
    fn subsumed_annotation_contributes_nothing() {
        let outer = annotation(0, 10, 12);
        let inner = annotation(2, 5, 12);
        let segments = render_segments("abcdefghijkl", &[outer.clone(), inner]);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].annotation_id, Some(outer.id));
        assert_eq!(segments[0].text, "abcdefghij");
        assert_eq!(segments[1].text, "kl");
    }

    #[test]
    fn unsorted_input_is_rendered_in_start_order() {
        let late = annotation(6, 8, 10);
        let early = annotation(1, 3, 10);
        let segments = render_segments("0123456789", &[late.clone(), early.clone()]);

        let tags: Vec<_> = segments.iter().map(|s| s.annotation_id).collect();
        assert_eq!(tags, vec![None, Some(early.id), None, Some(late.id), None]);
    }

    #[test]
    fn multibyte_content_is_split_on_char_boundaries() {
        let content = "héllo wörld";
        let word = annotation(6, 11, content.chars().count());
        let segments = render_segments(content, &[word]);

        assert_eq!(segments[0].text, "héllo ");
        assert_eq!(segments[1].text, "wörld");
        assert_eq!((segments[1].start, segments[1].end), (6, 11));
    }

    #[test]
    fn stale_range_past_content_is_clamped() {
        let stale = annotation(3, 20, 20);
        let segments = render_segments("short", &[stale]);

        let joined: String = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "short");
        assert_eq!(segments[1].text, "rt");
    }
}
