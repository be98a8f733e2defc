use lecotes_core::{render_segments, Annotation, AnnotationSession, Segment, SpanRange, Text};
use uuid::Uuid;

fn annotation(text_id: Uuid, start: i64, end: i64, text_len: usize) -> Annotation {
    Annotation::new(
        text_id,
        Uuid::new_v4(),
        "Reader",
        "note",
        SpanRange::new(start, end, text_len).unwrap(),
    )
}

fn concat(segments: &[Segment]) -> String {
    segments.iter().map(|segment| segment.text.as_str()).collect()
}

#[test]
fn quick_and_brown_yield_five_segments() {
    let content = "The quick brown fox";
    let text_id = Uuid::new_v4();
    let brown = annotation(text_id, 10, 15, 19);
    let quick = annotation(text_id, 4, 9, 19);

    let segments = render_segments(content, &[brown.clone(), quick.clone()]);

    let runs: Vec<(&str, Option<Uuid>)> = segments
        .iter()
        .map(|s| (s.text.as_str(), s.annotation_id))
        .collect();
    assert_eq!(
        runs,
        vec![
            ("The ", None),
            ("quick", Some(quick.id)),
            (" ", None),
            ("brown", Some(brown.id)),
            (" fox", None),
        ]
    );
}

#[test]
fn quick_brown_fox_splits_into_three_segments() {
    let content = "The quick brown fox";
    let text_id = Uuid::new_v4();
    let quick = annotation(text_id, 4, 9, 19);

    let segments = render_segments(content, std::slice::from_ref(&quick));

    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["The ", "quick", " brown fox"]);
    assert_eq!(segments[1].annotation_id, Some(quick.id));
    assert!(!segments[0].is_highlighted());
    assert!(!segments[2].is_highlighted());
}

#[test]
fn overlapping_annotation_only_contributes_its_tail() {
    let content = "abcdefghijklmnopqrstuvwxyz";
    let text_id = Uuid::new_v4();
    let first = annotation(text_id, 0, 10, 26);
    let second = annotation(text_id, 5, 15, 26);

    let segments = render_segments(content, &[second.clone(), first.clone()]);

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].annotation_id, Some(first.id));
    assert_eq!((segments[0].start, segments[0].end), (0, 10));
    assert_eq!(segments[1].annotation_id, Some(second.id));
    assert_eq!((segments[1].start, segments[1].end), (10, 15));
    assert_eq!(segments[1].text, "klmno");
    assert_eq!(segments[2].annotation_id, None);
    assert_eq!(concat(&segments), content);
}

#[test]
fn fully_covered_annotation_is_not_rendered() {
    let content = "abcdefghij";
    let text_id = Uuid::new_v4();
    let outer = annotation(text_id, 0, 8, 10);
    let inner = annotation(text_id, 2, 5, 10);

    let segments = render_segments(content, &[outer.clone(), inner.clone()]);

    assert!(segments
        .iter()
        .all(|segment| segment.annotation_id != Some(inner.id)));
    assert_eq!(concat(&segments), content);
}

#[test]
fn equal_starts_keep_input_order() {
    let content = "abcdefghij";
    let text_id = Uuid::new_v4();
    let earlier = annotation(text_id, 2, 4, 10);
    let later = annotation(text_id, 2, 6, 10);

    let segments = render_segments(content, &[earlier.clone(), later.clone()]);

    let highlighted: Vec<(Uuid, usize, usize)> = segments
        .iter()
        .filter_map(|s| s.annotation_id.map(|id| (id, s.start, s.end)))
        .collect();
    assert_eq!(highlighted, vec![(earlier.id, 2, 4), (later.id, 4, 6)]);
}

#[test]
fn segments_are_contiguous_and_cover_multibyte_text() {
    let content = "héllo wörld ✓ done";
    let text_id = Uuid::new_v4();
    let len = content.chars().count();
    let annotations = vec![
        annotation(text_id, 1, 4, len),
        annotation(text_id, 3, 9, len),
        annotation(text_id, 12, 13, len),
    ];

    let segments = render_segments(content, &annotations);

    assert_eq!(concat(&segments), content);
    let mut cursor = 0;
    for segment in &segments {
        assert_eq!(segment.start, cursor);
        assert!(segment.end > segment.start);
        assert_eq!(segment.text.chars().count(), segment.end - segment.start);
        cursor = segment.end;
    }
    assert_eq!(cursor, len);
}

#[test]
fn session_render_reflects_mutations() {
    let owner = Uuid::new_v4();
    let text = Text::new(owner, "Fox", "The quick brown fox", Vec::new()).unwrap();
    let mut session = AnnotationSession::new(text);

    let quick = session
        .create_annotation(owner, "Owner", "speed", 4, 9)
        .unwrap();
    assert_eq!(session.render().len(), 3);

    session.delete_annotation(quick.id, owner).unwrap();
    let segments = session.render();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "The quick brown fox");
}
