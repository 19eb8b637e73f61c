use common_framework::{CharIndex, Position, TextPosition, TextSource, TokenSource};
use proptest::prelude::*;

fn walk(input: &str) -> (TextPosition, CharIndex) {
    let mut source = TextSource::new(input);
    let mut text = TextPosition::new();
    let mut index = CharIndex::default();
    while source.has_next() {
        let Some(ch) = source.next_token() else { break };
        text = text.next(&ch);
        index = index.next(&ch);
    }
    (text, index)
}

#[test]
fn test_walk_multiline() {
    let (text, index) = walk("ab\ncd\n");
    assert_eq!(text.line, 3);
    assert_eq!(text.column, 1);
    assert_eq!(text.offset, 6);
    assert_eq!(index.index(), 6);
}

#[test]
fn test_position_copy() {
    let pos1 = TextPosition::at(2, 3, 10);
    let pos2 = pos1;
    assert_eq!(pos1, pos2);
    assert_ne!(pos1, TextPosition::at(5, 6, 20));
}

proptest! {
    #[test]
    fn offsets_match_byte_length(input in "\\PC{0,40}") {
        let (text, index) = walk(&input);
        prop_assert_eq!(text.offset, input.len());
        prop_assert_eq!(index.index(), input.chars().count());
        prop_assert_eq!(text.line, input.matches('\n').count() + 1);
    }

    #[test]
    fn next_is_strictly_increasing(input in "[a-z\\n]{1,20}") {
        let mut pos = TextPosition::new();
        for ch in input.chars() {
            let next = pos.next(&ch);
            prop_assert!(next > pos);
            pos = next;
        }
    }
}
