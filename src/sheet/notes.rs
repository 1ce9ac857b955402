//! Markdown notes parsing for the invoice notes block.
//!
//! Turns free-text markdown into a flat list of styled blocks the
//! composer can lay out: paragraphs of styled spans, rules, and blanks.
//! Unsupported constructs degrade to their plain text content.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Body text size for notes, in sheet pixels.
pub const NOTES_BODY_SIZE: f32 = 16.0;
/// Heading text size for notes.
pub const NOTES_HEADING_SIZE: f32 = 24.0;
/// Indent per list nesting level.
const LIST_INDENT_PX: f32 = 24.0;

/// A styled fragment within one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSpan {
    pub text: String,
    pub bold: bool,
    pub underline: bool,
}

/// One block of parsed notes content.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteBlock {
    Paragraph {
        spans: Vec<NoteSpan>,
        size: f32,
        indent: f32,
    },
    Rule,
    Blank,
}

/// Parse markdown notes into layout-ready blocks.
pub fn parse_notes(content: &str) -> Vec<NoteBlock> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let parser = Parser::new(content);
    let mut state = ParserState::new();

    for event in parser {
        match event {
            Event::Start(tag) => state.handle_start_tag(tag),
            Event::End(tag_end) => state.handle_end_tag(tag_end),
            Event::Text(text) => state.push_text(&text),
            Event::Code(code) => state.push_text(&code),
            Event::SoftBreak => state.push_text(" "),
            Event::HardBreak => state.flush_line(),
            Event::Rule => {
                state.flush_line();
                state.blocks.push(NoteBlock::Rule);
            }
            _ => {}
        }
    }
    state.flush_line();
    state.blocks
}

/// Internal state for tracking nested formatting during parsing.
struct ParserState {
    blocks: Vec<NoteBlock>,
    spans: Vec<NoteSpan>,
    bold_depth: usize,
    underline_depth: usize,
    list_depth: usize,
    list_counters: Vec<usize>,
    pending_list_prefix: Option<String>,
    current_size: f32,
    heading_bold: bool,
}

impl ParserState {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            spans: Vec::new(),
            bold_depth: 0,
            underline_depth: 0,
            list_depth: 0,
            list_counters: Vec::new(),
            pending_list_prefix: None,
            current_size: NOTES_BODY_SIZE,
            heading_bold: false,
        }
    }

    fn indent(&self) -> f32 {
        self.list_depth.saturating_sub(1) as f32 * LIST_INDENT_PX
    }

    fn push_text(&mut self, text: &str) {
        if let Some(prefix) = self.pending_list_prefix.take() {
            self.spans.push(NoteSpan {
                text: prefix,
                bold: false,
                underline: false,
            });
        }

        let bold = self.bold_depth > 0 || self.heading_bold;
        let underline = self.underline_depth > 0;

        // merge into the previous span when the style matches
        if let Some(last) = self.spans.last_mut() {
            if last.bold == bold && last.underline == underline {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(NoteSpan {
            text: text.to_string(),
            bold,
            underline,
        });
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        self.blocks.push(NoteBlock::Paragraph {
            spans,
            size: self.current_size,
            indent: self.indent(),
        });
    }

    fn handle_start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                self.heading_bold = true;
                self.current_size = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => NOTES_HEADING_SIZE,
                    _ => NOTES_BODY_SIZE,
                };
            }
            Tag::Strong => self.bold_depth += 1,
            Tag::Emphasis => self.underline_depth += 1,
            Tag::Link { .. } => self.underline_depth += 1,
            Tag::List(start_num) => {
                self.flush_line();
                if let Some(start) = start_num {
                    self.list_counters.push(start as usize);
                }
                self.list_depth += 1;
            }
            Tag::Item => {
                self.flush_line();
                if let Some(counter) = self.list_counters.last_mut() {
                    self.pending_list_prefix = Some(format!("{}. ", counter));
                    *counter += 1;
                } else {
                    self.pending_list_prefix = Some("- ".into());
                }
            }
            _ => {}
        }
    }

    fn handle_end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_depth == 0 {
                    self.blocks.push(NoteBlock::Blank);
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.heading_bold = false;
                self.current_size = NOTES_BODY_SIZE;
                self.blocks.push(NoteBlock::Blank);
            }
            TagEnd::Strong => self.bold_depth = self.bold_depth.saturating_sub(1),
            TagEnd::Emphasis => {
                self.underline_depth = self.underline_depth.saturating_sub(1)
            }
            TagEnd::Link => self.underline_depth = self.underline_depth.saturating_sub(1),
            TagEnd::List(is_ordered) => {
                self.flush_line();
                if is_ordered {
                    self.list_counters.pop();
                }
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blocks.push(NoteBlock::Blank);
                }
            }
            TagEnd::Item => self.flush_line(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph_text(block: &NoteBlock) -> String {
        match block {
            NoteBlock::Paragraph { spans, .. } => {
                spans.iter().map(|s| s.text.as_str()).collect()
            }
            _ => String::new(),
        }
    }

    #[test]
    fn test_empty_notes() {
        assert!(parse_notes("").is_empty());
        assert!(parse_notes("   \n  ").is_empty());
    }

    #[test]
    fn test_plain_paragraph() {
        let blocks = parse_notes("Livraison prévue mardi.");
        assert_eq!(paragraph_text(&blocks[0]), "Livraison prévue mardi.");
    }

    #[test]
    fn test_strong_span() {
        let blocks = parse_notes("Livraison **offerte** incluse");
        match &blocks[0] {
            NoteBlock::Paragraph { spans, .. } => {
                assert_eq!(spans.len(), 3);
                assert!(!spans[0].bold);
                assert!(spans[1].bold);
                assert_eq!(spans[1].text, "offerte");
                assert!(!spans[2].bold);
            }
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_bullet_list_prefixes() {
        let blocks = parse_notes("- premier\n- second");
        let lines: Vec<String> = blocks
            .iter()
            .filter(|b| matches!(b, NoteBlock::Paragraph { .. }))
            .map(paragraph_text)
            .collect();
        assert_eq!(lines, vec!["- premier".to_string(), "- second".to_string()]);
    }

    #[test]
    fn test_ordered_list_counters() {
        let blocks = parse_notes("1. un\n2. deux\n3. trois");
        let lines: Vec<String> = blocks
            .iter()
            .filter(|b| matches!(b, NoteBlock::Paragraph { .. }))
            .map(paragraph_text)
            .collect();
        assert_eq!(
            lines,
            vec!["1. un".to_string(), "2. deux".to_string(), "3. trois".to_string()]
        );
    }

    #[test]
    fn test_nested_list_indent() {
        let blocks = parse_notes("- haut\n  - dedans");
        let indents: Vec<f32> = blocks
            .iter()
            .filter_map(|b| match b {
                NoteBlock::Paragraph { indent, .. } => Some(*indent),
                _ => None,
            })
            .collect();
        assert_eq!(indents, vec![0.0, 24.0]);
    }

    #[test]
    fn test_heading_sizes() {
        let blocks = parse_notes("# Grand titre\n\ncorps");
        match &blocks[0] {
            NoteBlock::Paragraph { size, spans, .. } => {
                assert_eq!(*size, NOTES_HEADING_SIZE);
                assert!(spans[0].bold);
            }
            other => panic!("expected heading paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_block() {
        let blocks = parse_notes("avant\n\n---\n\naprès");
        assert!(blocks.iter().any(|b| matches!(b, NoteBlock::Rule)));
    }
}
