// Message formatter. Raw assistant/user text is parsed into a block
// structure instead of rewritten markup, so nothing the agent sends can
// smuggle rendering syntax through. Fenced code is extracted before any
// inline rule runs, and inline rules never touch code content.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Lines of inline runs; an empty inner vec is a visual break.
    Paragraph(Vec<Vec<Inline>>),
    Code { lang: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
    Strong(String),
    Emph(String),
}

pub fn format_message(raw: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut rest = raw;
    loop {
        let Some(fence) = rest.find("```") else {
            push_paragraph(&mut blocks, rest);
            break;
        };
        let after = &rest[fence + 3..];
        let lang_len: usize = after
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .map(|c| c.len_utf8())
            .sum();
        let mut body_start = lang_len;
        if after[lang_len..].starts_with('\n') {
            body_start += 1;
        }
        let Some(end) = after[body_start..].find("```") else {
            // Unterminated fence: the whole remainder stays literal text.
            push_paragraph(&mut blocks, rest);
            break;
        };
        push_paragraph(&mut blocks, &rest[..fence]);
        let lang = if lang_len == 0 {
            "plaintext".to_string()
        } else {
            after[..lang_len].to_string()
        };
        blocks.push(Block::Code {
            lang,
            text: after[body_start..body_start + end].to_string(),
        });
        rest = &after[body_start + end + 3..];
        if rest.is_empty() {
            break;
        }
    }
    blocks
}

fn push_paragraph(blocks: &mut Vec<Block>, segment: &str) {
    if segment.is_empty() {
        return;
    }
    let lines = segment.split('\n').map(parse_inline).collect();
    blocks.push(Block::Paragraph(lines));
}

fn parse_inline(line: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut rest = line;

    let flush = |text: &mut String, out: &mut Vec<Inline>| {
        if !text.is_empty() {
            out.push(Inline::Text(std::mem::take(text)));
        }
    };

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('`') {
            if let Some(end) = stripped.find('`') {
                if end > 0 {
                    flush(&mut text, &mut out);
                    out.push(Inline::Code(stripped[..end].to_string()));
                    rest = &stripped[end + 1..];
                    continue;
                }
            }
        } else if let Some(stripped) = rest.strip_prefix("**") {
            if let Some(end) = stripped.find("**") {
                if end > 0 && !stripped[..end].contains('*') {
                    flush(&mut text, &mut out);
                    out.push(Inline::Strong(stripped[..end].to_string()));
                    rest = &stripped[end + 2..];
                    continue;
                }
            }
        } else if let Some(stripped) = rest.strip_prefix('*') {
            if let Some(end) = stripped.find('*') {
                if end > 0 {
                    flush(&mut text, &mut out);
                    out.push(Inline::Emph(stripped[..end].to_string()));
                    rest = &stripped[end + 1..];
                    continue;
                }
            }
        }
        let ch = rest.chars().next().expect("non-empty rest");
        text.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush(&mut text, &mut out);
    out
}

/// Joins the structure back into displayable text. On markup-free input
/// this is the identity, so reformatting already-formatted plain text
/// cannot mangle it.
pub fn render_plain(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Paragraph(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    for inline in line {
                        match inline {
                            Inline::Text(t) | Inline::Code(t) | Inline::Strong(t)
                            | Inline::Emph(t) => out.push_str(t),
                        }
                    }
                }
            }
            Block::Code { lang, text } => {
                out.push_str("```");
                if lang != "plaintext" {
                    out.push_str(lang);
                }
                out.push('\n');
                out.push_str(text);
                out.push_str("```");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_round_trips_unchanged() {
        let raw = "hello\nworld <b>not markup</b>";
        let blocks = format_message(raw);
        assert_eq!(blocks.len(), 1);
        assert_eq!(render_plain(&blocks), raw);
        // A second pass over the rendered form is stable.
        assert_eq!(render_plain(&format_message(&render_plain(&blocks))), raw);
    }

    #[test]
    fn fenced_code_with_language_tag() {
        let blocks = format_message("Before\n```python\nprint(1)\n```\nAfter");
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[1],
            Block::Code {
                lang: "python".to_string(),
                text: "print(1)\n".to_string(),
            }
        );
    }

    #[test]
    fn fence_without_language_defaults_to_plaintext() {
        let blocks = format_message("```\nx = 1\n```");
        assert_eq!(
            blocks[0],
            Block::Code {
                lang: "plaintext".to_string(),
                text: "x = 1\n".to_string(),
            }
        );
    }

    #[test]
    fn inline_rules_do_not_touch_code_blocks() {
        let blocks = format_message("```\n**bold** and `tick`\n```");
        let Block::Code { text, .. } = &blocks[0] else {
            panic!("expected code block");
        };
        assert_eq!(text, "**bold** and `tick`\n");
    }

    #[test]
    fn inline_spans() {
        let inlines = parse_inline("use `cargo` for **builds** and *tests*");
        assert_eq!(
            inlines,
            vec![
                Inline::Text("use ".to_string()),
                Inline::Code("cargo".to_string()),
                Inline::Text(" for ".to_string()),
                Inline::Strong("builds".to_string()),
                Inline::Text(" and ".to_string()),
                Inline::Emph("tests".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_markers_stay_literal() {
        assert_eq!(
            parse_inline("a ** b"),
            vec![Inline::Text("a ** b".to_string())]
        );
        assert_eq!(
            parse_inline("lone `tick"),
            vec![Inline::Text("lone `tick".to_string())]
        );
    }

    #[test]
    fn unterminated_fence_is_literal_text() {
        let blocks = format_message("look:\n```python\nprint(1)");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn line_breaks_become_separate_lines() {
        let blocks = format_message("one\n\ntwo");
        let Block::Paragraph(lines) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_empty());
    }
}
