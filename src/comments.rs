//! Line-level comment stripping shared by both passes.

/// Removes `//`, `#`, and `/* ... */` comments from one line at a time.
///
/// Block comments may span lines, so the open state carries across the
/// consecutive lines of a pass and must be reset before the next pass
/// walks the same lines again.
#[derive(Debug, Default)]
pub struct CommentStripper {
    in_block: bool,
}

enum Starter {
    Block,
    Line,
}

impl CommentStripper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.in_block = false;
    }

    pub fn in_block_comment(&self) -> bool {
        self.in_block
    }

    /// Returns the line with comments removed and surrounding whitespace
    /// trimmed, updating the block-comment state.
    pub fn strip(&mut self, line: &str) -> String {
        let chars: Vec<char> = line.chars().collect();
        let mut out = String::new();
        let mut i = 0;

        loop {
            if self.in_block {
                match find_block_close(&chars, i) {
                    Some(close) => {
                        self.in_block = false;
                        i = close + 2;
                    }
                    None => break,
                }
                continue;
            }

            match find_comment_start(&chars, i) {
                None => {
                    out.extend(&chars[i..]);
                    break;
                }
                Some((pos, Starter::Line)) => {
                    out.extend(&chars[i..pos]);
                    break;
                }
                Some((pos, Starter::Block)) => {
                    out.extend(&chars[i..pos]);
                    self.in_block = true;
                    i = pos + 2;
                }
            }
        }

        out.trim().to_string()
    }
}

fn find_block_close(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < chars.len() {
        if chars[i] == '*' && chars[i + 1] == '/' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Finds the earliest of `/*`, `//`, or a comment-`#`. A `#` only starts a
/// comment when an even number of unescaped quotes precedes it; a backslash
/// escapes the character that follows it.
fn find_comment_start(chars: &[char], from: usize) -> Option<(usize, Starter)> {
    let mut quotes = 0usize;
    let mut escaped = false;
    let mut i = from;
    while i < chars.len() {
        let c = chars[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quotes += 1,
            '/' if i + 1 < chars.len() && chars[i + 1] == '*' => {
                return Some((i, Starter::Block));
            }
            '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                return Some((i, Starter::Line));
            }
            '#' if quotes % 2 == 0 => {
                return Some((i, Starter::Line));
            }
            _ => {}
        }
        i += 1;
    }
    None
}
