use std::mem;

/// Streaming movetext tokenizer.
///
/// Drops `{ ... }` comments, `( ... )` variations (nesting tracked, never below
/// zero), `;` rest-of-line comments, move numbers (`12.`, `12...`), NAGs and
/// game-termination markers. Every remaining whitespace-separated token is a ply.
/// State carries across lines, so a comment may span several body lines.
#[derive(Debug, Default)]
pub struct MovetextScanner {
    in_comment: bool,
    variation_depth: u32,
    token: String,
    plies: u32,
    moves: Option<Vec<String>>,
}

impl MovetextScanner {
    pub fn new(keep_moves: bool) -> Self {
        Self {
            moves: keep_moves.then(Vec::new),
            ..Self::default()
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        for ch in line.chars() {
            if self.in_comment {
                if ch == '}' {
                    self.in_comment = false;
                }
                continue;
            }

            match ch {
                '{' => {
                    self.flush_token();
                    self.in_comment = true;
                }
                '(' => {
                    self.flush_token();
                    self.variation_depth += 1;
                }
                ')' => {
                    self.flush_token();
                    self.variation_depth = self.variation_depth.saturating_sub(1);
                }
                ';' => {
                    self.flush_token();
                    return;
                }
                c if c.is_whitespace() => self.flush_token(),
                c => {
                    if self.variation_depth == 0 {
                        self.token.push(c);
                    }
                }
            }
        }
        self.flush_token();
    }

    /// True while an open `{` comment is waiting for its `}`.
    pub fn in_comment(&self) -> bool {
        self.in_comment
    }

    pub fn plies(&self) -> u32 {
        self.plies
    }

    /// Returns the ply count and (when kept) the move list, resetting the scanner.
    pub fn finish(&mut self) -> (u32, Option<Vec<String>>) {
        self.flush_token();
        let keep_moves = self.moves.is_some();
        let plies = mem::take(&mut self.plies);
        let moves = mem::replace(&mut self.moves, keep_moves.then(Vec::new));
        self.in_comment = false;
        self.variation_depth = 0;
        (plies, moves)
    }

    fn flush_token(&mut self) {
        if self.token.is_empty() {
            return;
        }

        let token = mem::take(&mut self.token);
        let san = strip_move_number(&token);
        if san.is_empty() || is_non_move_token(san) {
            return;
        }

        self.plies += 1;
        if let Some(moves) = self.moves.as_mut() {
            moves.push(san.to_string());
        }
    }
}

/// `"12."` -> `""`, `"3...Nf6"` -> `"Nf6"`, `"e4"` -> `"e4"`.
fn strip_move_number(token: &str) -> &str {
    let digits = token.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || token.as_bytes().get(digits) != Some(&b'.') {
        return token;
    }
    token[digits..].trim_start_matches('.')
}

fn is_non_move_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
        || token.starts_with('$')
        || token.bytes().all(|b| b == b'.')
}
