/// Byte cursor over theme source with position tracking.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The source being parsed.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    /// Returns true if at end of input.
    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    /// Checks if the remaining input starts with the given byte pattern.
    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i..].starts_with(pat)
    }

    /// Advances by `n` bytes.
    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    /// Consumes input up to (not including) `pat` and returns it.
    /// Without a match the rest of the input is consumed and `None` returned.
    pub fn take_until(&mut self, pat: &str) -> Option<&'a str> {
        let rest = &self.s[self.i..];
        match rest.find(pat) {
            Some(n) => {
                self.i += n;
                Some(&rest[..n])
            }
            None => {
                self.i = self.s.len();
                None
            }
        }
    }

    /// Consumes a tag body up to the first `>` outside quotes, plus the `>`.
    /// Returns the body without the brackets; `None` if the tag never ends.
    pub fn take_tag_body(&mut self) -> Option<&'a str> {
        let start = self.i;
        let mut quote = None;
        for (n, &b) in self.s.as_bytes()[start..].iter().enumerate() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => {
                    self.i = start + n + 1;
                    return Some(&self.s[start..start + n]);
                }
                None => {}
            }
        }
        None
    }

    /// Byte after the current one, if any.
    pub fn peek_next(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i + 1).copied()
    }

    /// Consumes a text run up to the next `<` (or end of input).
    pub fn take_text(&mut self) -> &'a str {
        let rest = &self.s[self.i..];
        let n = rest.find('<').unwrap_or(rest.len());
        self.i += n;
        &rest[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_take_until() {
        let mut cur = Cursor::new("<span>x");
        cur.bump_n(1);
        assert_eq!(cur.take_until(">"), Some("span"));
        assert!(cur.starts_with(b">"));
        assert_eq!(cur.take_until("<"), None);
        assert!(cur.eof());
    }

    #[test]
    fn cursor_take_text_stops_at_tag() {
        let mut cur = Cursor::new("héllo <b>");
        assert_eq!(cur.take_text(), "héllo ");
        assert!(cur.starts_with(b"<b>"));
    }

    #[test]
    fn cursor_tag_body_skips_quoted_brackets() {
        let mut cur = Cursor::new(r#"span title="a > b">rest"#);
        assert_eq!(cur.take_tag_body(), Some(r#"span title="a > b""#));
        assert_eq!(cur.take_text(), "rest");

        let mut open = Cursor::new(r#"span title="a"#);
        assert_eq!(open.take_tag_body(), None);
    }

    #[test]
    fn empty_string_input() {
        let mut cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.take_text(), "");
    }
}
