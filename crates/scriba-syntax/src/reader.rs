//! Token readers: cursors over fragments with typed subfragment carving.

use rowan::TextSize;

use crate::errors::{ParserError, SyntaxError};
use crate::fragment::{DelimitersCounter, Fragment, FragmentKind};
use crate::token::{Token, TokenKind, token_text};

/// A cursor over a [`Fragment`] of the token list.
///
/// The `right_right_angle` flag records that the enclosing template fragment
/// consumed half of a `>>` token; the current context must still see the
/// remaining `>` when carving its own template subfragments.
#[derive(Debug, Clone, Copy)]
pub struct TokenReader<'s> {
    source: &'s str,
    tokens: &'s [Token],
    fragment: Fragment,
    pos: usize,
    right_right_angle: bool,
}

impl<'s> TokenReader<'s> {
    /// Constructs a reader over the full token list.
    pub fn new(source: &'s str, tokens: &'s [Token]) -> Self {
        Self::with_fragment(source, tokens, Fragment::full(tokens), false)
    }

    pub fn with_fragment(
        source: &'s str,
        tokens: &'s [Token],
        fragment: Fragment,
        right_right_angle: bool,
    ) -> Self {
        Self {
            source,
            tokens,
            fragment,
            pos: fragment.begin,
            right_right_angle,
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    pub fn tokens(&self) -> &'s [Token] {
        self.tokens
    }

    pub fn fragment(&self) -> Fragment {
        self.fragment
    }

    pub fn begin(&self) -> usize {
        self.fragment.begin
    }

    pub fn end(&self) -> usize {
        self.fragment.end
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.fragment.end
    }

    /// Source text of a token.
    pub fn text(&self, token: &Token) -> &'s str {
        token_text(self.source, token)
    }

    /// Source offset of the current token, or of the end of input.
    pub fn offset(&self) -> TextSize {
        match self.tokens.get(self.pos) {
            Some(t) => t.span.start(),
            None => TextSize::from(self.source.len() as u32),
        }
    }

    /// Builds a syntax error located at the current token.
    pub fn syntax_err(&self, error: ParserError) -> SyntaxError {
        SyntaxError::new(error, self.offset())
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> Result<Token, SyntaxError> {
        if self.at_end() {
            return Err(self.syntax_err(ParserError::UnexpectedEndOfInput));
        }
        Ok(self.tokens[self.pos])
    }

    /// Looks ahead `n` tokens (0 = current) without bounds erroring.
    pub fn peek_at(&self, n: usize) -> Option<Token> {
        let idx = self.pos + n;
        if idx < self.fragment.end {
            Some(self.tokens[idx])
        } else {
            None
        }
    }

    /// Whether the current token has the given kind. False at end.
    pub fn at(&self, kind: TokenKind) -> bool {
        !self.at_end() && self.tokens[self.pos].kind == kind
    }

    /// Reads the next token.
    pub fn read(&mut self) -> Result<Token, SyntaxError> {
        let tok = self.peek()?;
        self.pos += 1;
        Ok(tok)
    }

    /// Reads a token of a particular kind.
    pub fn read_kind(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        let tok = self.read()?;
        if tok.kind != kind {
            return Err(SyntaxError::new(ParserError::UnexpectedToken, tok.span.start())
                .with_found(tok)
                .with_expected(kind));
        }
        Ok(tok)
    }

    /// Moves the reading cursor.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// A reader over the remaining tokens of this fragment.
    pub fn subfragment(&self) -> TokenReader<'s> {
        TokenReader::with_fragment(
            self.source,
            self.tokens,
            Fragment::new(self.pos, self.fragment.end),
            self.right_right_angle,
        )
    }

    /// Carves a subfragment of the requested shape starting at the cursor.
    ///
    /// For [`FragmentKind::Template`] prefer [`TokenReader::try_template`]
    /// when failure to carve is not an error.
    pub fn subfragment_of(&self, kind: FragmentKind) -> Result<TokenReader<'s>, SyntaxError> {
        match kind {
            FragmentKind::DelimiterPair => self.delimiter_pair(),
            FragmentKind::Statement => self.statement(),
            FragmentKind::ListElement => self.list_element(),
            FragmentKind::Template => self
                .try_template()
                .ok_or_else(|| self.syntax_err(ParserError::UnexpectedFragmentEnd)),
        }
    }

    /// Carves a subfragment and advances the cursor to its end.
    pub fn next(&mut self, kind: FragmentKind) -> Result<TokenReader<'s>, SyntaxError> {
        let sub = self.subfragment_of(kind)?;
        self.seek(sub.end());
        Ok(sub)
    }

    /// Content of the balanced pair opened by the current token.
    ///
    /// The cursor must sit on `(`, `[` or `{`; the returned fragment excludes
    /// both delimiters.
    fn delimiter_pair(&self) -> Result<TokenReader<'s>, SyntaxError> {
        let mut counter = DelimitersCounter::default();
        counter.feed(&self.peek()?);
        debug_assert!(
            !counter.balanced() && !counter.invalid(),
            "delimiter_pair called while not on an opening delimiter"
        );

        let begin = self.pos + 1;
        let mut it = begin;

        while it < self.fragment.end {
            counter.feed(&self.tokens[it]);

            if counter.invalid() {
                return Err(self.syntax_err(ParserError::UnexpectedFragmentEnd));
            }

            if counter.balanced() {
                return Ok(TokenReader::with_fragment(
                    self.source,
                    self.tokens,
                    Fragment::new(begin, it),
                    false,
                ));
            }

            it += 1;
        }

        Err(self.syntax_err(ParserError::UnexpectedFragmentEnd))
    }

    /// Everything up to the next top-level `;` (exclusive).
    fn statement(&self) -> Result<TokenReader<'s>, SyntaxError> {
        let mut counter = DelimitersCounter::default();
        let mut it = self.pos;

        while it < self.fragment.end {
            let tok = &self.tokens[it];
            counter.feed(tok);

            if counter.invalid() {
                return Err(self.syntax_err(ParserError::UnexpectedFragmentEnd));
            }

            if tok.kind == TokenKind::Semicolon && counter.balanced() {
                return Ok(TokenReader::with_fragment(
                    self.source,
                    self.tokens,
                    Fragment::new(self.pos, it),
                    false,
                ));
            }

            it += 1;
        }

        Err(self.syntax_err(ParserError::UnexpectedFragmentEnd))
    }

    /// Everything up to the next top-level `,`, or the rest of the fragment
    /// when no comma follows.
    fn list_element(&self) -> Result<TokenReader<'s>, SyntaxError> {
        let mut counter = DelimitersCounter::default();
        let mut it = self.pos;

        while it < self.fragment.end {
            let tok = &self.tokens[it];
            counter.feed(tok);

            if counter.invalid() {
                return Err(self.syntax_err(ParserError::UnexpectedFragmentEnd));
            }

            if tok.kind == TokenKind::Comma && counter.balanced() {
                return Ok(TokenReader::with_fragment(
                    self.source,
                    self.tokens,
                    Fragment::new(self.pos, it),
                    false,
                ));
            }

            it += 1;
        }

        if !counter.balanced() {
            return Err(self.syntax_err(ParserError::UnexpectedFragmentEnd));
        }

        Ok(TokenReader::with_fragment(
            self.source,
            self.tokens,
            Fragment::new(self.pos, self.fragment.end),
            self.right_right_angle,
        ))
    }

    /// Content between the `<` at the cursor and its matching `>` or `>>`.
    ///
    /// Returns `None` when the cursor is not on `<` or no matching closer is
    /// found - callers use this to decide that `<` was a comparison instead.
    pub fn try_template(&self) -> Option<TokenReader<'s>> {
        // When the enclosing template consumed half of a trailing `>>`, the
        // remaining `>` is still ours to match against.
        let effective_end = if self.right_right_angle
            && self
                .tokens
                .get(self.fragment.end)
                .is_some_and(|t| t.kind == TokenKind::RightRightAngle)
        {
            self.fragment.end + 1
        } else {
            self.fragment.end
        };

        let (begin, end, half_consumed) =
            try_build_template_fragment(self.tokens, self.pos, effective_end)?;

        Some(TokenReader::with_fragment(
            self.source,
            self.tokens,
            Fragment::new(begin, end),
            half_consumed && !self.right_right_angle,
        ))
    }
}

/// Finds the token range of a template-argument list.
///
/// `begin` must point at a `<`. Angle brackets are only counted where the
/// `()`/`[]`/`{}` nesting is balanced, so `A<(B > C)>` resolves correctly. A
/// `>>` at angle depth 1 or 2 closes the list with its first half consumed.
fn try_build_template_fragment(
    tokens: &[Token],
    begin: usize,
    end: usize,
) -> Option<(usize, usize, bool)> {
    if tokens.get(begin)?.kind != TokenKind::LeftAngle {
        return None;
    }

    let mut counter = DelimitersCounter::default();
    let mut angle_counter: i32 = 0;

    for it in begin..end {
        let tok = &tokens[it];
        counter.feed(tok);

        if counter.invalid() {
            return None;
        }

        match tok.kind {
            TokenKind::RightAngle if counter.balanced() => {
                angle_counter -= 1;
                if angle_counter == 0 {
                    return Some((begin + 1, it, false));
                }
            }
            TokenKind::RightRightAngle if counter.balanced() => {
                if angle_counter == 1 || angle_counter == 2 {
                    return Some((begin + 1, it, true));
                }
                angle_counter -= 2;
            }
            TokenKind::LeftAngle if counter.balanced() => {
                angle_counter += 1;
            }
            _ => {}
        }
    }

    None
}
