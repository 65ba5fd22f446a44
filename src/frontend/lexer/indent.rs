//! Indentation handling for the Frond lexer
//!
//! Indentation is significant and must be a non-negative multiple of a
//! 4-column unit. The lexer keeps an explicit indent stack (initially `[0]`)
//! owned by this invocation only: deeper lines push and emit one INDENT,
//! shallower lines pop and emit one DEDENT per level. Landing between known
//! levels is an indentation mismatch.

use super::{Lexer, TokenKind};

/// Indentation unit in columns.
pub const INDENT_UNIT: u32 = 4;

impl Lexer {
    pub(super) fn handle_indentation(&mut self) {
        let mut spaces: u32 = 0;
        let mut tabs: u32 = 0;

        while let Some(c) = self.peek() {
            match c {
                ' ' => {
                    spaces += 1;
                    self.advance();
                }
                '\t' => {
                    tabs += 1;
                    self.advance();
                }
                _ => break,
            }
        }

        if tabs > 0 {
            self.error("use 4 spaces for indentation, not tabs");
            return;
        }

        // Blank lines and comment-only lines never change the block structure.
        if matches!(self.peek(), None | Some('\n') | Some('\r') | Some('#')) {
            return;
        }

        if spaces % INDENT_UNIT != 0 {
            self.error(format!(
                "indentation must be a multiple of 4 spaces, got {spaces}"
            ));
            return;
        }

        let current = *self.indent_stack.last().unwrap_or(&0);

        if spaces > current {
            if spaces != current + INDENT_UNIT {
                self.error(format!(
                    "indentation can only increase by 4 spaces, got an increase of {}",
                    spaces - current
                ));
                return;
            }
            self.indent_stack.push(spaces);
            self.push_token(TokenKind::Indent, "");
        } else if spaces < current {
            while self.indent_stack.len() > 1
                && self.indent_stack.last().is_some_and(|&level| level > spaces)
            {
                self.indent_stack.pop();
                self.push_token(TokenKind::Dedent, "");
            }
            // Dedent must land exactly on an enclosing level. Anything else
            // means the stack is desynchronized from the source.
            if *self.indent_stack.last().unwrap_or(&0) != spaces {
                self.error("indentation mismatch: does not match any enclosing block");
            }
        }
    }
}
