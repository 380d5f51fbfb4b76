//! Source spec strings
//!
//! A source is named by a colon-delimited token list, `name:arg1:arg2...`,
//! holding at most [`MAX_SPEC_TOKENS`] tokens. Empty tokens are skipped, so
//! `ram::1000` and `ram:1000` are the same spec.

use crate::config::MAX_SPEC_TOKENS;
use crate::error::{ReaderError, Result};
use crate::log_error;

const SPEC_DELIMITER: char = ':';

/// Tokenized spec string, borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec<'s> {
    tokens: [&'s str; MAX_SPEC_TOKENS],
    count: usize,
}

impl<'s> SourceSpec<'s> {
    pub fn parse(input: &'s str) -> Result<Self> {
        if !input.is_ascii() {
            log_error!("source spec must be ASCII");
            return Err(ReaderError::InvalidArgument);
        }

        let mut tokens = [""; MAX_SPEC_TOKENS];
        let mut count = 0;

        for token in input.split(SPEC_DELIMITER).filter(|t| !t.is_empty()) {
            if count == MAX_SPEC_TOKENS {
                log_error!("too many tokens in source spec, max", MAX_SPEC_TOKENS);
                return Err(ReaderError::InvalidArgument);
            }
            tokens[count] = token;
            count += 1;
        }

        if count == 0 {
            log_error!("source spec has no reader name");
            return Err(ReaderError::InvalidArgument);
        }

        Ok(Self { tokens, count })
    }

    /// Backend name (first token)
    pub fn name(&self) -> &'s str {
        self.tokens[0]
    }

    /// Backend arguments (every token after the name)
    pub fn args(&self) -> &[&'s str] {
        &self.tokens[1..self.count]
    }
}

/// Parse a hexadecimal argument, with or without a `0x` prefix.
pub fn parse_hex(token: &str) -> Result<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        log_error!("malformed hexadecimal argument");
        return Err(ReaderError::InvalidArgument);
    }

    u64::from_str_radix(digits, 16).map_err(|_| {
        log_error!("hexadecimal argument overflows 64 bits");
        ReaderError::InvalidArgument
    })
}
