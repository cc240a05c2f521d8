//! Strategy expression parser.
//!
//! Recursive descent over the grammar:
//!
//! ```text
//! expr      := term ( "or" term )*
//! term      := "confirmed" "(" expr "," expr "," int "," int ")" | generator
//! generator := "sma-gradient" "(" int [ "," int ] ")"
//!            | "ema-gradient" "(" int [ "," int ] ")"
//!            | "macd" "(" int "," int "," int ")"
//!            | "rsi" "(" int [ "," number "," number ] ")"
//!            | "periodic" "(" int ")"
//! ```
//!
//! Errors carry the character offset of the failure.

use rust_decimal::Decimal;

use crate::domain::error::ParseError;
use crate::domain::signal::rsi_level::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use crate::domain::strategy::{GeneratorSpec, SignalExpr, DEFAULT_LOOKBACK};

pub fn parse(input: &str) -> Result<SignalExpr, ParseError> {
    let mut parser = Parser::new(input);
    let expr = parser.parse_expr()?;
    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err(ParseError {
            message: format!("unexpected trailing input '{}'", parser.peek_word()),
            position: parser.pos,
        });
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ParseError {
                message: format!("expected '{}', found '{}'", expected, ch),
                position: self.pos,
            }),
            None => Err(ParseError {
                message: format!("expected '{}', found end of input", expected),
                position: self.pos,
            }),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .map(|c| c.is_alphanumeric() || c == '_' || c == '-')
                .unwrap_or(false)
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let mut word = String::new();
        for ch in self.remaining().chars() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                word.push(ch);
            } else {
                break;
            }
        }
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected integer".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    fn parse_number(&mut self) -> Result<Decimal, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<Decimal>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_expr(&mut self) -> Result<SignalExpr, ParseError> {
        let mut expr = self.parse_term()?;
        loop {
            self.skip_whitespace();
            if self.consume_keyword("or") {
                let right = self.parse_term()?;
                expr = SignalExpr::Or(Box::new(expr), Box::new(right));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_term(&mut self) -> Result<SignalExpr, ParseError> {
        self.skip_whitespace();
        if self.consume_keyword("confirmed") {
            self.expect_char('(')?;
            let anchor = self.parse_expr()?;
            self.expect_char(',')?;
            let confirming = self.parse_expr()?;
            self.expect_char(',')?;
            let delay = self.parse_integer()? as u32;
            self.expect_char(',')?;
            let range = self.parse_integer()? as u32;
            self.expect_char(')')?;
            return Ok(SignalExpr::Confirmed {
                anchor: Box::new(anchor),
                confirming: Box::new(confirming),
                delay,
                range,
            });
        }
        self.parse_generator()
    }

    fn parse_generator(&mut self) -> Result<SignalExpr, ParseError> {
        self.skip_whitespace();

        if self.consume_keyword("sma-gradient") {
            let (window, lookback) = self.parse_window_and_lookback()?;
            return Ok(SignalExpr::Generator(GeneratorSpec::SmaGradient {
                window,
                lookback,
            }));
        }

        if self.consume_keyword("ema-gradient") {
            let (window, lookback) = self.parse_window_and_lookback()?;
            return Ok(SignalExpr::Generator(GeneratorSpec::EmaGradient {
                window,
                lookback,
            }));
        }

        if self.consume_keyword("macd") {
            self.expect_char('(')?;
            let fast = self.parse_integer()?;
            self.expect_char(',')?;
            let slow = self.parse_integer()?;
            self.expect_char(',')?;
            let signal = self.parse_integer()?;
            self.expect_char(')')?;
            return Ok(SignalExpr::Generator(GeneratorSpec::MacdCross {
                fast,
                slow,
                signal,
            }));
        }

        if self.consume_keyword("rsi") {
            self.expect_char('(')?;
            let window = self.parse_integer()?;
            let (oversold, overbought) = if self.try_comma() {
                let oversold = self.parse_number()?;
                self.expect_char(',')?;
                let overbought = self.parse_number()?;
                (oversold, overbought)
            } else {
                (DEFAULT_OVERSOLD, DEFAULT_OVERBOUGHT)
            };
            self.expect_char(')')?;
            return Ok(SignalExpr::Generator(GeneratorSpec::RsiLevel {
                window,
                oversold,
                overbought,
            }));
        }

        if self.consume_keyword("periodic") {
            self.expect_char('(')?;
            let frequency_days = self.parse_integer()? as u64;
            self.expect_char(')')?;
            return Ok(SignalExpr::Generator(GeneratorSpec::Periodic {
                frequency_days,
            }));
        }

        Err(ParseError {
            message: format!(
                "expected generator (sma-gradient, ema-gradient, macd, rsi, periodic) \
                 or combinator (or, confirmed), found '{}'",
                self.peek_word()
            ),
            position: self.pos,
        })
    }

    fn parse_window_and_lookback(&mut self) -> Result<(usize, usize), ParseError> {
        self.expect_char('(')?;
        let window = self.parse_integer()?;
        let lookback = if self.try_comma() {
            self.parse_integer()?
        } else {
            DEFAULT_LOOKBACK
        };
        self.expect_char(')')?;
        Ok((window, lookback))
    }

    fn try_comma(&mut self) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_single_generator() {
        let expr = parse("sma-gradient(20)").unwrap();
        assert_eq!(
            expr,
            SignalExpr::Generator(GeneratorSpec::SmaGradient {
                window: 20,
                lookback: DEFAULT_LOOKBACK,
            })
        );
    }

    #[test]
    fn parse_generator_with_lookback() {
        let expr = parse("ema-gradient(50, 5)").unwrap();
        assert_eq!(
            expr,
            SignalExpr::Generator(GeneratorSpec::EmaGradient {
                window: 50,
                lookback: 5,
            })
        );
    }

    #[test]
    fn parse_or_is_left_associative() {
        let expr = parse("sma-gradient(20) or ema-gradient(50) or periodic(7)").unwrap();
        match expr {
            SignalExpr::Or(left, right) => {
                assert!(matches!(*left, SignalExpr::Or(_, _)));
                assert_eq!(
                    *right,
                    SignalExpr::Generator(GeneratorSpec::Periodic { frequency_days: 7 })
                );
            }
            other => panic!("expected Or, got {:?}", other),
        }
    }

    #[test]
    fn parse_confirmed() {
        let expr = parse("confirmed(sma-gradient(20), rsi(14), 1, 3)").unwrap();
        match expr {
            SignalExpr::Confirmed {
                anchor,
                confirming,
                delay,
                range,
            } => {
                assert!(matches!(
                    *anchor,
                    SignalExpr::Generator(GeneratorSpec::SmaGradient { window: 20, .. })
                ));
                assert_eq!(
                    *confirming,
                    SignalExpr::Generator(GeneratorSpec::RsiLevel {
                        window: 14,
                        oversold: dec!(30),
                        overbought: dec!(70),
                    })
                );
                assert_eq!(delay, 1);
                assert_eq!(range, 3);
            }
            other => panic!("expected Confirmed, got {:?}", other),
        }
    }

    #[test]
    fn parse_confirmed_with_nested_or() {
        let expr =
            parse("confirmed(sma-gradient(20) or ema-gradient(50), macd(12, 26, 9), 0, 2)")
                .unwrap();
        match expr {
            SignalExpr::Confirmed { anchor, .. } => {
                assert!(matches!(*anchor, SignalExpr::Or(_, _)));
            }
            other => panic!("expected Confirmed, got {:?}", other),
        }
    }

    #[test]
    fn parse_rsi_with_levels() {
        let expr = parse("rsi(14, 25.5, 75)").unwrap();
        assert_eq!(
            expr,
            SignalExpr::Generator(GeneratorSpec::RsiLevel {
                window: 14,
                oversold: dec!(25.5),
                overbought: dec!(75),
            })
        );
    }

    #[test]
    fn error_reports_position_of_unknown_word() {
        let err = parse("sma-gradient(20) or vwap(3)").unwrap_err();
        assert_eq!(err.position, 20);
        assert!(err.message.contains("vwap"));
    }

    #[test]
    fn error_on_missing_closing_paren() {
        let err = parse("sma-gradient(20").unwrap_err();
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn error_on_trailing_input() {
        let err = parse("periodic(7) periodic(7)").unwrap_err();
        assert!(err.message.contains("trailing"));
    }

    #[test]
    fn error_on_empty_input() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn display_output_reparses() {
        let inputs = [
            "sma-gradient(20, 1)",
            "confirmed(sma-gradient(20, 1), rsi(14, 30, 70), 1, 3)",
            "ema-gradient(50, 5) or periodic(7)",
        ];
        for input in inputs {
            let expr = parse(input).unwrap();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr);
        }
    }
}
