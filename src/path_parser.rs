//! Parser for SVG path data.
//!
//! The grammar is the one in <https://www.w3.org/TR/SVG/paths.html#PathDataBNF>.
//! Commas are optional between numbers and between coordinate pairs, and
//! whitespace is optional when the next token can be told apart anyway, so
//! `M-10,20-30-40` is the same as `M -10 20 -30 -40`.

use std::fmt;

use crate::path_builder::{LargeArc, PathBuilder, Sweep};

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum Token {
    Number(f64),
    Flag(bool),
    Command(u8),
    Comma,
}

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum LexError {
    ParseFloatError,
    UnexpectedByte(u8),
    UnexpectedEof,
}

/// Splits path data into tokens, along with the byte position of each.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    flags_required: u8,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
            flags_required: 0,
        }
    }

    /// Makes the next two digits come out as `Flag` tokens.
    ///
    /// The arc flags can be written without separators, as in `a10 10 0 1120 20`, so
    /// only the parser knows when a `0` or `1` is a flag instead of a number.
    pub fn require_flags(&mut self) {
        self.flags_required = 2;
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) -> bool {
        let start = self.pos;
        while self.peek().map_or(false, &pred) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn skip_one_of(&mut self, a: u8, b: u8) -> bool {
        match self.peek() {
            Some(c) if c == a || c == b => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn match_number(&mut self) -> Result<Token, LexError> {
        let start = self.pos;

        self.skip_one_of(b'-', b'+');
        let int_digits = self.skip_while(|c| c.is_ascii_digit());
        let frac_digits = self.skip_one_of(b'.', b'.') && self.skip_while(|c| c.is_ascii_digit());

        if !int_digits && !frac_digits {
            return Err(match self.peek() {
                None => LexError::UnexpectedEof,
                Some(c) => LexError::UnexpectedByte(c),
            });
        }

        // Only take an exponent if digits follow; a lone `e` is left for the parser to reject.
        let mantissa_end = self.pos;
        if self.skip_one_of(b'e', b'E') {
            self.skip_one_of(b'-', b'+');
            if !self.skip_while(|c| c.is_ascii_digit()) {
                self.pos = mantissa_end;
            }
        }

        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| LexError::ParseFloatError)?
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| LexError::ParseFloatError)
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Result<Token, LexError>);

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_while(|c| c.is_ascii_whitespace());

        let pos = self.pos;
        let c = self.peek()?;

        let token = match c {
            b',' => {
                self.pos += 1;
                Ok(Token::Comma)
            }

            c if c.is_ascii_alphabetic() => {
                self.pos += 1;
                Ok(Token::Command(c))
            }

            b'0' | b'1' if self.flags_required > 0 => {
                self.flags_required -= 1;
                self.pos += 1;
                Ok(Token::Flag(c == b'1'))
            }

            c if self.flags_required > 0 => {
                self.pos += 1;
                Err(LexError::UnexpectedByte(c))
            }

            c if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.' => self.match_number(),

            c => {
                self.pos += 1;
                Err(LexError::UnexpectedByte(c))
            }
        };

        Some((pos, token))
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    UnexpectedToken(Token),
    UnexpectedCommand(u8),
    UnexpectedEof,
    LexError(LexError),
}

#[derive(Debug, PartialEq)]
pub struct ParseError {
    pub position: usize,
    pub kind: ErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self.kind {
            ErrorKind::UnexpectedToken(_) => "unexpected token",
            ErrorKind::UnexpectedCommand(_) => "unexpected command",
            ErrorKind::UnexpectedEof => "unexpected end of data",
            ErrorKind::LexError(_) => "error processing token",
        };
        write!(f, "error at position {}: {}", self.position, description)
    }
}

impl std::error::Error for ParseError {}

/// Recursive descent parser that feeds absolute commands into a [`PathBuilder`].
///
/// Relative commands are resolved against the current point, quadratic curves
/// are raised to cubics, and the smooth variants reflect the previous control
/// point.
pub struct PathParser<'b> {
    tokens: Lexer<'b>,
    lookahead: Option<(usize, Result<Token, LexError>)>,

    // Position of the last command that was consumed.
    last_pos: usize,

    builder: &'b mut PathBuilder,

    current: (f64, f64),

    // Start of the current subpath, for closepath.
    subpath_start: (f64, f64),

    // Control points to reflect for `S` and `T`; equal to the current point
    // when the previous command was not a curve of the same kind.
    cubic_reflection: (f64, f64),
    quadratic_reflection: (f64, f64),
}

impl<'b> PathParser<'b> {
    pub fn new(builder: &'b mut PathBuilder, path_str: &'b str) -> PathParser<'b> {
        let mut tokens = Lexer::new(path_str);
        let lookahead = tokens.next();

        PathParser {
            tokens,
            lookahead,
            last_pos: 0,
            builder,
            current: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            cubic_reflection: (0.0, 0.0),
            quadratic_reflection: (0.0, 0.0),
        }
    }

    pub fn parse(&mut self) -> Result<(), ParseError> {
        if self.lookahead.is_none() {
            return Ok(());
        }

        match self.command()? {
            c @ (b'M' | b'm') => self.command_arguments(c)?,
            c => return Err(self.error_before(ErrorKind::UnexpectedCommand(c))),
        }

        while self.lookahead.is_some() {
            let c = self.command()?;
            self.command_arguments(c)?;
        }

        Ok(())
    }

    fn unexpected(&self) -> ParseError {
        match self.lookahead {
            Some((position, Ok(t))) => ParseError {
                position,
                kind: ErrorKind::UnexpectedToken(t),
            },
            Some((position, Err(e))) => ParseError {
                position,
                kind: ErrorKind::LexError(e),
            },
            None => ParseError {
                position: self.tokens.input.len(),
                kind: ErrorKind::UnexpectedEof,
            },
        }
    }

    // For errors about a token that was already consumed.
    fn error_before(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            position: self.last_pos,
            kind,
        }
    }

    fn advance(&mut self) {
        self.lookahead = self.tokens.next();
    }

    fn command(&mut self) -> Result<u8, ParseError> {
        match self.lookahead {
            Some((pos, Ok(Token::Command(c)))) => {
                self.last_pos = pos;
                self.advance();
                Ok(c)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn eat_comma(&mut self) -> bool {
        if let Some((_, Ok(Token::Comma))) = self.lookahead {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_number(&self) -> bool {
        matches!(self.lookahead, Some((_, Ok(Token::Number(_)))))
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        match self.lookahead {
            Some((_, Ok(Token::Number(n)))) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn comma_number(&mut self) -> Result<f64, ParseError> {
        self.eat_comma();
        self.number()
    }

    fn flag(&mut self) -> Result<bool, ParseError> {
        self.eat_comma();
        match self.lookahead {
            Some((_, Ok(Token::Flag(f)))) => {
                self.advance();
                Ok(f)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn coordinate_pair(&mut self, absolute: bool) -> Result<(f64, f64), ParseError> {
        let x = self.comma_number()?;
        let y = self.comma_number()?;

        if absolute {
            Ok((x, y))
        } else {
            Ok((x + self.current.0, y + self.current.1))
        }
    }

    // A repeated argument list continues after a comma or when a number follows.
    fn more_arguments(&mut self) -> bool {
        self.eat_comma() || self.peek_number()
    }

    fn command_arguments(&mut self, c: u8) -> Result<(), ParseError> {
        let absolute = c.is_ascii_uppercase();

        match c.to_ascii_uppercase() {
            b'Z' => {
                self.close_path();
                return Ok(());
            }

            b'M' => {
                let to = self.coordinate_pair(absolute)?;
                self.move_to(to);

                // Extra pairs after a moveto are implicit linetos.
                if self.more_arguments() {
                    return self.command_arguments(if absolute { b'L' } else { b'l' });
                }
                return Ok(());
            }

            b'L' | b'H' | b'V' | b'C' | b'S' | b'Q' | b'T' | b'A' => (),

            _ => return Err(self.error_before(ErrorKind::UnexpectedCommand(c))),
        }

        loop {
            self.drawto(c.to_ascii_uppercase(), absolute)?;

            if !self.more_arguments() {
                return Ok(());
            }
        }
    }

    fn drawto(&mut self, cmd: u8, absolute: bool) -> Result<(), ParseError> {
        let (cur_x, cur_y) = self.current;

        match cmd {
            b'L' => {
                let to = self.coordinate_pair(absolute)?;
                self.line_to(to);
            }

            b'H' => {
                let x = self.comma_number()?;
                self.line_to((if absolute { x } else { cur_x + x }, cur_y));
            }

            b'V' => {
                let y = self.comma_number()?;
                self.line_to((cur_x, if absolute { y } else { cur_y + y }));
            }

            b'C' => {
                let pt1 = self.coordinate_pair(absolute)?;
                let pt2 = self.coordinate_pair(absolute)?;
                let to = self.coordinate_pair(absolute)?;
                self.curve_to(pt1, pt2, to);
            }

            b'S' => {
                let pt2 = self.coordinate_pair(absolute)?;
                let to = self.coordinate_pair(absolute)?;
                let pt1 = reflect(self.cubic_reflection, self.current);
                self.curve_to(pt1, pt2, to);
            }

            b'Q' => {
                let ctl = self.coordinate_pair(absolute)?;
                let to = self.coordinate_pair(absolute)?;
                self.quadratic_curve_to(ctl, to);
            }

            b'T' => {
                let to = self.coordinate_pair(absolute)?;
                let ctl = reflect(self.quadratic_reflection, self.current);
                self.quadratic_curve_to(ctl, to);
            }

            b'A' => {
                let rx = self.comma_number()?.abs();
                let ry = self.comma_number()?.abs();

                self.eat_comma();
                let x_axis_rotation = match self.lookahead {
                    Some((_, Ok(Token::Number(n)))) => n,
                    _ => return Err(self.unexpected()),
                };

                // The lexer has to know about the flags before it looks past the rotation.
                self.tokens.require_flags();
                self.advance();

                let large_arc = LargeArc(self.flag()?);
                let sweep = if self.flag()? {
                    Sweep::Positive
                } else {
                    Sweep::Negative
                };

                let to = self.coordinate_pair(absolute)?;
                self.arc((rx, ry, x_axis_rotation), (large_arc, sweep), to);
            }

            _ => unreachable!("drawto() only gets called with known commands"),
        }

        Ok(())
    }

    fn set_current_point(&mut self, pt: (f64, f64)) {
        self.current = pt;
        self.cubic_reflection = pt;
        self.quadratic_reflection = pt;
    }

    fn move_to(&mut self, to: (f64, f64)) {
        self.set_current_point(to);
        self.subpath_start = to;
        self.builder.move_to(to.0, to.1);
    }

    fn line_to(&mut self, to: (f64, f64)) {
        self.set_current_point(to);
        self.builder.line_to(to.0, to.1);
    }

    fn curve_to(&mut self, pt1: (f64, f64), pt2: (f64, f64), to: (f64, f64)) {
        self.set_current_point(to);
        self.cubic_reflection = pt2;
        self.builder.curve_to(pt1.0, pt1.1, pt2.0, pt2.1, to.0, to.1);
    }

    fn quadratic_curve_to(&mut self, ctl: (f64, f64), to: (f64, f64)) {
        let (x0, y0) = self.current;
        let (a, b) = ctl;

        // raise quadratic Bézier to cubic
        let pt1 = ((x0 + 2.0 * a) / 3.0, (y0 + 2.0 * b) / 3.0);
        let pt2 = ((to.0 + 2.0 * a) / 3.0, (to.1 + 2.0 * b) / 3.0);

        self.set_current_point(to);
        self.quadratic_reflection = ctl;
        self.builder.curve_to(pt1.0, pt1.1, pt2.0, pt2.1, to.0, to.1);
    }

    fn arc(&mut self, radii_and_rotation: (f64, f64, f64), flags: (LargeArc, Sweep), to: (f64, f64)) {
        let from = self.current;
        self.set_current_point(to);
        self.builder.arc(from, radii_and_rotation, flags, to);
    }

    fn close_path(&mut self) {
        let start = self.subpath_start;
        self.set_current_point(start);
        self.builder.close_path();
    }
}

fn reflect(ctl: (f64, f64), around: (f64, f64)) -> (f64, f64) {
    (2.0 * around.0 - ctl.0, 2.0 * around.1 - ctl.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_builder::{CubicBezierCurve, EllipticalArc, PathCommand};

    fn parse(path_str: &str) -> (Vec<PathCommand>, Result<(), ParseError>) {
        let mut builder = PathBuilder::default();
        let result = builder.parse(path_str);
        (builder.into_path_data().iter().collect(), result)
    }

    fn curveto(x2: f64, y2: f64, x3: f64, y3: f64, x4: f64, y4: f64) -> PathCommand {
        PathCommand::CurveTo(CubicBezierCurve {
            pt1: (x2, y2),
            pt2: (x3, y3),
            to: (x4, y4),
        })
    }

    #[test]
    fn lexes_numbers_commands_and_commas() {
        let tokens: Vec<_> = Lexer::new("M.1-2,3E2 z")
            .map(|(_, t)| t.unwrap())
            .collect();

        assert_eq!(
            tokens,
            vec![
                Token::Command(b'M'),
                Token::Number(0.1),
                Token::Number(-2.0),
                Token::Comma,
                Token::Number(300.0),
                Token::Command(b'z'),
            ]
        );
    }

    #[test]
    fn handles_empty_data() {
        assert_eq!(parse(""), (vec![], Ok(())));
        assert_eq!(parse("   "), (vec![], Ok(())));
    }

    #[test]
    fn handles_separators_and_implicit_lineto() {
        let expected = vec![
            PathCommand::MoveTo(-10.0, 20.0),
            PathCommand::LineTo(-30.0, -40.0),
        ];

        assert_eq!(parse("M -10 20 -30 -40"), (expected.clone(), Ok(())));
        assert_eq!(parse("M-10,20-30-40"), (expected.clone(), Ok(())));
        assert_eq!(parse("M -10, 20, -30, -40"), (expected, Ok(())));
    }

    #[test]
    fn resolves_relative_commands() {
        let (commands, result) = parse("m10 10 l 5 0 h 5 v 5 z l 1 1");

        assert!(result.is_ok());
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(10.0, 10.0),
                PathCommand::LineTo(15.0, 10.0),
                PathCommand::LineTo(20.0, 10.0),
                PathCommand::LineTo(20.0, 15.0),
                PathCommand::ClosePath,
                PathCommand::LineTo(11.0, 11.0),
            ]
        );
    }

    #[test]
    fn reflects_smooth_curves() {
        let (commands, result) = parse("M 0 0 C 10 0 20 10 20 20 S 30 40 40 40");

        assert!(result.is_ok());
        assert_eq!(commands[2], curveto(20.0, 30.0, 30.0, 40.0, 40.0, 40.0));
    }

    #[test]
    fn raises_quadratics_to_cubics() {
        let (commands, result) = parse("M 0 0 Q 30 30 60 0 T 120 0");

        assert!(result.is_ok());
        assert_eq!(commands[1], curveto(20.0, 20.0, 40.0, 20.0, 60.0, 0.0));
        assert_eq!(commands[2], curveto(80.0, -20.0, 100.0, -20.0, 120.0, 0.0));
    }

    #[test]
    fn parses_arc_with_packed_flags() {
        let (commands, result) = parse("M10 10 a20 30 45 1020 20");

        assert!(result.is_ok());
        assert_eq!(
            commands[1],
            PathCommand::Arc(EllipticalArc {
                r: (20.0, 30.0),
                x_axis_rotation: 45.0,
                large_arc: LargeArc(true),
                sweep: Sweep::Negative,
                from: (10.0, 10.0),
                to: (30.0, 30.0),
            })
        );
    }

    #[test]
    fn keeps_commands_before_an_error() {
        let (commands, result) = parse("M 10 20 L 30 40 L 50");

        assert_eq!(
            commands,
            vec![PathCommand::MoveTo(10.0, 20.0), PathCommand::LineTo(30.0, 40.0)]
        );
        assert_eq!(
            result,
            Err(ParseError {
                position: 20,
                kind: ErrorKind::UnexpectedEof,
            })
        );
    }

    #[test]
    fn first_command_must_be_moveto() {
        let (commands, result) = parse("L 10 20");

        assert!(commands.is_empty());
        assert_eq!(
            result,
            Err(ParseError {
                position: 0,
                kind: ErrorKind::UnexpectedCommand(b'L'),
            })
        );
    }

    #[test]
    fn rejects_unknown_commands_and_bytes() {
        let (_, result) = parse("M 10 20 X 1 2");
        assert!(matches!(
            result,
            Err(ParseError {
                position: 8,
                kind: ErrorKind::UnexpectedCommand(b'X'),
            })
        ));

        let (_, result) = parse("M 10 20 # 1 2");
        assert!(matches!(
            result,
            Err(ParseError {
                kind: ErrorKind::LexError(LexError::UnexpectedByte(b'#')),
                ..
            })
        ));
    }
}
