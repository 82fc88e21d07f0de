//! Path grammar parser for `d=""` attributes.
//!
//! Only the straight-line vocabulary is understood: `M m L l H h V v Z z`.
//! The parser never fails. Tokens it cannot use are dropped and reported,
//! so one bad path can't take the whole document down with it.
//!
//! ## Curves
//!
//! Circuit-layer exports only draw with straight segments. Curve commands
//! (`C S Q T A`) are reported as unsupported and their arguments skipped;
//! whatever straight geometry surrounds them is still returned.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::diagnostics::DiagnosticKind;
use crate::geometry::{BoundingBox, Point};

/// One sub-path: the vertices between a move and the next move/close.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubPath {
    pub points: Vec<Point>,
    /// An explicit `Z`/`z` ended this sub-path.
    pub closed: bool,
}

/// Parsed path data plus everything the parser had to drop along the way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    pub subpaths: Vec<SubPath>,
    pub issues: Vec<DiagnosticKind>,
}

impl PathData {
    /// The first sub-path, which the classifier treats as the outline.
    pub fn primary(&self) -> Option<&SubPath> {
        self.subpaths.first()
    }

    /// Every vertex of every sub-path, in order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.subpaths.iter().flat_map(|s| s.points.iter().copied())
    }

    pub fn vertex_count(&self) -> usize {
        self.subpaths.iter().map(|s| s.points.len()).sum()
    }

    /// Fewer than two coordinate pairs: no usable geometry.
    pub fn is_degenerate(&self) -> bool {
        self.vertex_count() < 2
    }

    /// Bounding box over all sub-paths.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.is_degenerate() {
            return None;
        }
        BoundingBox::from_points(self.points())
    }

    /// Shift every vertex by (dx, dy). Issues carry over unchanged.
    pub fn translate(&self, dx: f64, dy: f64) -> PathData {
        PathData {
            subpaths: self
                .subpaths
                .iter()
                .map(|s| SubPath {
                    points: s.points.iter().map(|p| p.translate(dx, dy)).collect(),
                    closed: s.closed,
                })
                .collect(),
            issues: self.issues.clone(),
        }
    }

    /// Write the sub-paths back out as absolute `M`/`L`/`Z` data.
    ///
    /// A closed sub-path's repeated start vertex is folded into the `Z`.
    pub fn to_path_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for sub in &self.subpaths {
            let mut points: &[Point] = &sub.points;
            if sub.closed && points.len() > 1 {
                points = &points[..points.len() - 1];
            }
            for (i, p) in points.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                parts.push(format!("{}{},{}", cmd, p.x, p.y));
            }
            if sub.closed {
                parts.push("Z".to_string());
            }
        }
        parts.join(" ")
    }
}

// ============================================================================
// TOKENIZER
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Command(char),
    Unsupported(char),
    Number(f64),
    Malformed(String),
}

const COMMANDS: &str = "MmLlHhVvZz";
const CURVE_COMMANDS: &str = "CcSsQqTtAa";

#[inline]
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

#[inline]
fn starts_number(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-' || c == '+'
}

fn tokenize(d: &str) -> Vec<Token> {
    // ## Rust Lesson #23: Peekable iterators
    //
    // `char_indices().peekable()` lets us look one character ahead without
    // consuming it, which is all a number scanner needs. The byte indices
    // let us slice the original string instead of building new ones.
    let mut chars = d.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(start, c)) = chars.peek() {
        if is_separator(c) {
            chars.next();
        } else if COMMANDS.contains(c) {
            chars.next();
            tokens.push(Token::Command(c));
        } else if CURVE_COMMANDS.contains(c) {
            chars.next();
            tokens.push(Token::Unsupported(c));
        } else if starts_number(c) {
            tokens.push(scan_number(d, start, &mut chars));
        } else {
            // Junk run: consume until something we recognise again
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if is_separator(c) || starts_number(c) || COMMANDS.contains(c) || CURVE_COMMANDS.contains(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token::Malformed(d[start..end].to_string()));
        }
    }

    tokens
}

/// Scan one number the SVG way: `1-2` is two numbers and so is `.5.5`.
fn scan_number(d: &str, start: usize, chars: &mut Peekable<CharIndices<'_>>) -> Token {
    let mut end = start;
    let mut digits = 0;
    let mut seen_dot = false;

    if let Some(&(i, c)) = chars.peek() {
        if c == '-' || c == '+' {
            end = i + 1;
            chars.next();
        }
    }

    while let Some(&(i, c)) = chars.peek() {
        if c.is_ascii_digit() {
            digits += 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end = i + 1;
        chars.next();
    }

    // Exponent only counts when digits actually follow it
    if digits > 0 {
        if let Some(&(i, c)) = chars.peek() {
            if c == 'e' || c == 'E' {
                let rest = &d[i + 1..];
                let sign_len = usize::from(rest.starts_with('-') || rest.starts_with('+'));
                let exp_digits = rest[sign_len..].chars().take_while(|c| c.is_ascii_digit()).count();
                if exp_digits > 0 {
                    let exp_end = i + 1 + sign_len + exp_digits;
                    while let Some(&(j, _)) = chars.peek() {
                        if j >= exp_end {
                            break;
                        }
                        chars.next();
                    }
                    end = exp_end;
                }
            }
        }
    }

    let text = &d[start..end];
    if digits == 0 {
        return Token::Malformed(text.to_string());
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Token::Number(v),
        _ => Token::Malformed(text.to_string()),
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Parser state while walking the token stream.
struct PathBuilder {
    subpaths: Vec<SubPath>,
    issues: Vec<DiagnosticKind>,
    current: Vec<Point>,
    cursor: Point,
    start: Point,
    has_cursor: bool,
}

impl PathBuilder {
    fn new() -> Self {
        Self {
            subpaths: Vec::new(),
            issues: Vec::new(),
            current: Vec::new(),
            cursor: Point::new(0.0, 0.0),
            start: Point::new(0.0, 0.0),
            has_cursor: false,
        }
    }

    fn finish_subpath(&mut self, closed: bool) {
        if !self.current.is_empty() {
            let points = std::mem::take(&mut self.current);
            self.subpaths.push(SubPath { points, closed });
        }
    }

    fn move_to(&mut self, p: Point) {
        self.finish_subpath(false);
        self.current.push(p);
        self.cursor = p;
        self.start = p;
        self.has_cursor = true;
    }

    fn line_to(&mut self, p: Point) {
        if self.current.is_empty() {
            // Drawing without a move (or right after a close) starts at the cursor
            self.start = self.cursor;
            self.current.push(self.cursor);
        }
        self.current.push(p);
        self.cursor = p;
        self.has_cursor = true;
    }

    fn close(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.current.push(self.start);
        self.finish_subpath(true);
        self.cursor = self.start;
    }

    fn drop_numbers(&mut self, pending: &mut Vec<f64>) {
        for v in pending.drain(..) {
            self.issues.push(DiagnosticKind::MalformedNumericToken { token: v.to_string() });
        }
    }

    fn finish(mut self) -> PathData {
        self.finish_subpath(false);
        PathData {
            subpaths: self.subpaths,
            issues: self.issues,
        }
    }
}

/// Parse a `d` attribute into sub-paths of absolute vertices.
///
/// # Example
/// ```
/// use hollow::path::parse_path_data;
///
/// let data = parse_path_data("M 0,0 h 10 v 5 H 0 z");
/// assert_eq!(data.subpaths.len(), 1);
/// assert!(data.subpaths[0].closed);
/// assert_eq!(data.subpaths[0].points.len(), 5);
/// ```
pub fn parse_path_data(d: &str) -> PathData {
    let mut builder = PathBuilder::new();
    let mut command: Option<char> = None;
    let mut skipping_curve = false;
    let mut pending: Vec<f64> = Vec::with_capacity(2);

    for token in tokenize(d) {
        match token {
            Token::Command(c) => {
                builder.drop_numbers(&mut pending);
                skipping_curve = false;
                if c == 'Z' || c == 'z' {
                    builder.close();
                }
                command = Some(c);
            }
            Token::Unsupported(c) => {
                builder.drop_numbers(&mut pending);
                builder.issues.push(DiagnosticKind::UnsupportedPathCommand { command: c });
                skipping_curve = true;
                command = None;
            }
            Token::Malformed(text) => {
                builder.issues.push(DiagnosticKind::MalformedNumericToken { token: text });
            }
            Token::Number(v) => {
                let Some(c) = command else {
                    if !skipping_curve {
                        builder.issues.push(DiagnosticKind::MalformedNumericToken { token: v.to_string() });
                    }
                    continue;
                };

                match c {
                    'M' | 'm' | 'L' | 'l' => {
                        pending.push(v);
                        if pending.len() < 2 {
                            continue;
                        }
                        let (x, y) = (pending[0], pending[1]);
                        pending.clear();

                        let relative = c.is_ascii_lowercase() && builder.has_cursor;
                        let p = if relative {
                            builder.cursor.translate(x, y)
                        } else {
                            Point::new(x, y)
                        };

                        if c == 'M' || c == 'm' {
                            builder.move_to(p);
                            // Further pairs after a move are implicit line-tos
                            command = Some(if c == 'M' { 'L' } else { 'l' });
                        } else {
                            builder.line_to(p);
                        }
                    }
                    'H' => builder.line_to(Point::new(v, builder.cursor.y)),
                    'h' => builder.line_to(Point::new(builder.cursor.x + v, builder.cursor.y)),
                    'V' => builder.line_to(Point::new(builder.cursor.x, v)),
                    'v' => builder.line_to(Point::new(builder.cursor.x, builder.cursor.y + v)),
                    _ => {
                        // Numbers after a close have nothing to attach to
                        builder.issues.push(DiagnosticKind::MalformedNumericToken { token: v.to_string() });
                    }
                }
            }
        }
    }

    builder.drop_numbers(&mut pending);
    builder.finish()
}

/// Rewrite path data so equal geometry compares equal as text: separators
/// become single spaces and decimals are fixed to six places.
pub fn normalize_path_data(d: &str) -> String {
    tokenize(d)
        .into_iter()
        .filter_map(|t| match t {
            Token::Command(c) | Token::Unsupported(c) => Some(c.to_string()),
            Token::Number(v) => Some(format!("{:.6}", v)),
            Token::Malformed(_) => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(data: &PathData, i: usize) -> Vec<(f64, f64)> {
        data.subpaths[i].points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn absolute_rectangle() {
        let data = parse_path_data("M 0,0 L 10,0 L 10,0.3 L 0,0.3 Z");
        assert_eq!(data.subpaths.len(), 1);
        assert!(data.subpaths[0].closed);
        assert_eq!(
            pts(&data, 0),
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 0.3), (0.0, 0.3), (0.0, 0.0)]
        );
        assert!(data.issues.is_empty());
    }

    #[test]
    fn relative_commands_offset_from_cursor() {
        let data = parse_path_data("M10 10 l5 0 v5 h-5 z");
        assert_eq!(
            pts(&data, 0),
            vec![(10.0, 10.0), (15.0, 10.0), (15.0, 15.0), (10.0, 15.0), (10.0, 10.0)]
        );
    }

    #[test]
    fn horizontal_vertical_keep_other_axis() {
        let data = parse_path_data("M 1 2 H 7 V 9");
        assert_eq!(pts(&data, 0), vec![(1.0, 2.0), (7.0, 2.0), (7.0, 9.0)]);
        assert!(!data.subpaths[0].closed);
    }

    #[test]
    fn implicit_lineto_after_move() {
        let data = parse_path_data("M0,0 10,0 10,10");
        assert_eq!(pts(&data, 0), vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);

        let rel = parse_path_data("m1,1 2,0 0,2");
        assert_eq!(pts(&rel, 0), vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0)]);
    }

    #[test]
    fn multiple_subpaths() {
        let data = parse_path_data("M0 0 L4 0 L4 4 Z M1 1 L2 1 L2 2 Z");
        assert_eq!(data.subpaths.len(), 2);
        assert_eq!(data.primary().unwrap().points.len(), 4);
        assert_eq!(data.vertex_count(), 8);
        assert_eq!(data.bounding_box().unwrap().max_x, 4.0);
    }

    #[test]
    fn line_after_close_starts_at_subpath_start() {
        let data = parse_path_data("M5 5 L10 5 L10 10 Z L0 0");
        assert_eq!(data.subpaths.len(), 2);
        assert_eq!(pts(&data, 1), vec![(5.0, 5.0), (0.0, 0.0)]);
    }

    #[test]
    fn scientific_notation_and_packed_numbers() {
        let data = parse_path_data("M1e1,2E-1L-5-5 .5.5");
        assert_eq!(pts(&data, 0), vec![(10.0, 0.2), (-5.0, -5.0), (0.5, 0.5)]);
    }

    #[test]
    fn malformed_tokens_are_dropped() {
        let data = parse_path_data("M 0,0 L 10,#0 L 10,10");
        assert_eq!(pts(&data, 0), vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert!(data
            .issues
            .iter()
            .any(|i| matches!(i, DiagnosticKind::MalformedNumericToken { token } if token == "#")));
    }

    #[test]
    fn dangling_coordinate_is_reported() {
        let data = parse_path_data("M 0,0 L 5");
        assert_eq!(data.vertex_count(), 1);
        assert!(data.is_degenerate());
        assert_eq!(data.bounding_box(), None);
        assert_eq!(data.issues.len(), 1);
    }

    #[test]
    fn curves_are_reported_and_skipped() {
        let data = parse_path_data("M 10,10 C 40,10 60,90 90,90 L 90,10 Z");
        assert_eq!(
            data.issues,
            vec![DiagnosticKind::UnsupportedPathCommand { command: 'C' }]
        );
        assert_eq!(pts(&data, 0), vec![(10.0, 10.0), (90.0, 10.0), (10.0, 10.0)]);
    }

    #[test]
    fn empty_and_garbage_input() {
        assert!(parse_path_data("").subpaths.is_empty());
        let junk = parse_path_data("hello");
        assert!(junk.is_degenerate());
    }

    #[test]
    fn translate_and_write_back() {
        let data = parse_path_data("m1 1 h2 v2 h-2 z").translate(10.0, 0.0);
        assert_eq!(data.to_path_string(), "M11,1 L13,1 L13,3 L11,3 Z");
        assert_eq!(parse_path_data(&data.to_path_string()).subpaths, data.subpaths);
    }

    #[test]
    fn normalization_ignores_separators() {
        let a = normalize_path_data("M 87.7824,22.06726 L 87.7824,22.47366 Z");
        let b = normalize_path_data("M87.78240000 22.06726000   L87.78240000,22.47366000 Z");
        assert_eq!(a, b);
    }
}
