//! The canvas is the framebuffer shared by everything that draws onto a Minishift array. It is a
//! row of columns, each column a byte whose bit `n` is pixel row `n` counted from the top.
//!
//! Canvases come in two shapes. A fixed canvas has a width set at construction and rejects (or,
//! with wrapping enabled, folds back) writes past its right edge. An unbounded canvas grows to
//! the right to hold whatever is written to it, which is what a scrolling message needs.

use std::fmt;

use itertools::iproduct;

use crate::font;

/// Number of pixel rows in a column.
pub const ROWS: i32 = 8;

/// Errors raised by canvas addressing and text rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The column is negative, or past the right edge of a fixed canvas that does not wrap.
    #[error("column {0} is outside the canvas")]
    ColumnOutOfRange(i32),
    /// The row is outside `0..ROWS`.
    #[error("row {0} is outside the canvas")]
    RowOutOfRange(i32),
    /// The font has no glyph for the character.
    #[error("no glyph for character {0:?}")]
    UnknownGlyph(char),
}

impl Error {
    /// Whether this is a column or row addressing error, as opposed to a font miss.
    pub fn is_addressing(&self) -> bool {
        match self {
            Error::ColumnOutOfRange(_) | Error::RowOutOfRange(_) => true,
            Error::UnknownGlyph(_) => false,
        }
    }
}

/// A framebuffer of 8-pixel columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    columns: Vec<u8>,
    capacity: Option<usize>,
    wrap: bool,
}

/// The outcome of a best-effort render: whatever could be drawn, plus the errors that were
/// skipped over to get there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub canvas: Canvas,
    /// The column at which rendering stopped.
    pub next_x: i32,
    pub suppressed: Vec<Error>,
}

impl Rendered {
    pub fn is_complete(&self) -> bool {
        self.suppressed.is_empty()
    }
}

impl Canvas {
    /// Create a blank canvas exactly `capacity` columns wide.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            panic!("Fixed canvas must be at least one column wide.");
        }
        Canvas {
            columns: vec![0; capacity],
            capacity: Some(capacity),
            wrap: false,
        }
    }

    /// Create an empty canvas that grows to accommodate whatever is written to it.
    pub fn unbounded() -> Self {
        Canvas {
            columns: Vec::new(),
            capacity: None,
            wrap: false,
        }
    }

    /// Builder form of `set_wrap`.
    pub fn with_wrap(self, wrap: bool) -> Self {
        Self { wrap, ..self }
    }

    /// Control whether columns past the right edge of a fixed canvas wrap around to the left edge
    /// instead of being rejected. Has no effect on unbounded canvases.
    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// The fixed width of the canvas, or `None` if it is unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// The number of columns currently held.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.columns
    }

    /// The canvas as the byte stream a Minishift array expects: one byte per column, left to
    /// right.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.columns.clone()
    }

    /// Map a column coordinate onto an index into storage, applying the wrapping and bounds rules
    /// but not growing anything.
    fn resolve(&self, x: i32) -> Result<usize, Error> {
        if x < 0 {
            return Err(Error::ColumnOutOfRange(x));
        }
        let idx = x as usize;
        match self.capacity {
            Some(capacity) if idx >= capacity => {
                if self.wrap {
                    Ok(idx % capacity)
                } else {
                    Err(Error::ColumnOutOfRange(x))
                }
            }
            _ => Ok(idx),
        }
    }

    fn column_mut(&mut self, x: i32) -> Result<&mut u8, Error> {
        let idx = self.resolve(x)?;
        if idx >= self.columns.len() {
            // Only reachable on unbounded canvases; fixed ones always hold `capacity` columns.
            self.columns.resize(idx + 1, 0);
        }
        Ok(&mut self.columns[idx])
    }

    fn check_row(y: i32) -> Result<(), Error> {
        if y < 0 || y >= ROWS {
            return Err(Error::RowOutOfRange(y));
        }
        Ok(())
    }

    /// Read a whole column. Columns past the end of an unbounded canvas read as blank.
    pub fn get_column(&self, x: i32) -> Result<u8, Error> {
        let idx = self.resolve(x)?;
        Ok(self.columns.get(idx).cloned().unwrap_or(0))
    }

    /// Overwrite a whole column.
    pub fn set_column(&mut self, x: i32, value: u8) -> Result<(), Error> {
        *self.column_mut(x)? = value;
        Ok(())
    }

    /// Read the pixel at column `x`, row `y`.
    pub fn get_pixel(&self, x: i32, y: i32) -> Result<bool, Error> {
        let column = self.get_column(x)?;
        Self::check_row(y)?;
        Ok((column >> y) & 1 == 1)
    }

    /// Light (`on == true`) or clear the pixel at column `x`, row `y`, leaving the other rows of
    /// the column alone.
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) -> Result<(), Error> {
        Self::check_row(y)?;
        let column = self.column_mut(x)?;
        if on {
            *column |= 1 << y;
        } else {
            *column &= !(1 << y);
        }
        Ok(())
    }

    /// Draw the glyph for `c` with its left edge at column `x`, returning the column just past it.
    ///
    /// Blank columns at either side of a glyph are not drawn, so text comes out proportionally
    /// spaced. The space character is the exception and always occupies its full width.
    pub fn write_char(&mut self, x: i32, c: char) -> Result<i32, Error> {
        let glyph = font::glyph(c).ok_or(Error::UnknownGlyph(c))?;
        let columns = if c == ' ' { glyph } else { trim_blank(glyph) };
        let mut x = x;
        for &column in columns {
            self.set_column(x, column)?;
            x = advance(x)?;
        }
        Ok(x)
    }

    /// Draw `text` starting at column `x`, with one blank column after every character. Returns
    /// the column just past the final spacer.
    pub fn write_text(&mut self, x: i32, text: &str) -> Result<i32, Error> {
        let mut x = x;
        for c in text.chars() {
            x = self.write_char(x, c)?;
            self.set_column(x, 0)?;
            x = advance(x)?;
        }
        Ok(x)
    }

    /// Best-effort version of `write_text` that consumes the canvas and never fails.
    ///
    /// Characters missing from the font are skipped. The first addressing error ends rendering,
    /// keeping whatever had been drawn up to that point. Every error passed over is reported in
    /// `Rendered::suppressed`.
    pub fn render(mut self, x: i32, text: &str) -> Rendered {
        let mut x = x;
        let mut suppressed = Vec::new();
        for c in text.chars() {
            match self.write_char(x, c) {
                Ok(next) => {
                    x = next;
                    if let Err(e) = self.set_column(x, 0).and_then(|_| advance(x)) {
                        suppressed.push(e);
                        break;
                    }
                    x += 1;
                }
                Err(e @ Error::UnknownGlyph(_)) => suppressed.push(e),
                Err(e) => {
                    suppressed.push(e);
                    break;
                }
            }
        }
        Rendered {
            canvas: self,
            next_x: x,
            suppressed,
        }
    }

    /// Iterate over the canvas one column at a time, each as a canvas of its own. Pushing these
    /// to a Minishift array one after another scrolls the canvas across it.
    pub fn scroll(&self) -> Scroll {
        Scroll {
            canvas: self,
            next: 0,
        }
    }
}

/// The column after `x`, if there is one.
fn advance(x: i32) -> Result<i32, Error> {
    x.checked_add(1).ok_or(Error::ColumnOutOfRange(x))
}

/// Strip the blank columns from both sides of a glyph.
fn trim_blank(glyph: &[u8]) -> &[u8] {
    let first = glyph.iter().position(|&c| c != 0);
    let last = glyph.iter().rposition(|&c| c != 0);
    match (first, last) {
        (Some(first), Some(last)) => &glyph[first..=last],
        _ => &[],
    }
}

impl fmt::Display for Canvas {
    /// Draws the canvas as eight lines of `#` (lit) and `.` (unlit).
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (y, (x, column)) in iproduct!(0..ROWS, self.columns.iter().enumerate()) {
            if x == 0 && y > 0 {
                f.write_str("\n")?;
            }
            f.write_str(if (*column >> y) & 1 == 1 { "#" } else { "." })?;
        }
        Ok(())
    }
}

/// Iterator returned by `Canvas::scroll`.
#[derive(Clone, Debug)]
pub struct Scroll<'c> {
    canvas: &'c Canvas,
    next: usize,
}

impl<'c> Iterator for Scroll<'c> {
    type Item = Canvas;

    fn next(&mut self) -> Option<Canvas> {
        let column = *self.canvas.columns.get(self.next)?;
        self.next += 1;
        Some(Canvas {
            columns: vec![column],
            capacity: Some(1),
            wrap: false,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.canvas.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<'c> ExactSizeIterator for Scroll<'c> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph_cols(c: char) -> Vec<u8> {
        trim_blank(font::glyph(c).unwrap()).to_vec()
    }

    #[test]
    fn fixed_bounds() {
        for capacity in 1..10 {
            let mut canvas = Canvas::new(capacity);
            let edge = capacity as i32;
            assert_eq!(canvas.set_column(edge - 1, 0xAA), Ok(()));
            assert_eq!(canvas.get_column(edge - 1), Ok(0xAA));
            assert_eq!(
                canvas.set_column(edge, 0xAA),
                Err(Error::ColumnOutOfRange(edge))
            );
            assert_eq!(canvas.get_column(edge), Err(Error::ColumnOutOfRange(edge)));
            assert_eq!(canvas.len(), capacity);
        }
    }

    #[test]
    fn fixed_wrapping() {
        for (capacity, k) in iproduct!(1..6usize, 0..20i32) {
            let mut wrapped = Canvas::new(capacity).with_wrap(true);
            let mut direct = Canvas::new(capacity).with_wrap(true);
            wrapped.set_column(capacity as i32 + k, 0x5A).unwrap();
            direct.set_column(k % capacity as i32, 0x5A).unwrap();
            assert_eq!(wrapped, direct);
            assert_eq!(wrapped.get_column(capacity as i32 + k), Ok(0x5A));
            assert_eq!(wrapped.len(), capacity);
        }
    }

    #[test]
    fn unbounded_growth() {
        let mut canvas = Canvas::unbounded();
        assert!(canvas.is_empty());
        canvas.set_column(2, 0x01).unwrap();
        assert_eq!(canvas.as_bytes(), &[0, 0, 0x01]);
        canvas.set_column(6, 0xFF).unwrap();
        assert_eq!(canvas.as_bytes(), &[0, 0, 0x01, 0, 0, 0, 0xFF]);
        canvas.set_column(4, 0x10).unwrap();
        assert_eq!(canvas.len(), 7);
    }

    #[test]
    fn unbounded_read_past_end() {
        let canvas = Canvas::unbounded();
        assert_eq!(canvas.get_column(12), Ok(0));
        assert_eq!(canvas.get_pixel(12, 3), Ok(false));
        assert!(canvas.is_empty());
    }

    #[test]
    fn wrap_ignored_when_unbounded() {
        let mut canvas = Canvas::unbounded().with_wrap(true);
        canvas.set_column(3, 1).unwrap();
        assert_eq!(canvas.len(), 4);
    }

    #[test]
    fn negative_columns() {
        let mut fixed = Canvas::new(4);
        let mut wrapping = Canvas::new(4).with_wrap(true);
        let mut unbounded = Canvas::unbounded();
        for canvas in [&mut fixed, &mut wrapping, &mut unbounded].iter_mut() {
            assert_eq!(canvas.set_column(-1, 1), Err(Error::ColumnOutOfRange(-1)));
            assert_eq!(canvas.get_column(-5), Err(Error::ColumnOutOfRange(-5)));
            assert_eq!(canvas.set_pixel(-1, 0, true), Err(Error::ColumnOutOfRange(-1)));
        }
        assert!(unbounded.is_empty());
    }

    #[test]
    fn rows_out_of_range() {
        let mut canvas = Canvas::unbounded();
        assert_eq!(canvas.set_pixel(0, 8, true), Err(Error::RowOutOfRange(8)));
        assert_eq!(canvas.set_pixel(0, -1, true), Err(Error::RowOutOfRange(-1)));
        assert_eq!(canvas.get_pixel(0, 8), Err(Error::RowOutOfRange(8)));
        // A rejected pixel write must not grow the canvas.
        assert!(canvas.is_empty());
    }

    #[test]
    fn pixel_set_then_clear() {
        let starts = [0x00u8, 0x5A, 0xA5, 0xFF];
        for (x, y, start) in iproduct!(0..3i32, 0..ROWS, starts.iter().cloned()) {
            let mut canvas = Canvas::new(3);
            let original = start & !(1 << y);
            canvas.set_column(x, original).unwrap();
            canvas.set_pixel(x, y, true).unwrap();
            assert_eq!(canvas.get_column(x), Ok(original | (1 << y)));
            assert_eq!(canvas.get_pixel(x, y), Ok(true));
            canvas.set_pixel(x, y, false).unwrap();
            assert_eq!(canvas.get_column(x), Ok(original));
            assert_eq!(canvas.get_pixel(x, y), Ok(false));
        }
    }

    #[test]
    fn pixel_layout() {
        let mut canvas = Canvas::new(2);
        canvas.set_pixel(1, 0, true).unwrap();
        canvas.set_pixel(1, 7, true).unwrap();
        assert_eq!(canvas.to_bytes(), vec![0x00, 0x81]);
    }

    #[test]
    fn to_bytes_in_column_order() {
        let mut canvas = Canvas::unbounded();
        canvas.set_column(0, 5).unwrap();
        canvas.set_column(1, 0).unwrap();
        canvas.set_column(2, 255).unwrap();
        assert_eq!(canvas.to_bytes(), vec![5, 0, 255]);
    }

    #[test]
    fn write_text_proportional() {
        let mut canvas = Canvas::unbounded();
        let next = canvas.write_text(0, "AB").unwrap();
        let mut expect = glyph_cols('A');
        expect.push(0);
        expect.extend(glyph_cols('B'));
        expect.push(0);
        assert_eq!(canvas.as_bytes(), &expect[..]);
        assert_eq!(next as usize, expect.len());
        assert_eq!(next, 12);
    }

    #[test]
    fn write_char_trims_blank_edges() {
        let mut canvas = Canvas::unbounded();
        assert_eq!(canvas.write_char(0, 'I'), Ok(3));
        assert_eq!(canvas.as_bytes(), &[0x41, 0x7F, 0x41]);
    }

    #[test]
    fn write_char_keeps_interior_blanks() {
        let mut canvas = Canvas::unbounded();
        assert_eq!(canvas.write_char(0, '"'), Ok(3));
        assert_eq!(canvas.as_bytes(), &[0x07, 0x00, 0x07]);
    }

    #[test]
    fn space_keeps_full_width() {
        let mut canvas = Canvas::unbounded();
        assert_eq!(canvas.write_char(0, ' '), Ok(font::GLYPH_WIDTH as i32));
        assert_eq!(canvas.write_text(0, "I I"), Ok(3 + 1 + 5 + 1 + 3 + 1));
    }

    #[test]
    fn write_char_at_offset() {
        let mut canvas = Canvas::new(10);
        assert_eq!(canvas.write_char(4, 'I'), Ok(7));
        assert_eq!(canvas.as_bytes(), &[0, 0, 0, 0, 0x41, 0x7F, 0x41, 0, 0, 0]);
    }

    #[test]
    fn unknown_glyph() {
        let mut canvas = Canvas::unbounded();
        assert_eq!(canvas.write_char(0, 'é'), Err(Error::UnknownGlyph('é')));
        assert_eq!(canvas.write_text(0, "Aé"), Err(Error::UnknownGlyph('é')));
        assert!(!Error::UnknownGlyph('é').is_addressing());
    }

    #[test]
    fn write_at_last_column() {
        let mut canvas = Canvas::new(4).with_wrap(true);
        assert_eq!(
            canvas.write_char(i32::MAX, 'I'),
            Err(Error::ColumnOutOfRange(i32::MAX))
        );
        // The first column still landed, wrapped round to i32::MAX % 4.
        assert_eq!(canvas.get_column(3), Ok(0x41));
        assert_eq!(
            canvas.write_text(i32::MAX - 3, "I"),
            Err(Error::ColumnOutOfRange(i32::MAX))
        );

        let rendered = Canvas::new(4).with_wrap(true).render(i32::MAX - 3, "II");
        assert_eq!(rendered.suppressed, vec![Error::ColumnOutOfRange(i32::MAX)]);
        assert_eq!(rendered.next_x, i32::MAX);
    }

    #[test]
    fn write_text_overflows_fixed() {
        let mut canvas = Canvas::new(8);
        assert_eq!(canvas.write_text(0, "HELLO"), Err(Error::ColumnOutOfRange(8)));
        assert!(Error::ColumnOutOfRange(8).is_addressing());
        // Whatever fit before the edge is kept.
        assert_eq!(&canvas.as_bytes()[..5], &glyph_cols('H')[..]);
    }

    #[test]
    fn render_truncates_at_edge() {
        let rendered = Canvas::new(8).render(0, "HELLO");
        assert_eq!(rendered.suppressed, vec![Error::ColumnOutOfRange(8)]);
        assert!(!rendered.is_complete());
        // Stopped at the start of the 'E' that did not fit.
        assert_eq!(rendered.next_x, 6);
        let mut expect = Canvas::new(8);
        let _ = expect.write_text(0, "HELLO");
        assert_eq!(rendered.canvas, expect);
    }

    #[test]
    fn render_skips_unknown_glyphs() {
        let rendered = Canvas::unbounded().render(0, "AéB");
        assert_eq!(rendered.suppressed, vec![Error::UnknownGlyph('é')]);
        let mut expect = Canvas::unbounded();
        let next = expect.write_text(0, "AB").unwrap();
        assert_eq!(rendered.canvas, expect);
        assert_eq!(rendered.next_x, next);
    }

    #[test]
    fn render_complete() {
        let rendered = Canvas::unbounded().render(0, "OK");
        assert!(rendered.is_complete());
        assert_eq!(rendered.next_x as usize, rendered.canvas.len());
    }

    #[test]
    fn scroll_frames() {
        let mut canvas = Canvas::unbounded();
        canvas.write_text(0, "Hi").unwrap();
        let frames = canvas.scroll();
        assert_eq!(frames.len(), canvas.len());
        for (x, frame) in frames.enumerate() {
            assert_eq!(frame.capacity(), Some(1));
            assert_eq!(frame.to_bytes(), vec![canvas.get_column(x as i32).unwrap()]);
        }
    }

    #[test]
    fn scroll_restarts() {
        let mut canvas = Canvas::unbounded();
        canvas.write_text(0, "AB").unwrap();
        let mut first = canvas.scroll();
        first.next();
        let rest: Vec<_> = first.clone().collect();
        assert_eq!(rest.len(), canvas.len() - 1);
        assert_eq!(first.count(), canvas.len() - 1);
        assert_eq!(canvas.scroll().count(), canvas.len());
        assert_eq!(Canvas::unbounded().scroll().count(), 0);
    }

    #[test]
    fn text_art() {
        let mut canvas = Canvas::new(3);
        canvas.set_column(0, 0x81).unwrap();
        canvas.set_column(2, 0x02).unwrap();
        assert_eq!(
            canvas.to_string(),
            "#..\n..#\n...\n...\n...\n...\n...\n#.."
        );
    }

    #[test]
    #[should_panic]
    fn zero_width() {
        Canvas::new(0);
    }
}
