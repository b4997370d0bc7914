use std::io::{self, Write};

use crossterm::cursor::{MoveTo, MoveToNextLine};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use emu8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use emu8_core::state::FrameBuffer;

/// Each Chip-8 pixel becomes this many characters so the picture keeps its
/// 2:1 shape in a terminal, whose cells are about twice as tall as they are wide.
const SCALE: usize = 2;

const LIT: char = '█';
const UNLIT: char = ' ';

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels.
/// The on/off state of these pixels is encoded as true/false in a 2d array.
/// The display only gets a call to `render` when the Chip-8 FrameBuffer is updated.
///
/// Frames are drawn into a terminal through crossterm commands, each one over the
/// last from the top left corner, inside a border.
pub struct Display<W: Write> {
    out: W,
    width: usize,
    height: usize,
}

impl<W: Write> Display<W> {
    /// Creates a new display that queues its frames on `out`.
    pub fn new(out: W) -> Self {
        Display {
            out,
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
        }
    }

    /// Formats a Chip-8 FrameBuffer as lines of text.
    ///
    /// This creates a block rendering by:
    /// - Turning every pixel into `SCALE` lit or unlit characters
    /// - Wrapping each row in a vertical border
    /// - Adding a horizontal border above and below
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    fn frame_to_lines(&self, frame: &FrameBuffer) -> Vec<String> {
        let border: String = std::iter::once('+')
            .chain(std::iter::repeat('-').take(self.width * SCALE))
            .chain(std::iter::once('+'))
            .collect();

        let mut lines = Vec::with_capacity(self.height + 2);
        lines.push(border.clone());
        for row in frame.iter().take(self.height) {
            let mut line = String::with_capacity(self.width * SCALE + 2);
            line.push('|');
            for &pixel in row.iter().take(self.width) {
                let c = if pixel { LIT } else { UNLIT };
                line.extend(std::iter::repeat(c).take(SCALE));
            }
            line.push('|');
            lines.push(line);
        }
        lines.push(border);
        lines
    }

    /// Draws the Chip-8 FrameBuffer over the previous frame.
    ///
    /// # Arguments
    /// * `frame` a Chip-8 FrameBuffer
    pub fn render(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::FromCursorDown))?;
        for line in self.frame_to_lines(frame) {
            queue!(self.out, Print(line), MoveToNextLine(1))?;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_lines() {
        let mut frame: FrameBuffer = [[false; 64]; 32];
        frame[0][0..2].copy_from_slice(&[false, true]);
        frame[1][0..2].copy_from_slice(&[true, false]);
        let display = Display::new(Vec::new());
        let lines = display.frame_to_lines(&frame);

        assert_eq!(lines.len(), 34);
        assert_eq!(lines[0], lines[33]);
        assert_eq!(lines[0].chars().count(), 130);
        assert!(lines[1].starts_with("|  ██ "));
        assert!(lines[2].starts_with("|██   "));
        assert_eq!(lines[3], format!("|{}|", " ".repeat(128)));
    }

    #[test]
    fn test_render_writes_frame() {
        let frame: FrameBuffer = [[true; 64]; 32];
        let mut out = Vec::new();
        Display::new(&mut out).render(&frame).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('█').count(), 64 * 32 * SCALE);
        // drawn from the top left corner every time
        assert!(text.starts_with("\u{1b}[1;1H"));
    }
}
