use crate::screen::{Buffer, Pos, Style};

/// Depth of the help box, above every visualizer layer
pub const HELP_Z: i32 = 100;

/// Draw a centered, bordered box holding `lines`. Clipped to the buffer.
pub fn render_help_overlay(buf: &mut Buffer, lines: &[&str], border: Style, text: Style) {
    if lines.is_empty() {
        return;
    }

    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines.len() + 2;

    let start_x = buf.cols().saturating_sub(box_width) / 2;
    let start_row = buf.rows().saturating_sub(box_height) / 2;
    let rows = buf.rows() as i32;
    let at = |x: usize, row: usize| Pos::new(x as i32, rows - 1 - row as i32);

    let hline = |buf: &mut Buffer, row: usize, left: &str, right: &str| {
        buf.compose(at(start_x, row), HELP_Z, border, left);
        for x in 1..box_width - 1 {
            buf.compose(at(start_x + x, row), HELP_Z, border, "─");
        }
        buf.compose(at(start_x + box_width - 1, row), HELP_Z, border, right);
    };

    hline(buf, start_row, "┌", "┐");
    for (i, line) in lines.iter().enumerate() {
        let row = start_row + 1 + i;
        buf.compose(at(start_x, row), HELP_Z, border, "│");

        let padding = max_width.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        let mut utf8 = [0u8; 4];
        for (j, ch) in padded.chars().enumerate() {
            buf.compose(at(start_x + 1 + j, row), HELP_Z, text, ch.encode_utf8(&mut utf8));
        }

        buf.compose(at(start_x + box_width - 1, row), HELP_Z, border, "│");
    }
    hline(buf, start_row + box_height - 1, "└", "┘");
}
