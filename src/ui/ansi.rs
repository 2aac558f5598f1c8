//! Turn sanitized command output into styled ratatui lines.
//!
//! Only SGR sequences are interpreted. Other escape bytes and control
//! characters are dropped, and tabs expand to 8-column stops so the
//! frame buffer never sees raw control codes.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

const TAB_STOP: usize = 8;

const NORMAL: [Color; 8] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::Gray,
];

const BRIGHT: [Color; 8] = [
    Color::DarkGray,
    Color::LightRed,
    Color::LightGreen,
    Color::LightYellow,
    Color::LightBlue,
    Color::LightMagenta,
    Color::LightCyan,
    Color::White,
];

/// `38;5;n` or `38;2;r;g;b` tail of an extended color code.
fn extended_color(codes: &mut impl Iterator<Item = u16>) -> Option<Color> {
    match codes.next()? {
        5 => Some(Color::Indexed(u8::try_from(codes.next()?).ok()?)),
        2 => {
            let r = u8::try_from(codes.next()?).ok()?;
            let g = u8::try_from(codes.next()?).ok()?;
            let b = u8::try_from(codes.next()?).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn apply_sgr(mut style: Style, base: Style, params: &str) -> Style {
    let mut codes = params
        .split(';')
        .map(|p| if p.is_empty() { 0 } else { p.parse::<u16>().unwrap_or(u16::MAX) });
    while let Some(code) = codes.next() {
        style = match code {
            0 => base,
            1 => style.add_modifier(Modifier::BOLD),
            2 => style.add_modifier(Modifier::DIM),
            3 => style.add_modifier(Modifier::ITALIC),
            4 => style.add_modifier(Modifier::UNDERLINED),
            5 => style.add_modifier(Modifier::SLOW_BLINK),
            7 => style.add_modifier(Modifier::REVERSED),
            9 => style.add_modifier(Modifier::CROSSED_OUT),
            22 => style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style.remove_modifier(Modifier::ITALIC),
            24 => style.remove_modifier(Modifier::UNDERLINED),
            25 => style.remove_modifier(Modifier::SLOW_BLINK),
            27 => style.remove_modifier(Modifier::REVERSED),
            29 => style.remove_modifier(Modifier::CROSSED_OUT),
            30..=37 => style.fg(NORMAL[usize::from(code - 30)]),
            38 => match extended_color(&mut codes) {
                Some(c) => style.fg(c),
                None => style,
            },
            39 => style.fg(base.fg.unwrap_or(Color::Reset)),
            40..=47 => style.bg(NORMAL[usize::from(code - 40)]),
            48 => match extended_color(&mut codes) {
                Some(c) => style.bg(c),
                None => style,
            },
            49 => style.bg(base.bg.unwrap_or(Color::Reset)),
            90..=97 => style.fg(BRIGHT[usize::from(code - 90)]),
            100..=107 => style.bg(BRIGHT[usize::from(code - 100)]),
            _ => style,
        };
    }
    style
}

struct LineBuilder {
    spans: Vec<Span<'static>>,
    buf: String,
    style: Style,
    column: usize,
}

impl LineBuilder {
    fn new(style: Style) -> Self {
        Self {
            spans: Vec::new(),
            buf: String::new(),
            style,
            column: 0,
        }
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.spans
                .push(Span::styled(std::mem::take(&mut self.buf), self.style));
        }
    }

    fn set_style(&mut self, style: Style) {
        if style != self.style {
            self.flush();
            self.style = style;
        }
    }

    fn push(&mut self, c: char) {
        self.buf.push(c);
        self.column += c.width().unwrap_or(0);
    }

    fn tab(&mut self) {
        let spaces = TAB_STOP - self.column % TAB_STOP;
        for _ in 0..spaces {
            self.push(' ');
        }
    }

    fn finish(mut self) -> (Line<'static>, Style) {
        self.flush();
        let style = self.style;
        (Line::from(self.spans), style)
    }
}

/// Styled lines for `text`, starting from `base`. SGR state carries across
/// line breaks like it does in a terminal.
pub fn to_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut style = base;
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let mut builder = LineBuilder::new(style);
        let mut chars = raw.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\x1b' => {
                    let rest = &raw[i + 1..];
                    let Some(body) = rest.strip_prefix('[') else {
                        continue;
                    };
                    let params_len = body
                        .find(|ch: char| !(ch.is_ascii_digit() || ch == ';'))
                        .unwrap_or(body.len());
                    if body[params_len..].starts_with('m') {
                        builder.set_style(apply_sgr(builder.style, base, &body[..params_len]));
                        // Skip '[', the params and 'm'.
                        for _ in 0..params_len + 2 {
                            chars.next();
                        }
                    }
                }
                '\t' => builder.tab(),
                c if c.is_control() => {}
                c => builder.push(c),
            }
        }
        let (line, carried) = builder.finish();
        style = carried;
        lines.push(line);
    }
    lines
}
