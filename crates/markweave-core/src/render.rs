//! Terminal lowering of fragment trees into `ratatui` text.
//!
//! This is one concrete host for [`Fragment`]s: views and scroll containers become line breaks,
//! row views keep their children on one line, and text-run styles are mapped onto terminal
//! colors and modifiers. Layout-only declarations (padding, borders, sizes) are ignored.
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style as TuiStyle;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use std::str::FromStr;
use unicode_width::UnicodeWidthStr;

use crate::fragment::AccessibilityRole;
use crate::fragment::Fragment;
use crate::style::Style;
use crate::style::StyleValue;

#[derive(Clone, Debug)]
pub struct RenderedText {
    /// Fully materialized lines ready for drawing via `Paragraph`/custom rendering.
    pub text: Text<'static>,
    /// Maximum display width (in terminal cell units) across all lines.
    pub content_width: u32,
    pub content_height: u32,
}

impl RenderedText {
    pub fn into_text(self) -> Text<'static> {
        self.text
    }

    pub fn plain_lines(&self) -> Vec<String> {
        self.text
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }
}

/// Lowers `fragment` into owned terminal lines.
pub fn lower(fragment: &Fragment) -> RenderedText {
    let mut l = Lowering::default();
    l.node(fragment, TuiStyle::default(), false);
    l.break_line();

    while l.lines.last().is_some_and(|line| line.spans.is_empty()) {
        l.lines.pop();
    }

    let content_width = l
        .lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| UnicodeWidthStr::width(s.content.as_ref()) as u32)
                .sum::<u32>()
        })
        .max()
        .unwrap_or(0);
    let content_height = l.lines.len() as u32;

    RenderedText {
        text: Text::from(l.lines),
        content_width,
        content_height,
    }
}

#[derive(Default)]
struct Lowering {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl Lowering {
    fn break_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn force_break(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn blank_line(&mut self) {
        self.break_line();
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn push_str(&mut self, s: &str, style: TuiStyle) {
        for (i, part) in s.split('\n').enumerate() {
            if i > 0 {
                self.force_break();
            }
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn node(&mut self, fragment: &Fragment, inherited: TuiStyle, in_row: bool) {
        match fragment {
            Fragment::Empty => {}
            Fragment::Raw(s) => self.push_str(s, inherited),
            Fragment::Text(run) => {
                let style = inherited.patch(tui_style(&run.style));
                for child in &run.children {
                    self.node(child, style, in_row);
                }
            }
            Fragment::View(view) => {
                self.container(&view.children, &view.style, inherited, in_row);
            }
            Fragment::Scroll(scroll) => {
                self.container(&scroll.children, &scroll.style, inherited, in_row);
            }
            Fragment::Image(image) => {
                if !in_row {
                    self.break_line();
                }
                let label = image.label.as_deref().unwrap_or(image.source.as_str());
                self.push_str(
                    &format!("[image: {label}]"),
                    inherited.add_modifier(Modifier::DIM),
                );
                if !in_row {
                    self.break_line();
                }
            }
            Fragment::Pressable(pressable) => {
                if pressable.role == Some(AccessibilityRole::Checkbox) {
                    let mark = if pressable.checked == Some(true) {
                        "[x] "
                    } else {
                        "[ ] "
                    };
                    self.push_str(mark, inherited);
                    return;
                }
                for child in &pressable.children {
                    self.node(child, inherited, in_row);
                }
            }
        }
    }

    fn container(&mut self, children: &[Fragment], style: &Style, inherited: TuiStyle, in_row: bool) {
        if in_row {
            for child in children {
                self.node(child, inherited, true);
            }
            return;
        }

        self.break_line();
        if style.text("flexDirection") == Some("row") {
            for (i, child) in children.iter().enumerate() {
                if i > 0 && matches!(child, Fragment::View(_)) {
                    self.current.push(Span::raw(" │ "));
                }
                self.node(child, inherited, true);
            }
        } else {
            for child in children {
                self.node(child, inherited, false);
                self.break_line();
            }
        }
        self.break_line();
        if has_block_margin(Some(style)) {
            self.blank_line();
        }
    }
}

fn has_block_margin(style: Option<&Style>) -> bool {
    style.is_some_and(|s| {
        ["marginBottom", "marginVertical"]
            .iter()
            .any(|k| s.number(k).is_some_and(|n| n > 0.0))
    })
}

/// Maps text-level declarations of `style` onto a terminal style.
pub fn tui_style(style: &Style) -> TuiStyle {
    let mut out = TuiStyle::default();
    if let Some(fg) = style.color().and_then(parse_color) {
        out = out.fg(fg);
    }
    if let Some(bg) = style.text("backgroundColor").and_then(parse_color) {
        out = out.bg(bg);
    }
    if is_bold(style.get("fontWeight")) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.text("fontStyle") == Some("italic") {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if let Some(decoration) = style.text("textDecorationLine") {
        if decoration.contains("underline") {
            out = out.add_modifier(Modifier::UNDERLINED);
        }
        if decoration.contains("line-through") {
            out = out.add_modifier(Modifier::CROSSED_OUT);
        }
    }
    if style.number("opacity").is_some_and(|o| o < 1.0) {
        out = out.add_modifier(Modifier::DIM);
    }
    out
}

fn is_bold(weight: Option<&StyleValue>) -> bool {
    match weight {
        Some(StyleValue::Text(w)) => {
            w == "bold" || w.parse::<u16>().is_ok_and(|n| n >= 600)
        }
        Some(StyleValue::Number(n)) => *n >= 600.0,
        _ => false,
    }
}

/// Parses `#rgb`, `#rrggbb` and named colors.
pub fn parse_color(input: &str) -> Option<Color> {
    let Some(hex) = input.strip_prefix('#') else {
        return Color::from_str(input).ok();
    };
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(Color::Rgb(rgb[0], rgb[1], rgb[2]))
        }
        6 => Some(Color::Rgb(
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}
