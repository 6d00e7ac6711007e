//! PNG cards for the frame.
//!
//! Cards are 1200x630 (the 1.91:1 frame aspect ratio) and drawn with an
//! embedded 8x8 bitmap font scaled per line, so rendering needs no font files.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use coin_toss_core::CoinSide;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const GLYPH: u32 = 8;
const MARGIN: u32 = 40;
/// Longest line that fits at scale 1
const MAX_CHARS: usize = ((WIDTH - 2 * MARGIN) / GLYPH) as usize;

pub const DARK: Rgba<u8> = rgb(0x1a1a1a);
pub const LIGHT: Rgba<u8> = rgb(0xf6f6f6);
pub const WHITE: Rgba<u8> = rgb(0xffffff);
pub const BLACK: Rgba<u8> = rgb(0x000000);
pub const GREY: Rgba<u8> = rgb(0x666666);
pub const CHARCOAL: Rgba<u8> = rgb(0x434343);
pub const GREEN: Rgba<u8> = rgb(0x4caf50);
pub const RED: Rgba<u8> = rgb(0xf44336);

const fn rgb(hex: u32) -> Rgba<u8> {
    Rgba([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 0xff])
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Text colour
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    Solid(Rgba<u8>),
    /// Left-to-right gradient across the line
    Gradient(Rgba<u8>, Rgba<u8>),
}

/// One line of centred text
#[derive(Clone, Debug)]
pub struct Line {
    pub text: String,
    pub fill: Fill,
    pub scale: u32,
    /// Space below the line in the vertical flow
    pub gap: u32,
    /// Fixed vertical centre; lines without one are stacked and centred
    pub center_y: Option<u32>,
}

impl Line {
    pub fn new(text: impl Into<String>, fill: Fill, scale: u32) -> Self {
        let text: String = text.into();
        let text = if text.chars().count() > MAX_CHARS {
            text.chars().take(MAX_CHARS).collect()
        } else {
            text
        };
        Self {
            text,
            fill,
            scale,
            gap: 0,
            center_y: None,
        }
    }

    pub fn gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }

    pub fn at(mut self, center_y: u32) -> Self {
        self.center_y = Some(center_y);
        self
    }

    /// Scale shrunk until the line fits between the margins
    fn fitted_scale(&self) -> u32 {
        let chars = self.text.chars().count().max(1) as u32;
        let widest = (WIDTH - 2 * MARGIN) / (chars * GLYPH);
        self.scale.min(widest).max(1)
    }
}

/// A filled rectangle with an optional centred label
#[derive(Clone, Debug)]
pub struct Panel {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: Rgba<u8>,
    pub label: Option<(String, Rgba<u8>, u32)>,
}

/// Everything drawn on one card
#[derive(Clone, Debug)]
pub struct Card {
    pub background: Rgba<u8>,
    pub lines: Vec<Line>,
    pub panels: Vec<Panel>,
}

impl Card {
    pub fn new(background: Rgba<u8>) -> Self {
        Self {
            background,
            lines: Vec::new(),
            panels: Vec::new(),
        }
    }

    pub fn line(mut self, line: Line) -> Self {
        self.lines.push(line);
        self
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.panels.push(panel);
        self
    }

    /// Draw and encode as PNG
    pub fn render(&self) -> Result<Vec<u8>, RenderError> {
        let mut img = RgbaImage::from_pixel(WIDTH, HEIGHT, self.background);

        for panel in &self.panels {
            fill_rect(
                &mut img,
                panel.x as i64,
                panel.y as i64,
                panel.width,
                panel.height,
                panel.color,
            );
            if let Some((text, color, scale)) = &panel.label {
                let height = GLYPH * scale;
                let center_x = (panel.x + panel.width / 2) as i64;
                let top = (panel.y + panel.height / 2) as i64 - (height / 2) as i64;
                draw_text(&mut img, text, center_x, top, *scale, Fill::Solid(*color));
            }
        }

        let flow: Vec<&Line> = self.lines.iter().filter(|l| l.center_y.is_none()).collect();
        let total: u32 = flow
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let gap = if i + 1 < flow.len() { l.gap } else { 0 };
                l.fitted_scale() * GLYPH + gap
            })
            .sum();
        let mut top = HEIGHT.saturating_sub(total) as i64 / 2;
        for line in flow {
            let scale = line.fitted_scale();
            draw_text(&mut img, &line.text, (WIDTH / 2) as i64, top, scale, line.fill);
            top += (scale * GLYPH + line.gap) as i64;
        }

        for line in self.lines.iter().filter(|l| l.center_y.is_some()) {
            let scale = line.fitted_scale();
            let center_y = line.center_y.unwrap_or(HEIGHT / 2);
            let top = center_y as i64 - (scale * GLYPH / 2) as i64;
            draw_text(&mut img, &line.text, (WIDTH / 2) as i64, top, scale, line.fill);
        }

        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png)?;
        Ok(png.into_inner())
    }
}

fn fill_rect(img: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x + width as i64).clamp(0, WIDTH as i64) as u32;
    let y1 = (y + height as i64).clamp(0, HEIGHT as i64) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            img.put_pixel(px, py, color);
        }
    }
}

fn lerp(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Rgba([
        mix(from[0], to[0]),
        mix(from[1], to[1]),
        mix(from[2], to[2]),
        0xff,
    ])
}

fn draw_text(img: &mut RgbaImage, text: &str, center_x: i64, top: i64, scale: u32, fill: Fill) {
    let chars = text.chars().count() as u32;
    let width = chars * GLYPH * scale;
    let left = center_x - (width / 2) as i64;

    for (i, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..GLYPH {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let x = left + ((i as u32 * GLYPH + col) * scale) as i64;
                let y = top + (row as u32 * scale) as i64;
                let color = match fill {
                    Fill::Solid(c) => c,
                    Fill::Gradient(from, to) => {
                        let t = (x - left) as f32 / width.max(1) as f32;
                        lerp(from, to, t.clamp(0.0, 1.0))
                    }
                };
                fill_rect(img, x, y, scale, scale, color);
            }
        }
    }
}

/// `data:image/png;base64,...`
pub fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

// ============ Cards ============

/// Landing image before any bet
pub fn welcome_card() -> Card {
    Card::new(DARK)
        .line(Line::new("Coin Toss Game", Fill::Solid(WHITE), 9).gap(40))
        .line(Line::new("Place your bet and flip the coin!", Fill::Solid(WHITE), 4).gap(20))
        .line(Line::new("Waiting for your bet...", Fill::Solid(WHITE), 6))
}

/// Headline over the bet amount, on the light background
pub fn headline_card(headline: &str, bet: &str) -> Card {
    Card::new(LIGHT)
        .line(Line::new(headline, Fill::Gradient(BLACK, CHARCOAL), 8).gap(16))
        .line(Line::new(format!("Bet Amount: {} ETH", bet), Fill::Solid(GREY), 4))
}

pub fn ready_card() -> Card {
    headline_card("Ready to Play", "0")
}

pub fn bet_result_card(side: CoinSide, bet: &str) -> Card {
    headline_card(side.as_str(), bet)
}

/// Full result card: side, bet and whether heads (the winning side) came up
pub fn flip_outcome_card(result: &str, bet: &str, win: bool) -> Card {
    let (verdict, color) = if win {
        ("You Won!", GREEN)
    } else {
        ("You Lost!", RED)
    };
    Card::new(DARK)
        .line(Line::new("Coin Toss Result", Fill::Solid(WHITE), 9).gap(40))
        .line(Line::new(format!("Result: {}", result), Fill::Solid(WHITE), 6).gap(20))
        .line(Line::new(format!("Bet: {} ETH", bet), Fill::Solid(WHITE), 6).gap(20))
        .line(Line::new(verdict, Fill::Solid(color), 6))
}

/// Result of a heads/tails button choice
pub fn choice_outcome_card(side: CoinSide, win: bool) -> Card {
    let verdict = if win { "YOU WIN!" } else { "YOU LOSE!" };
    Card::new(DARK)
        .line(Line::new(side.label(), Fill::Solid(WHITE), 6).at(285))
        .line(Line::new(verdict, Fill::Solid(WHITE), 6).at(385))
}

/// Static frame image served from the public directory
pub fn static_frame_card() -> Card {
    let button = |x: u32, label: &str| Panel {
        x,
        y: 400,
        width: 200,
        height: 80,
        color: GREEN,
        label: Some((label.to_string(), WHITE, 4)),
    };
    Card::new(DARK)
        .line(Line::new("COIN TOSS GAME", Fill::Solid(WHITE), 6).at(185))
        .line(Line::new("Choose Heads or Tails", Fill::Solid(WHITE), 4).at(290))
        .panel(button(400, CoinSide::Heads.label()))
        .panel(button(800, CoinSide::Tails.label()))
}
