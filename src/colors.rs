use crossterm::style::Color;
use rand::Rng;

/// 8-bit RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('#');
        if !(s.len() == 6 || s.len() == 8) || !s.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        let a = if s.len() == 8 { byte(6)? } else { 255 };
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Composite `top` over `self`.
    pub fn over(self, top: Rgba) -> Rgba {
        match top.a {
            255 => top,
            0 => self,
            _ => {
                let ab = f64::from(top.a) / 255.0;
                let aa = f64::from(self.a) / 255.0;
                let ao = ab + aa * (1.0 - ab);
                let mix = |t: u8, u: u8| {
                    ((f64::from(t) * ab + f64::from(u) * aa * (1.0 - ab)) / ao).round() as u8
                };
                Rgba::new(
                    mix(top.r, self.r),
                    mix(top.g, self.g),
                    mix(top.b, self.b),
                    (ao * 255.0).round() as u8,
                )
            }
        }
    }

    pub fn to_color(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
}

/// HSL color with hue in degrees and saturation/lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsla {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub a: u8,
}

impl Hsla {
    pub const fn new(h: f64, s: f64, l: f64, a: u8) -> Self {
        Self { h, s, l, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn rotate(self, degrees: f64) -> Self {
        Self { h: (self.h + degrees).rem_euclid(360.0), ..self }
    }

    fn random(rng: &mut impl Rng) -> Self {
        Self::new(
            rng.gen_range(0.0..360.0),
            rng.gen_range(60.0..=100.0),
            rng.gen_range(50.0..=70.0),
            255,
        )
    }
}

impl From<Rgba> for Hsla {
    fn from(c: Rgba) -> Self {
        let r = f64::from(c.r) / 255.0;
        let g = f64::from(c.g) / 255.0;
        let b = f64::from(c.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        if d == 0.0 {
            return Hsla::new(0.0, 0.0, l * 100.0, c.a);
        }

        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsla::new(h * 60.0, s * 100.0, l * 100.0, c.a)
    }
}

impl From<Hsla> for Rgba {
    fn from(c: Hsla) -> Self {
        let s = (c.s / 100.0).clamp(0.0, 1.0);
        let l = (c.l / 100.0).clamp(0.0, 1.0);
        let h = c.h.rem_euclid(360.0) / 360.0;
        let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;

        if s == 0.0 {
            let v = to_byte(l);
            return Rgba::new(v, v, v, c.a);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let hue = |mut t: f64| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };

        Rgba::new(
            to_byte(hue(h + 1.0 / 3.0)),
            to_byte(hue(h)),
            to_byte(hue(h - 1.0 / 3.0)),
            c.a,
        )
    }
}

/// Interpolate two HSL colors, taking the shorter way around the hue circle.
pub fn lerp(mut a: Hsla, mut b: Hsla, mut t: f64) -> Hsla {
    if a.h > b.h {
        std::mem::swap(&mut a, &mut b);
        t = 1.0 - t;
    }

    let d = b.h - a.h;
    let h = if d > 180.0 {
        let from = a.h + 360.0;
        (from + t * (b.h - from)).rem_euclid(360.0)
    } else {
        a.h + t * d
    };

    Hsla {
        h,
        s: a.s + t * (b.s - a.s),
        l: a.l + t * (b.l - a.l),
        a: (f64::from(a.a) + t * (f64::from(b.a) - f64::from(a.a))).round() as u8,
    }
}

/// Background plus four gradient stops.
///
/// Stops are bottom-left, bottom-right, top-left, top-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Rgba,
    pub stops: [Hsla; 4],
}

impl Default for Palette {
    fn default() -> Self {
        let freq = Hsla::from(Rgba::opaque(0x4f, 0xea, 0xe7));
        let freq2 = Hsla::from(Rgba::opaque(0xf3, 0x4b, 0x7d));
        Self {
            background: Rgba::opaque(0x1b, 0x1e, 0x24),
            stops: [freq, freq2, freq2, freq],
        }
    }
}

impl Palette {
    /// Build from two or four stops. Two stops cross over from bottom to top.
    pub fn from_stops(background: Rgba, stops: &[Rgba]) -> Option<Self> {
        let hsl: Vec<Hsla> = stops.iter().map(|&c| Hsla::from(c)).collect();
        let stops = match hsl.as_slice() {
            [a, b] => [*a, *b, *b, *a],
            [a, b, c, d] => [*a, *b, *c, *d],
            _ => return None,
        };
        Some(Self { background, stops })
    }

    pub fn randomized(self, rng: &mut impl Rng) -> Self {
        let a = Hsla::random(rng);
        let b = Hsla::random(rng);
        Self { stops: [a, b, b, a], ..self }
    }

    /// Gradient with the left and right stops exchanged.
    pub fn mirrored(self) -> Self {
        let [bl, br, tl, tr] = self.stops;
        Self { stops: [br, bl, tr, tl], ..self }
    }

    pub fn rotated(self, degrees: f64) -> Self {
        Self { stops: self.stops.map(|s| s.rotate(degrees)), ..self }
    }

    /// Stops used for peak markers.
    pub fn peak_stops(&self) -> [Hsla; 4] {
        let [bl, br, tl, tr] = self.stops;
        [br, bl, tr, tl]
    }
}

/// Sample a four-stop gradient. `tx` and `ty` are in [0, 1]; `None` disables that axis.
pub fn gradient(stops: &[Hsla; 4], tx: Option<f64>, ty: Option<f64>) -> Hsla {
    let (bottom, top) = match tx {
        Some(t) => (lerp(stops[0], stops[1], t), lerp(stops[2], stops[3], t)),
        None => (stops[0], stops[2]),
    };
    match ty {
        Some(t) => lerp(bottom, top, t),
        None => bottom,
    }
}
