//! Pixel payloads and test patterns.

use serde::{Deserialize, Serialize};

/// One pixel colour, sent over OPC as three consecutive bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour wheel: 0 is red, 85 green, 170 blue.
    pub fn wheel(pos: u8) -> Self {
        let pos = pos as u16;
        match pos {
            0..=84 => Rgb::new((255 - pos * 3) as u8, (pos * 3) as u8, 0),
            85..=169 => {
                let p = pos - 85;
                Rgb::new(0, (255 - p * 3) as u8, (p * 3) as u8)
            }
            _ => {
                let p = pos - 170;
                Rgb::new((p * 3) as u8, 0, (255 - p * 3) as u8)
            }
        }
    }
}

/// Encode pixels to an RGB triplet frame.
pub fn encode_pixels(pixels: &[Rgb]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(pixels.len() * 3);
    for p in pixels {
        bytes.extend_from_slice(&[p.r, p.g, p.b]);
    }
    bytes
}

/// Decode an RGB triplet frame. Trailing bytes that do not form a whole
/// pixel are ignored.
pub fn decode_pixels(bytes: &[u8]) -> Vec<Rgb> {
    bytes
        .chunks_exact(3)
        .map(|c| Rgb::new(c[0], c[1], c[2]))
        .collect()
}

/// Generated animations for recording test movies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Every pixel the same colour in every frame.
    Solid { color: Rgb },
    /// A single lit pixel stepping along the strip.
    Chase { color: Rgb },
    /// Colour wheel spread over the strip, rotating one step per frame.
    #[default]
    Rainbow,
}

impl Pattern {
    /// Parse a pattern name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "solid" => Some(Pattern::Solid {
                color: Rgb::new(255, 255, 255),
            }),
            "chase" => Some(Pattern::Chase {
                color: Rgb::new(255, 0, 0),
            }),
            "rainbow" => Some(Pattern::Rainbow),
            _ => None,
        }
    }

    /// Pixel colours of frame `index`.
    pub fn pixels(&self, pixel_count: usize, index: u64) -> Vec<Rgb> {
        match *self {
            Pattern::Solid { color } => vec![color; pixel_count],
            Pattern::Chase { color } => {
                let mut pixels = vec![Rgb::BLACK; pixel_count];
                if pixel_count > 0 {
                    pixels[(index % pixel_count as u64) as usize] = color;
                }
                pixels
            }
            Pattern::Rainbow => (0..pixel_count)
                .map(|i| {
                    let offset = (i * 256 / pixel_count) as u64;
                    Rgb::wheel(((offset + index) % 256) as u8)
                })
                .collect(),
        }
    }

    /// Encoded frame `index`, `pixel_count * 3` bytes long.
    pub fn frame(&self, pixel_count: usize, index: u64) -> Vec<u8> {
        encode_pixels(&self.pixels(pixel_count, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_pixels() {
        let pixels = vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)];
        let bytes = encode_pixels(&pixels);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(decode_pixels(&bytes), pixels);
        assert_eq!(decode_pixels(&[9, 9, 9, 7]), vec![Rgb::new(9, 9, 9)]);
    }

    #[test]
    fn test_wheel_primaries() {
        assert_eq!(Rgb::wheel(0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::wheel(85), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::wheel(170), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::wheel(255), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_chase_moves_and_wraps() {
        let red = Rgb::new(255, 0, 0);
        let pattern = Pattern::Chase { color: red };

        let f0 = pattern.pixels(4, 0);
        let f5 = pattern.pixels(4, 5);
        assert_eq!(f0[0], red);
        assert_eq!(f5[1], red);
        assert_eq!(f5.iter().filter(|&&p| p == red).count(), 1);
        assert!(pattern.pixels(0, 3).is_empty());
    }

    #[test]
    fn test_frame_lengths_are_constant() {
        for pattern in [
            Pattern::Rainbow,
            Pattern::Solid {
                color: Rgb::new(1, 1, 1),
            },
            Pattern::Chase {
                color: Rgb::new(1, 1, 1),
            },
        ] {
            for index in 0..10 {
                assert_eq!(pattern.frame(17, index).len(), 51);
            }
        }
    }

    #[test]
    fn test_rainbow_rotates() {
        let a = Pattern::Rainbow.pixels(8, 0);
        let b = Pattern::Rainbow.pixels(8, 1);
        assert_ne!(a, b);
        assert_eq!(a[0], Rgb::wheel(0));
        assert_eq!(b[0], Rgb::wheel(1));
        assert_eq!(Pattern::Rainbow.pixels(8, 256), a);
    }

    #[test]
    fn test_pattern_names() {
        assert_eq!(Pattern::from_name("rainbow"), Some(Pattern::Rainbow));
        assert!(matches!(
            Pattern::from_name("chase"),
            Some(Pattern::Chase { .. })
        ));
        assert_eq!(Pattern::from_name("plasma"), None);
    }

    #[test]
    fn test_pattern_json_tag() {
        let json = serde_json::to_string(&Pattern::Rainbow).unwrap();
        assert_eq!(json, r#"{"type":"Rainbow"}"#);
        let solid: Pattern =
            serde_json::from_str(r#"{"type":"Solid","color":{"r":1,"g":2,"b":3}}"#).unwrap();
        assert_eq!(
            solid,
            Pattern::Solid {
                color: Rgb::new(1, 2, 3)
            }
        );
    }
}
