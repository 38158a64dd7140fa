//! Color literal resolution.
//!
//! XPS color values come in three syntaxes:
//! - `#RRGGBB` / `#AARRGGBB` - sRGB, channels scaled from 0..255
//! - `sc#r,g,b` / `sc#a,r,g,b` - scRGB floats, clamped to [0, 1]
//! - `ContextColor <profile> a,c1,...,cN` - channels in the space of an ICC
//!   profile stored in the package; only CMYK profiles are converted

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::document::ArchiveReader;
use crate::utils::resolve_relative_path;

/// Maximum number of channels accepted in a `ContextColor` literal.
pub const MAX_COLOR_CHANNELS: usize = 8;

/// RGBA color with every channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Returns the color with its alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            alpha: self.alpha * opacity,
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Why a color literal could not be turned into RGBA.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// The literal uses a known syntax but its content is malformed.
    #[error("malformed color literal '{0}'")]
    Malformed(String),
    /// The literal is well formed but cannot be converted (unknown syntax,
    /// missing or unsupported ICC profile).
    #[error("unsupported color '{0}'")]
    Unsupported(String),
}

/// Parses `RRGGBB` or `AARRGGBB` hex digits (without the leading `#`).
pub fn parse_srgb(digits: &str) -> Result<Color, ColorError> {
    let malformed = || ColorError::Malformed(format!("#{digits}"));
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    let channel = |idx: usize| -> Result<f64, ColorError> {
        let pair = &digits[idx * 2..idx * 2 + 2];
        u8::from_str_radix(pair, 16)
            .map(|v| f64::from(v) / 255.0)
            .map_err(|_| malformed())
    };

    match digits.len() {
        6 => Ok(Color::rgba(channel(0)?, channel(1)?, channel(2)?, 1.0)),
        8 => Ok(Color::rgba(
            channel(1)?,
            channel(2)?,
            channel(3)?,
            channel(0)?,
        )),
        _ => Err(malformed()),
    }
}

/// Parses a scRGB channel list (without the `sc#` prefix).
///
/// Three values are `r,g,b` with opaque alpha; four are `a,r,g,b`.
pub fn parse_scrgb(values: &str) -> Result<Color, ColorError> {
    let malformed = || ColorError::Malformed(format!("sc#{values}"));
    let channels = values
        .split(',')
        .map(|token| token.trim().parse::<f64>().map(|v| v.clamp(0.0, 1.0)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    match channels.as_slice() {
        &[r, g, b] => Ok(Color::rgba(r, g, b, 1.0)),
        &[a, r, g, b] => Ok(Color::rgba(r, g, b, a)),
        _ => Err(malformed()),
    }
}

/// A loaded ICC profile able to convert its channels to sRGB.
pub struct IccProfile {
    #[cfg(feature = "icc")]
    transform: Option<lcms2::Transform<[f64; 4], [f64; 3]>>,
}

impl std::fmt::Debug for IccProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IccProfile")
            .field("cmyk", &self.is_cmyk())
            .finish()
    }
}

impl IccProfile {
    /// Loads a profile from raw ICC data.
    #[cfg(feature = "icc")]
    pub fn from_icc(data: &[u8]) -> Result<Self, ColorError> {
        use lcms2::{ColorSpaceSignature, Intent, PixelFormat, Profile, Transform};

        let profile = Profile::new_icc(data)
            .map_err(|err| ColorError::Unsupported(format!("invalid ICC profile: {err}")))?;
        if !matches!(profile.color_space(), ColorSpaceSignature::CmykData) {
            tracing::debug!("unsupported ICC color space, only CMYK profiles are converted");
            return Ok(Self { transform: None });
        }

        let srgb = Profile::new_srgb();
        let transform = Transform::new(
            &profile,
            PixelFormat::CMYK_DBL,
            &srgb,
            PixelFormat::RGB_DBL,
            Intent::Perceptual,
        )
        .map_err(|err| ColorError::Unsupported(format!("ICC transform: {err}")))?;
        Ok(Self {
            transform: Some(transform),
        })
    }

    #[cfg(not(feature = "icc"))]
    pub fn from_icc(_data: &[u8]) -> Result<Self, ColorError> {
        Err(ColorError::Unsupported(
            "ICC profiles require the `icc` feature".to_string(),
        ))
    }

    pub fn is_cmyk(&self) -> bool {
        #[cfg(feature = "icc")]
        {
            self.transform.is_some()
        }
        #[cfg(not(feature = "icc"))]
        {
            false
        }
    }

    /// Number of color channels a literal must supply for this profile.
    pub fn channels(&self) -> usize {
        if self.is_cmyk() { 4 } else { 0 }
    }

    /// Converts channel values in [0, 1] to an opaque sRGB color.
    pub fn to_srgb(&self, channels: &[f64]) -> Option<Color> {
        #[cfg(feature = "icc")]
        {
            let transform = self.transform.as_ref()?;
            let &[c, m, y, k] = channels else {
                return None;
            };
            let cmyk = [c, m, y, k].map(|v| v.clamp(0.0, 1.0) * 100.0);
            let mut rgb = [[0.0f64; 3]];
            transform.transform_pixels(&[cmyk], &mut rgb);
            let [r, g, b] = rgb[0];
            Some(Color::rgba(r, g, b, 1.0))
        }
        #[cfg(not(feature = "icc"))]
        {
            let _ = channels;
            None
        }
    }
}

/// ICC profiles loaded from one archive, keyed by part name.
#[derive(Debug, Default)]
pub struct IccProfileCache {
    profiles: RefCell<FxHashMap<String, Rc<IccProfile>>>,
}

impl IccProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached profile for `uri`, loading it from `archive` on
    /// first use. Failed loads are not cached.
    pub fn get_or_load(
        &self,
        archive: &dyn ArchiveReader,
        uri: &str,
    ) -> Result<Rc<IccProfile>, ColorError> {
        if let Some(profile) = self.profiles.borrow().get(uri) {
            return Ok(Rc::clone(profile));
        }

        let data = archive.read_entry(uri).map_err(|_| {
            tracing::debug!(uri, "ICC profile source not found in archive");
            ColorError::Unsupported(format!("ICC profile {uri} not found"))
        })?;
        let profile = Rc::new(IccProfile::from_icc(&data).inspect_err(|err| {
            tracing::debug!(uri, %err, "failed to load ICC profile");
        })?);
        self.profiles
            .borrow_mut()
            .insert(uri.to_string(), Rc::clone(&profile));
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.profiles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.borrow().is_empty()
    }
}

/// Resolves color literals, with optional access to the package's ICC
/// profiles for `ContextColor` values.
#[derive(Clone, Copy)]
pub struct ColorResolver<'a> {
    profiles: Option<ProfileLookup<'a>>,
}

#[derive(Clone, Copy)]
struct ProfileLookup<'a> {
    archive: &'a dyn ArchiveReader,
    cache: &'a IccProfileCache,
    page_source: &'a str,
}

impl<'a> ColorResolver<'a> {
    /// A resolver that can only handle sRGB and scRGB literals.
    pub fn without_profiles() -> Self {
        Self { profiles: None }
    }

    /// A resolver that loads ICC profiles from `archive`, resolving profile
    /// URIs relative to `page_source`.
    pub fn new(
        archive: &'a dyn ArchiveReader,
        cache: &'a IccProfileCache,
        page_source: &'a str,
    ) -> Self {
        Self {
            profiles: Some(ProfileLookup {
                archive,
                cache,
                page_source,
            }),
        }
    }

    /// Resolves a color literal to RGBA.
    pub fn resolve(&self, literal: &str) -> Result<Color, ColorError> {
        let literal = literal.trim();
        if let Some(digits) = literal.strip_prefix('#') {
            return parse_srgb(digits);
        }
        if let Some(values) = literal.strip_prefix("sc#") {
            return parse_scrgb(values);
        }
        if let Some(values) = literal.strip_prefix("sc") {
            return parse_scrgb(values);
        }
        if let Some(rest) = literal.strip_prefix("ContextColor ") {
            return self.resolve_context_color(rest);
        }

        tracing::debug!(literal, "unsupported color");
        Err(ColorError::Unsupported(literal.to_string()))
    }

    fn resolve_context_color(&self, spec: &str) -> Result<Color, ColorError> {
        let malformed = || ColorError::Malformed(format!("ContextColor {spec}"));
        let (profile_uri, values) = spec.trim().split_once(' ').ok_or_else(malformed)?;
        let values = values
            .split(',')
            .map(|token| token.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        let (&alpha, channels) = values.split_first().ok_or_else(malformed)?;
        if channels.is_empty() {
            return Err(malformed());
        }
        let channels = &channels[..channels.len().min(MAX_COLOR_CHANNELS)];

        let Some(lookup) = self.profiles else {
            tracing::debug!(profile_uri, "no archive available for ICC color lookup");
            return Err(ColorError::Unsupported(format!("ContextColor {spec}")));
        };
        let uri = resolve_relative_path(lookup.page_source, profile_uri);
        let profile = lookup.cache.get_or_load(lookup.archive, &uri)?;
        if !profile.is_cmyk() {
            return Err(ColorError::Unsupported(format!(
                "ContextColor {spec}: only CMYK profiles are supported"
            )));
        }
        if profile.channels() != channels.len() {
            tracing::debug!(
                expected = profile.channels(),
                found = channels.len(),
                "ICC channel count mismatch"
            );
            return Err(ColorError::Unsupported(format!("ContextColor {spec}")));
        }

        let color = profile
            .to_srgb(channels)
            .ok_or_else(|| ColorError::Unsupported(format!("ContextColor {spec}")))?;
        Ok(Color {
            alpha: alpha.clamp(0.0, 1.0),
            ..color
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_rejects_signed_pairs() {
        assert!(matches!(parse_srgb("+F0000"), Err(ColorError::Malformed(_))));
        assert!(matches!(parse_srgb("FF-100FF"), Err(ColorError::Malformed(_))));
    }

    #[test]
    fn test_srgb_with_alpha() {
        let color = parse_srgb("80FF0000").unwrap();
        assert_eq!(color.alpha, 128.0 / 255.0);
        assert_eq!((color.red, color.green, color.blue), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_srgb_rejects_odd_lengths() {
        assert!(matches!(parse_srgb("FFF"), Err(ColorError::Malformed(_))));
        assert!(matches!(parse_srgb("GG0000"), Err(ColorError::Malformed(_))));
    }

    #[test]
    fn test_scrgb_clamps() {
        let color = parse_scrgb("1.5,-0.2,0.5").unwrap();
        assert_eq!(color, Color::rgba(1.0, 0.0, 0.5, 1.0));
    }
}
