//! Lighting effect model
//!
//! A `LightingConfiguration` is the semantic description of the light show.
//! Which of its fields actually reach the wire depends on the effect: every
//! effect exposes a fixed set of `Capabilities`, and fields outside that set
//! are replaced by protocol defaults when the packet is encoded.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Value ranges for the configurable fields (inclusive)
pub mod range {
    pub const MIN_RGB: u8 = 0x00;
    pub const MAX_RGB: u8 = 0xFF;
    pub const MIN_COLORFUL: u8 = 0x00;
    pub const MAX_COLORFUL: u8 = 0x01;
    pub const MIN_BRIGHTNESS: u8 = 0x01;
    pub const MAX_BRIGHTNESS: u8 = 0x05;
    pub const MIN_SPEED: u8 = 0x01;
    pub const MAX_SPEED: u8 = 0x05;
    pub const MIN_DIRECTION: u8 = 0x00;
    pub const MAX_DIRECTION: u8 = 0x03;
}

/// Set of lighting fields an effect actually honours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const RED: Self = Self(1 << 0);
    pub const GREEN: Self = Self(1 << 1);
    pub const BLUE: Self = Self(1 << 2);
    pub const COLORFUL: Self = Self(1 << 3);
    pub const BRIGHTNESS: Self = Self(1 << 4);
    pub const SPEED: Self = Self(1 << 5);
    pub const DIRECTION: Self = Self(1 << 6);

    /// Rainbow-cycle effects: only brightness and speed
    const CYCLE: Self = Self::BRIGHTNESS.union(Self::SPEED);
    /// Colour + brightness, no animation speed
    const STATIC: Self = Self::RED
        .union(Self::GREEN)
        .union(Self::BLUE)
        .union(Self::COLORFUL)
        .union(Self::BRIGHTNESS);
    /// Animated single-colour effects
    const ANIMATED: Self = Self::STATIC.union(Self::SPEED);
    /// Animated effects that also sweep in a direction
    const DIRECTIONAL: Self = Self::ANIMATED.union(Self::DIRECTION);

    /// Every capability bit, with display labels
    pub const LABELLED: [(Self, &'static str); 7] = [
        (Self::RED, "red"),
        (Self::GREEN, "green"),
        (Self::BLUE, "blue"),
        (Self::COLORFUL, "colorful"),
        (Self::BRIGHTNESS, "brightness"),
        (Self::SPEED, "speed"),
        (Self::DIRECTION, "direction"),
    ];

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = Self::LABELLED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(","))
    }
}

/// Lighting effect, with its wire code as discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Effect {
    #[default]
    Off = 0x00,
    Static = 0x01,
    SingleOn = 0x02,
    SingleOff = 0x03,
    Glittering = 0x04,
    Falling = 0x05,
    Colourful = 0x06,
    Breath = 0x07,
    Spectrum = 0x08,
    Outward = 0x09,
    Scrolling = 0x0A,
    Rolling = 0x0B,
    Rotating = 0x0C,
    Explode = 0x0D,
    Launch = 0x0E,
    Ripples = 0x0F,
    Flowing = 0x10,
    Pulsating = 0x11,
    Tilt = 0x12,
    Shuttle = 0x13,
}

impl Effect {
    /// All effects in wire-code order
    pub const ALL: [Effect; 20] = [
        Effect::Off,
        Effect::Static,
        Effect::SingleOn,
        Effect::SingleOff,
        Effect::Glittering,
        Effect::Falling,
        Effect::Colourful,
        Effect::Breath,
        Effect::Spectrum,
        Effect::Outward,
        Effect::Scrolling,
        Effect::Rolling,
        Effect::Rotating,
        Effect::Explode,
        Effect::Launch,
        Effect::Ripples,
        Effect::Flowing,
        Effect::Pulsating,
        Effect::Tilt,
        Effect::Shuttle,
    ];

    /// Wire code written at the style offset
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Fields this effect honours. Single source of truth for `available`.
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Effect::Off => Capabilities::NONE,
            Effect::Static => Capabilities::STATIC,
            Effect::Colourful | Effect::Spectrum => Capabilities::CYCLE,
            Effect::Scrolling
            | Effect::Rolling
            | Effect::Rotating
            | Effect::Flowing
            | Effect::Tilt => Capabilities::DIRECTIONAL,
            Effect::SingleOn
            | Effect::SingleOff
            | Effect::Glittering
            | Effect::Falling
            | Effect::Breath
            | Effect::Outward
            | Effect::Explode
            | Effect::Launch
            | Effect::Ripples
            | Effect::Pulsating
            | Effect::Shuttle => Capabilities::ANIMATED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::Off => "off",
            Effect::Static => "static",
            Effect::SingleOn => "single-on",
            Effect::SingleOff => "single-off",
            Effect::Glittering => "glittering",
            Effect::Falling => "falling",
            Effect::Colourful => "colourful",
            Effect::Breath => "breath",
            Effect::Spectrum => "spectrum",
            Effect::Outward => "outward",
            Effect::Scrolling => "scrolling",
            Effect::Rolling => "rolling",
            Effect::Rotating => "rotating",
            Effect::Explode => "explode",
            Effect::Launch => "launch",
            Effect::Ripples => "ripples",
            Effect::Flowing => "flowing",
            Effect::Pulsating => "pulsating",
            Effect::Tilt => "tilt",
            Effect::Shuttle => "shuttle",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = String;

    /// Accepts a name ("ripples", "Single_On", "singleon"), a decimal code
    /// ("15") or a hex code ("0x0F").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u8::from_str_radix(hex, 16).ok()
        } else {
            trimmed.parse::<u8>().ok()
        };
        if let Some(code) = code {
            return Self::from_code(code)
                .ok_or_else(|| format!("unknown effect code: {trimmed} (valid: 0x00-0x13)"));
        }

        let wanted = normalize(trimmed);
        // "colorful" is accepted as an alias of the British spelling
        let wanted = if wanted == "colorful" {
            "colourful".to_string()
        } else {
            wanted
        };
        Self::ALL
            .iter()
            .copied()
            .find(|e| normalize(e.name()) == wanted)
            .ok_or_else(|| format!("unknown effect: \"{trimmed}\". Run `effects` for the list"))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_' && *c != ' ')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Desired lighting state.
///
/// Every setter saturates into the documented range, so an out-of-range value
/// is never representable. `available` always reflects the current effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingConfiguration {
    effect: Effect,
    available: Capabilities,
    red: u8,
    green: u8,
    blue: u8,
    colorful: u8,
    brightness: u8,
    speed: u8,
    direction: u8,
}

impl LightingConfiguration {
    /// New configuration for `effect`; other fields start at the protocol defaults
    pub fn new(effect: Effect) -> Self {
        use crate::protocol::defaults;

        Self {
            effect,
            available: effect.capabilities(),
            red: defaults::RED,
            green: defaults::GREEN,
            blue: defaults::BLUE,
            colorful: defaults::COLORFUL,
            brightness: defaults::BRIGHTNESS,
            speed: defaults::SPEED,
            direction: defaults::DIRECTION,
        }
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn available(&self) -> Capabilities {
        self.available
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    pub fn colorful(&self) -> u8 {
        self.colorful
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn direction(&self) -> u8 {
        self.direction
    }

    /// Change the effect and recompute the capability mask
    pub fn set_effect(&mut self, effect: Effect) -> &mut Self {
        self.effect = effect;
        self.available = effect.capabilities();
        self
    }

    pub fn set_red(&mut self, red: u8) -> &mut Self {
        self.red = red.clamp(range::MIN_RGB, range::MAX_RGB);
        self
    }

    pub fn set_green(&mut self, green: u8) -> &mut Self {
        self.green = green.clamp(range::MIN_RGB, range::MAX_RGB);
        self
    }

    pub fn set_blue(&mut self, blue: u8) -> &mut Self {
        self.blue = blue.clamp(range::MIN_RGB, range::MAX_RGB);
        self
    }

    pub fn set_rgb(&mut self, red: u8, green: u8, blue: u8) -> &mut Self {
        self.set_red(red).set_green(green).set_blue(blue)
    }

    pub fn set_colorful(&mut self, colorful: u8) -> &mut Self {
        self.colorful = colorful.clamp(range::MIN_COLORFUL, range::MAX_COLORFUL);
        self
    }

    pub fn set_brightness(&mut self, brightness: u8) -> &mut Self {
        self.brightness = brightness.clamp(range::MIN_BRIGHTNESS, range::MAX_BRIGHTNESS);
        self
    }

    pub fn set_speed(&mut self, speed: u8) -> &mut Self {
        self.speed = speed.clamp(range::MIN_SPEED, range::MAX_SPEED);
        self
    }

    pub fn set_direction(&mut self, direction: u8) -> &mut Self {
        self.direction = direction.clamp(range::MIN_DIRECTION, range::MAX_DIRECTION);
        self
    }
}

impl Default for LightingConfiguration {
    fn default() -> Self {
        Self::new(Effect::default())
    }
}

/// Ripple preset sent to wake the dongle before the liveness probe.
///
/// Firmware variants disagree on the colorful byte (0x01 vs 0x00), so it
/// is a parameter rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RipplePreset {
    pub colorful: u8,
    pub brightness: u8,
    pub speed: u8,
}

impl Default for RipplePreset {
    fn default() -> Self {
        Self {
            colorful: 0x01,
            brightness: 0x05,
            speed: 0x04,
        }
    }
}

impl RipplePreset {
    pub fn to_configuration(self) -> LightingConfiguration {
        let mut config = LightingConfiguration::new(Effect::Ripples);
        config
            .set_rgb(0xFF, 0xFF, 0xFF)
            .set_colorful(self.colorful)
            .set_brightness(self.brightness)
            .set_speed(self.speed);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_codes_are_sequential() {
        for (i, effect) in Effect::ALL.iter().enumerate() {
            assert_eq!(effect.code() as usize, i);
            assert_eq!(Effect::from_code(i as u8), Some(*effect));
        }
        assert_eq!(Effect::from_code(0x14), None);
    }

    #[test]
    fn test_capability_table() {
        assert!(Effect::Off.capabilities().is_empty());

        let cycle = Capabilities::BRIGHTNESS | Capabilities::SPEED;
        assert_eq!(Effect::Colourful.capabilities(), cycle);
        assert_eq!(Effect::Spectrum.capabilities(), cycle);

        let stat = Effect::Static.capabilities();
        assert!(stat.contains(Capabilities::RED | Capabilities::COLORFUL));
        assert!(!stat.contains(Capabilities::SPEED));
        assert!(!stat.contains(Capabilities::DIRECTION));

        for effect in [
            Effect::Scrolling,
            Effect::Rolling,
            Effect::Rotating,
            Effect::Flowing,
            Effect::Tilt,
        ] {
            assert!(effect.capabilities().contains(Capabilities::DIRECTION));
        }
        assert!(!Effect::Ripples.capabilities().contains(Capabilities::DIRECTION));
        assert!(Effect::Ripples.capabilities().contains(Capabilities::SPEED));
    }

    #[test]
    fn test_set_effect_recomputes_available() {
        let mut config = LightingConfiguration::new(Effect::Tilt);
        assert!(config.available().contains(Capabilities::DIRECTION));

        config.set_effect(Effect::Off);
        assert_eq!(config.available(), Capabilities::NONE);

        config.set_effect(Effect::Spectrum);
        assert_eq!(
            config.available(),
            Capabilities::BRIGHTNESS | Capabilities::SPEED
        );
    }

    #[test]
    fn test_setters_saturate() {
        let mut config = LightingConfiguration::new(Effect::Static);

        config.set_brightness(0x00);
        assert_eq!(config.brightness(), 0x01);
        config.set_brightness(0x06);
        assert_eq!(config.brightness(), 0x05);
        config.set_brightness(0xFF);
        assert_eq!(config.brightness(), 0x05);

        config.set_speed(0x00);
        assert_eq!(config.speed(), 0x01);
        config.set_speed(0x06);
        assert_eq!(config.speed(), 0x05);

        config.set_colorful(0x02);
        assert_eq!(config.colorful(), 0x01);
        config.set_colorful(0x00);
        assert_eq!(config.colorful(), 0x00);

        config.set_direction(0x04);
        assert_eq!(config.direction(), 0x03);
        config.set_direction(0xFF);
        assert_eq!(config.direction(), 0x03);

        config.set_rgb(0x00, 0xFF, 0x80);
        assert_eq!((config.red(), config.green(), config.blue()), (0x00, 0xFF, 0x80));
    }

    #[test]
    fn test_in_range_values_kept() {
        let mut config = LightingConfiguration::new(Effect::Breath);
        for v in 1..=5 {
            config.set_brightness(v).set_speed(v);
            assert_eq!(config.brightness(), v);
            assert_eq!(config.speed(), v);
        }
        for v in 0..=3 {
            config.set_direction(v);
            assert_eq!(config.direction(), v);
        }
    }

    #[test]
    fn test_effect_from_str() {
        assert_eq!("ripples".parse::<Effect>(), Ok(Effect::Ripples));
        assert_eq!("Single_On".parse::<Effect>(), Ok(Effect::SingleOn));
        assert_eq!("colorful".parse::<Effect>(), Ok(Effect::Colourful));
        assert_eq!("15".parse::<Effect>(), Ok(Effect::Ripples));
        assert_eq!("0x13".parse::<Effect>(), Ok(Effect::Shuttle));
        assert!("0x14".parse::<Effect>().is_err());
        assert!("disco".parse::<Effect>().is_err());
    }

    #[test]
    fn test_capabilities_display() {
        assert_eq!(Capabilities::NONE.to_string(), "-");
        assert_eq!(
            Effect::Spectrum.capabilities().to_string(),
            "brightness,speed"
        );
    }
}
