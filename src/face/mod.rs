//! Watch face rendering capability
//!
//! The core never draws. It tells a [`Renderer`] when a frame is due and
//! which mode to draw in; the renderer reads the step count through a
//! [`crate::engine::FaceView`].

pub mod console;
pub mod skin;

pub use console::ConsoleRenderer;
pub use skin::FaceSkin;

/// Alpha for time and step text in mute mode
pub const MUTE_ALPHA: u8 = 100;
/// Alpha for time and step text otherwise
pub const NORMAL_ALPHA: u8 = 255;

/// Flags a renderer needs to pick paints and typefaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderMode {
    pub ambient: bool,
    pub muted: bool,
    pub anti_alias: bool,
    pub thin_hours: bool,
    pub alpha: u8,
}

/// Device display capabilities reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayProperties {
    pub low_bit_ambient: bool,
    pub burn_in_protection: bool,
}

impl RenderMode {
    pub fn resolve(ambient: bool, muted: bool, props: DisplayProperties) -> Self {
        Self {
            ambient,
            muted,
            anti_alias: !(ambient && props.low_bit_ambient),
            thin_hours: ambient && props.burn_in_protection,
            alpha: if muted { MUTE_ALPHA } else { NORMAL_ALPHA },
        }
    }
}

impl Default for RenderMode {
    fn default() -> Self {
        Self::resolve(false, false, DisplayProperties::default())
    }
}

/// External drawing surface driven by the engine.
///
/// `request_redraw` may be called from any thread and must not block;
/// several requests before the next frame collapse into one.
pub trait Renderer: Send + Sync {
    fn request_redraw(&self);

    fn render_mode_changed(&self, mode: RenderMode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_bit_ambient_disables_anti_alias() {
        let props = DisplayProperties {
            low_bit_ambient: true,
            burn_in_protection: false,
        };
        assert!(!RenderMode::resolve(true, false, props).anti_alias);
        assert!(RenderMode::resolve(false, false, props).anti_alias);
        assert!(RenderMode::resolve(true, false, DisplayProperties::default()).anti_alias);
    }

    #[test]
    fn test_burn_in_protection_thins_hours_in_ambient() {
        let props = DisplayProperties {
            low_bit_ambient: false,
            burn_in_protection: true,
        };
        assert!(RenderMode::resolve(true, false, props).thin_hours);
        assert!(!RenderMode::resolve(false, false, props).thin_hours);
    }

    #[test]
    fn test_mute_dims_text() {
        assert_eq!(RenderMode::resolve(false, true, DisplayProperties::default()).alpha, MUTE_ALPHA);
        assert_eq!(RenderMode::default().alpha, NORMAL_ALPHA);
    }
}
