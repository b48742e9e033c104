use crate::effects::fire::FireParams;
use crate::effects::mandel::{View, ZoomPath};
use crate::effects::remap::{RotozoomParams, TunnelParams};
use crate::effects::scroll::ScrollParams;
use crate::effects::water::{Falloff, RippleShape, WaterParams};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Framebuffer size and pacing shared by every section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Frame {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) delay_ms: u64,
}

impl Default for Frame {
    fn default() -> Self {
        Self::sized(640, 480, 16)
    }
}

impl Frame {
    const fn sized(width: usize, height: usize, delay_ms: u64) -> Self {
        Self {
            width,
            height,
            delay_ms,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CloudSettings {
    pub(crate) frame: Frame,
    /// Higher values give a grainier cloud.
    pub(crate) randomness: f64,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            frame: Frame::sized(640, 480, 10),
            randomness: 1.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CycleSettings {
    pub(crate) frame: Frame,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            frame: Frame::sized(512, 512, 10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct FireSettings {
    pub(crate) frame: Frame,
    pub(crate) top_margin: usize,
    pub(crate) automaton_interval: u32,
    pub(crate) alive_below: u8,
}

impl Default for FireSettings {
    fn default() -> Self {
        let p = FireParams::default();
        Self {
            frame: Frame::sized(640, 480, 16),
            top_margin: p.top_margin,
            automaton_interval: p.automaton_interval,
            alive_below: p.alive_below,
        }
    }
}

impl FireSettings {
    pub(crate) fn params(&self) -> FireParams {
        FireParams {
            top_margin: self.top_margin,
            automaton_interval: self.automaton_interval.max(1),
            alive_below: self.alive_below,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MandelSettings {
    pub(crate) frame: Frame,
    pub(crate) center_x: f64,
    pub(crate) center_y: f64,
    pub(crate) start_zoom: f64,
    pub(crate) zoom_step: f64,
    pub(crate) center_step_x: f64,
    pub(crate) center_step_y: f64,
    pub(crate) zoom_limit: f64,
}

impl Default for MandelSettings {
    fn default() -> Self {
        let p = ZoomPath::default();
        Self {
            frame: Frame::sized(320, 200, 16),
            center_x: p.start.center.0,
            center_y: p.start.center.1,
            start_zoom: p.start.zoom,
            zoom_step: p.zoom_step,
            center_step_x: p.center_step.0,
            center_step_y: p.center_step.1,
            zoom_limit: p.zoom_limit,
        }
    }
}

impl MandelSettings {
    pub(crate) fn path(&self) -> ZoomPath {
        ZoomPath {
            start: View {
                center: (self.center_x, self.center_y),
                zoom: self.start_zoom,
            },
            zoom_step: self.zoom_step,
            center_step: (self.center_step_x, self.center_step_y),
            zoom_limit: self.zoom_limit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RotozoomSettings {
    pub(crate) frame: Frame,
    pub(crate) speed: i32,
    pub(crate) zoom_scale: f64,
    /// Side of the built-in texture.
    pub(crate) texture_size: usize,
}

impl Default for RotozoomSettings {
    fn default() -> Self {
        let p = RotozoomParams::default();
        Self {
            frame: Frame::sized(1920, 1080, 20),
            speed: p.speed,
            zoom_scale: p.zoom_scale,
            texture_size: 200,
        }
    }
}

impl RotozoomSettings {
    pub(crate) fn params(&self) -> RotozoomParams {
        RotozoomParams {
            speed: self.speed,
            zoom_scale: self.zoom_scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TunnelSettings {
    pub(crate) frame: Frame,
    pub(crate) hole_radius: f64,
    pub(crate) distortion: f64,
    pub(crate) multiplier: f64,
    pub(crate) rotation_step: f64,
    pub(crate) zoom_step: f64,
    pub(crate) texture_size: usize,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        let p = TunnelParams::default();
        Self {
            frame: Frame::sized(1024, 768, 10),
            hole_radius: p.hole_radius,
            distortion: p.distortion,
            multiplier: p.multiplier,
            rotation_step: p.rotation_step,
            zoom_step: p.zoom_step,
            texture_size: 256,
        }
    }
}

impl TunnelSettings {
    pub(crate) fn params(&self) -> TunnelParams {
        TunnelParams {
            hole_radius: self.hole_radius,
            distortion: self.distortion,
            multiplier: self.multiplier,
            rotation_step: self.rotation_step,
            zoom_step: self.zoom_step,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WaterSettings {
    pub(crate) frame: Frame,
    pub(crate) ripple_density: i32,
    pub(crate) ripple_height: f32,
    pub(crate) wobble: i32,
    /// Doubles the vertical refraction and lets the top palette slot show.
    pub(crate) light: bool,
    pub(crate) gain: i32,
    pub(crate) ring_growth: i32,
    pub(crate) start_radius: i32,
    pub(crate) rings: u32,
}

impl WaterSettings {
    fn from_params(frame: Frame, p: WaterParams) -> Self {
        Self {
            frame,
            ripple_density: p.shape.density,
            ripple_height: p.shape.ripple_height,
            wobble: p.wobble,
            light: p.light,
            gain: p.gain,
            ring_growth: p.ring_growth,
            start_radius: p.start_radius,
            rings: p.rings,
        }
    }

    pub(crate) fn params(&self, falloff: Falloff) -> WaterParams {
        WaterParams {
            shape: RippleShape {
                density: self.ripple_density,
                ripple_height: self.ripple_height,
                falloff,
            },
            wobble: self.wobble.max(1),
            light: self.light,
            gain: self.gain,
            ring_growth: self.ring_growth,
            start_radius: self.start_radius,
            rings: self.rings.max(1),
        }
    }
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self::from_params(Frame::sized(800, 600, 100), WaterParams::still())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct RainSettings {
    pub(crate) water: WaterSettings,
    pub(crate) min_drops: usize,
    pub(crate) max_drops: usize,
}

impl Default for RainSettings {
    fn default() -> Self {
        Self {
            water: WaterSettings::from_params(Frame::sized(800, 600, 100), WaterParams::rain()),
            min_drops: 15,
            max_drops: 29,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ScrollSettings {
    pub(crate) frame: Frame,
    pub(crate) stars: usize,
    pub(crate) clear_colour: u8,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        let p = ScrollParams::default();
        Self {
            frame: Frame::sized(640, 400, 100),
            stars: p.stars,
            clear_colour: p.clear_colour,
        }
    }
}

impl ScrollSettings {
    pub(crate) fn params(&self) -> ScrollParams {
        ScrollParams {
            stars: self.stars,
            clear_colour: self.clear_colour,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) cloud: CloudSettings,
    pub(crate) cycle: CycleSettings,
    pub(crate) fire: FireSettings,
    pub(crate) conway_fire: FireSettings,
    pub(crate) mandel: MandelSettings,
    pub(crate) rotozoom: RotozoomSettings,
    pub(crate) tunnel: TunnelSettings,
    pub(crate) water: WaterSettings,
    pub(crate) rain: RainSettings,
    pub(crate) scroll: ScrollSettings,
    pub(crate) view: CycleSettings,
}

/// Command-line values applied on top of a section's frame.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) width: Option<usize>,
    pub(crate) height: Option<usize>,
    pub(crate) delay_ms: Option<u64>,
}

impl Overrides {
    pub(crate) fn apply(&self, frame: Frame) -> Frame {
        Frame {
            width: self.width.unwrap_or(frame.width).max(1),
            height: self.height.unwrap_or(frame.height).max(1),
            delay_ms: self.delay_ms.unwrap_or(frame.delay_ms),
        }
    }
}

pub(crate) fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "rasterfx", "rasterfx").map(|p| p.config_dir().join("settings.json"))
}

/// An explicit path must load; the default location is best-effort.
pub(crate) fn resolve_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => {
            let s = load_settings(path)?;
            tracing::info!(path = %path.display(), "settings loaded");
            Ok(s)
        }
        None => {
            let Some(path) = default_settings_path() else {
                tracing::debug!("no config directory, using defaults");
                return Ok(Settings::default());
            };
            match load_settings(&path) {
                Ok(s) => {
                    tracing::info!(path = %path.display(), "settings loaded");
                    Ok(s)
                }
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "using default settings");
                    Ok(Settings::default())
                }
            }
        }
    }
}

pub(crate) fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.mandel.frame, Frame::sized(320, 200, 16));
        assert_eq!(s.rain.water.frame.width, 800);
        assert!(s.rain.water.light);
        assert!(!s.water.light);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "cloud": { "randomness": 0.5, "frame": { "width": 64 } } }"#).unwrap();
        assert_eq!(s.cloud.randomness, 0.5);
        assert_eq!(s.cloud.frame.width, 64);
        assert_eq!(s.cloud.frame.height, 480);
        assert_eq!(s.fire, FireSettings::default());
    }

    #[test]
    fn settings_survive_json() {
        let mut s = Settings::default();
        s.tunnel.hole_radius = 12.0;
        s.rain.max_drops = 40;
        let text = serde_json::to_string_pretty(&s).unwrap();
        let back: Settings = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn explicit_bad_path_is_an_error() {
        let dir = std::env::temp_dir().join(format!("rasterfx-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing.json");
        assert!(resolve_settings(Some(&missing)).is_err());

        let broken = dir.join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let err = resolve_settings(Some(&broken)).unwrap_err();
        assert!(format!("{err:#}").contains("parsing settings"));

        let good = dir.join("good.json");
        fs::write(&good, r#"{ "scroll": { "stars": 3 } }"#).unwrap();
        assert_eq!(resolve_settings(Some(&good)).unwrap().scroll.stars, 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let o = Overrides {
            width: Some(100),
            height: None,
            delay_ms: Some(5),
        };
        assert_eq!(o.apply(Frame::sized(10, 20, 30)), Frame::sized(100, 20, 5));
        let zero = Overrides {
            width: Some(0),
            ..Overrides::default()
        };
        assert_eq!(zero.apply(Frame::sized(10, 20, 30)).width, 1);
    }

    #[test]
    fn water_params_follow_section() {
        let s = Settings::default();
        let p = s.water.params(Falloff::Radial);
        assert_eq!(p.shape.density, 128);
        assert_eq!(p.rings, 15);
        let r = s.rain.water.params(Falloff::Sine { squash: 6 });
        assert_eq!(r.shape.density, 16);
        assert_eq!(r.ring_growth, 2);
    }
}
