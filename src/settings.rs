//! User preferences
//!
//! Persisted separately from run state, in LocalStorage on web.

use serde::{Deserialize, Serialize};

/// Audio and accessibility preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Master volume for obstacle voices (0.0 - 1.0)
    pub master_volume: f32,
    /// Speech narration volume (0.0 - 1.0)
    pub speech_volume: f32,
    /// Speech rate multiplier (0.5 - 2.0); experienced players run it fast
    pub speech_rate: f32,
    /// Narrate lane switches and pause chatter, not just score and crash
    pub verbose_narration: bool,
    /// Pause automatically when the tab loses visibility or focus
    pub auto_pause: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            speech_volume: 1.0,
            speech_rate: 1.2,
            verbose_narration: true,
            auto_pause: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "echo_dodge_settings";

    /// Clamp every field into its valid range (storage may hold anything)
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.speech_volume = self.speech_volume.clamp(0.0, 1.0);
        self.speech_rate = self.speech_rate.clamp(0.5, 2.0);
        self
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings.sanitized();
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_out_of_range_values() {
        let settings = Settings {
            master_volume: 3.0,
            speech_volume: -1.0,
            speech_rate: 9.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.speech_volume, 0.0);
        assert_eq!(settings.speech_rate, 2.0);
    }
}
