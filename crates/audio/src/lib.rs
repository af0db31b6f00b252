//! Audio system using Kira for spatial sound.

use anyhow::Result;
use engine_core::Vec3;
use kira::{
    manager::{backend::DefaultBackend, AudioManager, AudioManagerSettings},
    sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings},
    spatial::{
        emitter::{EmitterHandle, EmitterSettings},
        listener::{ListenerHandle, ListenerSettings},
        scene::{SpatialSceneHandle, SpatialSceneSettings},
    },
    tween::Tween,
};
use std::collections::HashMap;
use std::path::Path;

fn to_mint(v: Vec3) -> mint::Vector3<f32> {
    mint::Vector3 {
        x: v.x,
        y: v.y,
        z: v.z,
    }
}

/// Handle to a looping sound started with [`AudioSystem::start_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopId(u32);

struct ActiveLoop {
    sound: StaticSoundHandle,
    emitter: EmitterHandle,
}

/// Main audio system: loaded clips, one listener, spatial loops.
pub struct AudioSystem {
    manager: AudioManager,
    spatial_scene: SpatialSceneHandle,
    listener: ListenerHandle,
    sounds: HashMap<String, StaticSoundData>,
    loops: HashMap<LoopId, ActiveLoop>,
    next_loop: u32,
}

impl AudioSystem {
    pub fn new() -> Result<Self> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())?;
        let mut spatial_scene = manager.add_spatial_scene(SpatialSceneSettings::default())?;
        let listener = spatial_scene.add_listener(
            to_mint(Vec3::ZERO),
            mint::Quaternion {
                v: mint::Vector3 {
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                },
                s: 1.0,
            },
            ListenerSettings::default(),
        )?;

        Ok(Self {
            manager,
            spatial_scene,
            listener,
            sounds: HashMap::new(),
            loops: HashMap::new(),
            next_loop: 0,
        })
    }

    /// Load a clip under `name`. A missing or unreadable file is logged and
    /// leaves the clip unset, so playing it later is silent.
    pub fn load_sound(&mut self, name: &str, path: &Path) -> bool {
        match StaticSoundData::from_file(path) {
            Ok(data) => {
                log::info!("Loaded sound '{}' from {}", name, path.display());
                self.sounds.insert(name.to_string(), data);
                true
            }
            Err(err) => {
                log::warn!("Could not load sound '{}' from {}: {}", name, path.display(), err);
                false
            }
        }
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains_key(name)
    }

    /// Start looping `name` from an emitter at `position`. Returns `None`
    /// if the clip was never loaded.
    pub fn start_loop(&mut self, name: &str, position: Vec3, volume: f64) -> Result<Option<LoopId>> {
        let Some(data) = self.sounds.get(name).cloned() else {
            return Ok(None);
        };
        let emitter = self
            .spatial_scene
            .add_emitter(to_mint(position), EmitterSettings::default())?;
        let settings = StaticSoundSettings::new()
            .output_destination(&emitter)
            .loop_region(..)
            .volume(volume);
        let sound = self.manager.play(data.with_settings(settings))?;

        let id = LoopId(self.next_loop);
        self.next_loop += 1;
        self.loops.insert(id, ActiveLoop { sound, emitter });
        log::debug!("Started loop '{}' as {:?}", name, id);
        Ok(Some(id))
    }

    /// Stop a loop. Unknown ids are ignored.
    pub fn stop_loop(&mut self, id: LoopId) {
        if let Some(mut active) = self.loops.remove(&id) {
            active.sound.stop(Tween::default());
            log::debug!("Stopped loop {:?}", id);
        }
    }

    pub fn move_loop(&mut self, id: LoopId, position: Vec3) {
        if let Some(active) = self.loops.get_mut(&id) {
            active.emitter.set_position(to_mint(position), Tween::default());
        }
    }

    /// Update listener position and orientation (call each frame).
    pub fn update_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        let right = forward.cross(up).normalize_or_zero();
        if right == Vec3::ZERO {
            return;
        }
        let corrected_up = right.cross(forward).normalize();
        let rotation = glam::Mat3::from_cols(right, corrected_up, -forward.normalize());
        let quat = glam::Quat::from_mat3(&rotation);

        self.listener.set_position(to_mint(position), Tween::default());
        self.listener.set_orientation(
            mint::Quaternion {
                v: mint::Vector3 {
                    x: quat.x,
                    y: quat.y,
                    z: quat.z,
                },
                s: quat.w,
            },
            Tween::default(),
        );
    }
}

/// What a [`LoopFollower`] wants done this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCue {
    Start,
    Stop,
}

/// Edge detector that keeps a looping sound in step with an on/off state,
/// e.g. the warning beacon beeping while the machine runs.
#[derive(Debug, Default)]
pub struct LoopFollower {
    active: Option<LoopId>,
    wanted: bool,
}

impl LoopFollower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the current state; returns a cue only when it changed.
    pub fn observe(&mut self, on: bool) -> Option<LoopCue> {
        if on == self.wanted {
            return None;
        }
        self.wanted = on;
        Some(if on { LoopCue::Start } else { LoopCue::Stop })
    }

    pub fn is_on(&self) -> bool {
        self.wanted
    }

    /// Drive `audio` from `on`. With no audio device this only tracks state.
    pub fn follow(
        &mut self,
        on: bool,
        audio: Option<&mut AudioSystem>,
        sound: &str,
        position: Vec3,
        volume: f64,
    ) {
        let Some(cue) = self.observe(on) else {
            return;
        };
        let Some(audio) = audio else {
            return;
        };
        match cue {
            LoopCue::Start => match audio.start_loop(sound, position, volume) {
                Ok(id) => self.active = id,
                Err(err) => log::error!("Failed to start '{}': {}", sound, err),
            },
            LoopCue::Stop => {
                if let Some(id) = self.active.take() {
                    audio.stop_loop(id);
                }
            }
        }
    }
}

// Re-export for convenience
pub use kira;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follower_cues_only_on_edges() {
        let mut follower = LoopFollower::new();
        assert_eq!(follower.observe(false), None);
        assert_eq!(follower.observe(true), Some(LoopCue::Start));
        assert_eq!(follower.observe(true), None);
        assert_eq!(follower.observe(false), Some(LoopCue::Stop));
        assert_eq!(follower.observe(false), None);
    }

    #[test]
    fn follower_without_device_tracks_state() {
        let mut follower = LoopFollower::new();
        follower.follow(true, None, "beep", Vec3::ZERO, 1.0);
        assert!(follower.is_on());
        follower.follow(false, None, "beep", Vec3::ZERO, 1.0);
        assert!(!follower.is_on());
    }
}
