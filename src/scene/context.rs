//! Shared scene state the fog passes read each frame

use crate::core::camera::Camera;
use crate::fog::blend::ProximityObserver;
use crate::fog::light::FogLight;
use crate::fog::volume::FogVolume;

use super::pool::{EntityId, EntityPool};

/// Everything the fog subsystem needs to see of the scene: the registered
/// volumes and lights, the candidate cameras, and the scene-wide ambient
/// density scalar the global fade writes into.
pub struct SceneContext {
    pub volumes: EntityPool<FogVolume>,
    pub lights: EntityPool<FogLight>,
    pub cameras: EntityPool<Camera>,
    /// Scene-wide exponential fog density applied outside any volume
    pub ambient_density: f32,
    registered_camera: Option<EntityId>,
    current_camera: Option<EntityId>,
    main_camera: Option<EntityId>,
    observer: Option<(EntityId, ProximityObserver)>,
    next_id: u64,
}

impl SceneContext {
    pub fn new() -> Self {
        Self {
            volumes: EntityPool::new(),
            lights: EntityPool::new(),
            cameras: EntityPool::new(),
            ambient_density: 0.01,
            registered_camera: None,
            current_camera: None,
            main_camera: None,
            observer: None,
            next_id: 1,
        }
    }

    /// Allocate a fresh entity id
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Claim the explicit render camera slot. The last caller wins.
    pub fn register_camera(&mut self, id: EntityId) {
        self.registered_camera = Some(id);
    }

    /// Release the explicit render camera slot, but only if `id` still
    /// holds it. A stale release must not clobber a newer registration.
    pub fn unregister_camera(&mut self, id: EntityId) {
        if self.registered_camera == Some(id) {
            self.registered_camera = None;
        }
    }

    /// Camera the renderer happens to be drawing with this frame
    pub fn set_current_camera(&mut self, id: Option<EntityId>) {
        self.current_camera = id;
    }

    /// Scene's designated main camera
    pub fn set_main_camera(&mut self, id: Option<EntityId>) {
        self.main_camera = id;
    }

    /// Resolve the camera the fog renders from: the explicitly registered
    /// camera first, then the current render camera, then the scene main
    /// camera. Each candidate is checked against the pool, so ids whose
    /// entity has been destroyed fall through to the next candidate.
    pub fn resolve_camera(&self) -> Option<&Camera> {
        self.registered_camera
            .and_then(|id| self.cameras.get(id))
            .or_else(|| self.current_camera.and_then(|id| self.cameras.get(id)))
            .or_else(|| self.main_camera.and_then(|id| self.cameras.get(id)))
    }

    /// Make `id` the active proximity observer. The last caller wins.
    pub fn set_observer(&mut self, id: EntityId, observer: ProximityObserver) {
        self.observer = Some((id, observer));
    }

    /// Drop the active observer, but only if `id` still holds the slot.
    pub fn clear_observer(&mut self, id: EntityId) {
        if self.observer.map(|(owner, _)| owner) == Some(id) {
            self.observer = None;
        }
    }

    pub fn observer(&self) -> Option<&ProximityObserver> {
        self.observer.as_ref().map(|(_, observer)| observer)
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_cameras() -> (SceneContext, EntityId, EntityId, EntityId) {
        let mut scene = SceneContext::new();
        let registered = scene.alloc_entity();
        let current = scene.alloc_entity();
        let main = scene.alloc_entity();
        scene.cameras.insert(registered, Camera::default());
        scene.cameras.insert(current, Camera::default());
        scene.cameras.insert(main, Camera::default());
        scene.register_camera(registered);
        scene.set_current_camera(Some(current));
        scene.set_main_camera(Some(main));
        (scene, registered, current, main)
    }

    #[test]
    fn test_resolve_prefers_registered_camera() {
        let (mut scene, registered, _, _) = context_with_cameras();
        scene.cameras.get_mut(registered).unwrap().far = 123.0;
        assert_eq!(scene.resolve_camera().unwrap().far, 123.0);
    }

    #[test]
    fn test_resolve_falls_through_dead_candidates() {
        let (mut scene, registered, current, main) = context_with_cameras();
        scene.cameras.get_mut(current).unwrap().far = 456.0;
        scene.cameras.get_mut(main).unwrap().far = 789.0;

        scene.cameras.invalidate(registered);
        assert_eq!(scene.resolve_camera().unwrap().far, 456.0);

        scene.cameras.remove(current);
        assert_eq!(scene.resolve_camera().unwrap().far, 789.0);
    }

    #[test]
    fn test_resolve_none_when_no_camera_lives() {
        let (mut scene, registered, current, main) = context_with_cameras();
        scene.cameras.invalidate(registered);
        scene.cameras.invalidate(current);
        scene.cameras.invalidate(main);
        assert!(scene.resolve_camera().is_none());
    }

    #[test]
    fn test_unregister_only_clears_own_registration() {
        let (mut scene, registered, current, _) = context_with_cameras();

        // A stale unregister from a previous owner must be ignored.
        scene.unregister_camera(current);
        assert!(scene.resolve_camera().is_some());

        scene.unregister_camera(registered);
        scene.set_current_camera(None);
        scene.set_main_camera(None);
        assert!(scene.resolve_camera().is_none());
    }

    #[test]
    fn test_observer_last_writer_wins() {
        let mut scene = SceneContext::new();
        let a = scene.alloc_entity();
        let b = scene.alloc_entity();
        scene.set_observer(a, ProximityObserver::default());
        scene.set_observer(
            b,
            ProximityObserver {
                fade_speed: 2.0,
                ..Default::default()
            },
        );
        assert_eq!(scene.observer().unwrap().fade_speed, 2.0);
    }

    #[test]
    fn test_clear_observer_conditional() {
        let mut scene = SceneContext::new();
        let a = scene.alloc_entity();
        let b = scene.alloc_entity();
        scene.set_observer(b, ProximityObserver::default());

        scene.clear_observer(a);
        assert!(scene.observer().is_some());

        scene.clear_observer(b);
        assert!(scene.observer().is_none());
    }
}
