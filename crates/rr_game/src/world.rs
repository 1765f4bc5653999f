//! Object arena.
//!
//! Every placed thing in a room (player, doors, platforms, buttons, trigger
//! volumes, save-state waypoint markers) lives in one `World` and is addressed
//! by a generational `ObjectId`. Links between objects are resolved to ids
//! once during setup; a stale id (for example a destroyed waypoint marker)
//! simply stops resolving instead of aliasing a newer object.

use glam::{Quat, Vec3};

use crate::contact::Aabb;
use crate::door::Door;
use crate::platform::MovingPlatform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Visual marker left at a saved position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointMarker {
    pub slot: usize,
    pub color: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct GameObject {
    pub name: String,
    pub transform: Transform,
    pub half_extents: Vec3,
    pub door: Option<Door>,
    pub platform: Option<MovingPlatform>,
    pub marker: Option<WaypointMarker>,
}

impl GameObject {
    pub fn new(name: impl Into<String>, transform: Transform, half_extents: Vec3) -> Self {
        Self {
            name: name.into(),
            transform,
            half_extents,
            door: None,
            platform: None,
            marker: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.transform.position, self.half_extents)
    }
}

struct Slot {
    generation: u32,
    object: Option<GameObject>,
}

#[derive(Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, object: GameObject) -> ObjectId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    /// Remove an object. Returns false if the id was already stale.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.object.is_some() => {
                slot.object = None;
                self.free.push(id.index);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|object| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    object,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.object.is_some()).count()
    }

    pub fn transform(&self, id: ObjectId) -> Option<&Transform> {
        self.get(id).map(|object| &object.transform)
    }

    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut Transform> {
        self.get_mut(id).map(|object| &mut object.transform)
    }

    pub fn door(&self, id: ObjectId) -> Option<&Door> {
        self.get(id).and_then(|object| object.door.as_ref())
    }

    pub fn platform(&self, id: ObjectId) -> Option<&MovingPlatform> {
        self.get(id).and_then(|object| object.platform.as_ref())
    }

    pub fn platform_mut(&mut self, id: ObjectId) -> Option<&mut MovingPlatform> {
        self.get_mut(id).and_then(|object| object.platform.as_mut())
    }

    /// Borrow an object's door together with its transform, which the door
    /// animates.
    pub fn door_parts_mut(&mut self, id: ObjectId) -> Option<(&mut Door, &mut Transform)> {
        let object = self.get_mut(id)?;
        let door = object.door.as_mut()?;
        Some((door, &mut object.transform))
    }

    pub fn platform_parts_mut(
        &mut self,
        id: ObjectId,
    ) -> Option<(&mut MovingPlatform, &mut Transform)> {
        let object = self.get_mut(id)?;
        let platform = object.platform.as_mut()?;
        Some((platform, &mut object.transform))
    }

    /// Snap a platform to one of its waypoints and stop it, carrying its
    /// riders by the same offset. `None` if `id` has no platform, `Some(false)`
    /// if the waypoint is out of range.
    pub fn snap_platform(&mut self, id: ObjectId, waypoint: usize) -> Option<bool> {
        let (platform, transform) = self.platform_parts_mut(id)?;
        let before = transform.position;
        if !platform.snap_to_waypoint(waypoint, transform) {
            return Some(false);
        }
        let delta = transform.position - before;
        let riders = platform.riders().to_vec();
        for rider in riders {
            if let Some(transform) = self.transform_mut(rider) {
                transform.position += delta;
            }
        }
        Some(true)
    }

    /// Advance every door and moving platform by one fixed step. Riders are
    /// carried by the distance their platform travelled this step.
    pub fn tick(&mut self, dt: f32) {
        let mut carried = Vec::new();
        for slot in &mut self.slots {
            let Some(object) = slot.object.as_mut() else {
                continue;
            };
            if let Some(door) = object.door.as_mut() {
                door.tick(dt, &mut object.transform);
            }
            if let Some(platform) = object.platform.as_mut() {
                let before = object.transform.position;
                platform.tick(dt, &mut object.transform);
                let delta = object.transform.position - before;
                if delta != Vec3::ZERO {
                    carried.extend(platform.riders().iter().map(|&rider| (rider, delta)));
                }
            }
        }
        for (rider, delta) in carried {
            if let Some(transform) = self.transform_mut(rider) {
                transform.position += delta;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crate_at(name: &str, x: f32) -> GameObject {
        GameObject::new(
            name,
            Transform::from_position(Vec3::new(x, 0.0, 0.0)),
            Vec3::splat(0.5),
        )
    }

    #[test]
    fn spawn_and_lookup_by_name() {
        let mut world = World::new();
        let a = world.spawn(crate_at("a", 1.0));
        let b = world.spawn(crate_at("b", 2.0));
        assert_eq!(world.find_by_name("a"), Some(a));
        assert_eq!(world.find_by_name("b"), Some(b));
        assert_eq!(world.find_by_name("c"), None);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn despawned_id_goes_stale_after_reuse() {
        let mut world = World::new();
        let old = world.spawn(crate_at("marker", 0.0));
        assert!(world.despawn(old));
        assert!(!world.despawn(old));

        let new = world.spawn(crate_at("marker2", 5.0));
        assert_ne!(old, new);
        assert!(world.get(old).is_none());
        assert_eq!(world.get(new).map(|o| o.name.as_str()), Some("marker2"));
    }

    #[test]
    fn default_transform_is_identity() {
        let transform = Transform::default();
        assert_eq!(transform.rotation, Quat::IDENTITY);
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn component_accessors_return_none_without_component() {
        let mut world = World::new();
        let id = world.spawn(crate_at("plain", 0.0));
        assert!(world.door(id).is_none());
        assert!(world.platform(id).is_none());
        assert!(world.door_parts_mut(id).is_none());
    }
}
