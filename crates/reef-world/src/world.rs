//! The bounded grid: occupancy, backgrounds and the set of live entities.

use crate::entity::Entity;
use crate::images::Background;
use crate::scheduler::EventScheduler;
use reef_core::{EntityId, EntityKind, Error, ImageHandle, Point, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// How far `find_open_around` looks in each direction
const SPAWN_REACH: i32 = 1;

/// Largest grid, in cells, a world may be built with
pub const MAX_CELLS: usize = 1 << 24;

/// A bounded 2D grid holding at most one entity per cell.
///
/// Entities are stored by handle in insertion order, which makes every scan
/// over them deterministic.
#[derive(Debug, Clone)]
pub struct WorldModel {
    num_rows: i32,
    num_cols: i32,
    background: Vec<Background>,
    occupancy: Vec<Option<EntityId>>,
    entities: BTreeMap<EntityId, Entity>,
    next_handle: u64,
}

impl WorldModel {
    /// Build an empty grid. Negative dimensions are treated as zero.
    ///
    /// Fails with `Error::Validation` when the grid exceeds `MAX_CELLS`.
    pub fn new(num_rows: i32, num_cols: i32, default_background: Background) -> Result<Self> {
        let num_rows = num_rows.max(0);
        let num_cols = num_cols.max(0);
        let size = (num_rows as usize)
            .checked_mul(num_cols as usize)
            .filter(|&cells| cells <= MAX_CELLS)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "grid of {}x{} exceeds {} cells",
                    num_rows, num_cols, MAX_CELLS
                ))
            })?;

        Ok(Self {
            num_rows,
            num_cols,
            background: vec![default_background; size],
            occupancy: vec![None; size],
            entities: BTreeMap::new(),
            next_handle: 0,
        })
    }

    pub fn num_rows(&self) -> i32 {
        self.num_rows
    }

    pub fn num_cols(&self) -> i32 {
        self.num_cols
    }

    pub fn within_bounds(&self, pos: Point) -> bool {
        pos.y >= 0 && pos.y < self.num_rows && pos.x >= 0 && pos.x < self.num_cols
    }

    pub fn is_occupied(&self, pos: Point) -> bool {
        self.occupant_at(pos).is_some()
    }

    /// Handle of whatever sits at `pos`; `None` when empty or out of bounds
    pub fn occupant_at(&self, pos: Point) -> Option<EntityId> {
        if self.within_bounds(pos) {
            self.occupancy[self.pos_to_index(pos)]
        } else {
            None
        }
    }

    pub fn get_occupant(&self, pos: Point) -> Option<(EntityId, &Entity)> {
        let id = self.occupant_at(pos)?;
        self.entities.get(&id).map(|entity| (id, entity))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Live entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind() == kind).count()
    }

    pub fn set_background(&mut self, pos: Point, background: Background) {
        if self.within_bounds(pos) {
            let index = self.pos_to_index(pos);
            self.background[index] = background;
        }
    }

    pub fn background(&self, pos: Point) -> Option<&Background> {
        if self.within_bounds(pos) {
            Some(&self.background[self.pos_to_index(pos)])
        } else {
            None
        }
    }

    pub fn get_background_image(&self, pos: Point) -> Option<&ImageHandle> {
        self.background(pos).map(Background::current_image)
    }

    /// First free in-bounds cell of the 3x3 block around `center`, row-major.
    pub fn find_open_around(&self, center: Point) -> Option<Point> {
        for dy in -SPAWN_REACH..=SPAWN_REACH {
            for dx in -SPAWN_REACH..=SPAWN_REACH {
                let candidate = center.add(dx, dy);
                if self.within_bounds(candidate) && !self.is_occupied(candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Closest live entity of `kind`; ties go to the earliest inserted.
    pub fn find_nearest(&self, pos: Point, kind: EntityKind) -> Option<EntityId> {
        let mut nearest: Option<(EntityId, i64)> = None;
        for (id, entity) in self.entities() {
            if entity.kind() != kind {
                continue;
            }
            let distance = entity.position().distance_squared(&pos);
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((id, distance)),
            }
        }
        nearest.map(|(id, _)| id)
    }

    /// Place an entity on a free in-bounds cell.
    ///
    /// Returns `None` and leaves the world untouched if the cell is taken or
    /// outside the grid.
    pub fn add_entity(&mut self, entity: Entity) -> Option<EntityId> {
        let pos = entity.position();
        if !self.within_bounds(pos) {
            warn!(id = entity.id(), %pos, "Ignoring entity placed out of bounds");
            return None;
        }
        if self.is_occupied(pos) {
            warn!(id = entity.id(), %pos, "Ignoring entity placed on an occupied cell");
            return None;
        }
        Some(self.insert(entity))
    }

    /// Like `add_entity`, but a taken or out-of-bounds cell is an error.
    pub fn try_add_entity(&mut self, entity: Entity) -> Result<EntityId> {
        let position = entity.position();
        if !self.within_bounds(position) {
            return Err(Error::OutOfBounds { position });
        }
        if self.is_occupied(position) {
            return Err(Error::OccupiedCell { position });
        }
        Ok(self.insert(entity))
    }

    fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_handle);
        self.next_handle += 1;
        let index = self.pos_to_index(entity.position());
        self.occupancy[index] = Some(id);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity and cancel everything it still has scheduled.
    pub fn remove_entity(
        &mut self,
        id: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Option<Entity> {
        scheduler.unschedule_all_events(id);
        let entity = self.entities.remove(&id)?;
        let index = self.pos_to_index(entity.position());
        if self.occupancy[index] == Some(id) {
            self.occupancy[index] = None;
        }
        debug!(%id, entity_id = entity.id(), kind = %entity.kind(), pos = %entity.position(), "Entity removed");
        Some(entity)
    }

    /// Move an entity to a free cell.
    ///
    /// No-op when `pos` is out of bounds, is the current position, or holds
    /// another entity. Does not touch the scheduler: evictions are the
    /// caller's business.
    pub fn move_entity(&mut self, id: EntityId, pos: Point) -> bool {
        let Some(old_pos) = self.entities.get(&id).map(Entity::position) else {
            return false;
        };
        if !self.within_bounds(pos) || pos == old_pos {
            return false;
        }
        if matches!(self.occupant_at(pos), Some(other) if other != id) {
            return false;
        }

        let old_index = self.pos_to_index(old_pos);
        let new_index = self.pos_to_index(pos);
        self.occupancy[old_index] = None;
        self.occupancy[new_index] = Some(id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_position(pos);
        }
        trace!(%id, from = %old_pos, to = %pos, "Entity moved");
        true
    }

    /// One octopus step from `pos` toward `dest`: horizontal first, then
    /// vertical, staying put when both are blocked by any occupant.
    pub fn next_position_octo(&self, pos: Point, dest: Point) -> Point {
        self.next_position(pos, dest, |world, cell| world.is_occupied(cell))
    }

    /// Like the octopus step, but fish do not block a crab.
    pub fn next_position_crab(&self, pos: Point, dest: Point) -> Point {
        self.next_position(pos, dest, |world, cell| {
            world
                .get_occupant(cell)
                .is_some_and(|(_, occupant)| occupant.kind() != EntityKind::Fish)
        })
    }

    fn next_position(
        &self,
        pos: Point,
        dest: Point,
        blocked: impl Fn(&Self, Point) -> bool,
    ) -> Point {
        let horiz = (dest.x - pos.x).signum();
        let next = pos.add(horiz, 0);
        if horiz != 0 && !blocked(self, next) {
            return next;
        }

        let vert = (dest.y - pos.y).signum();
        let next = pos.add(0, vert);
        if vert != 0 && !blocked(self, next) {
            return next;
        }

        pos
    }

    /// Full octopus heading home. `true` once it is next to `target`.
    pub fn move_to_full(
        &mut self,
        octo: EntityId,
        target: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Result<bool> {
        let (pos, target_pos) = self.positions_of(octo, target)?;
        if pos.adjacent(&target_pos) {
            return Ok(true);
        }
        let next = self.next_position_octo(pos, target_pos);
        self.step(octo, next, scheduler);
        Ok(false)
    }

    /// Hungry octopus hunting. On arrival it eats `target`.
    pub fn move_to_not_full(
        &mut self,
        octo: EntityId,
        target: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Result<bool> {
        let (pos, target_pos) = self.positions_of(octo, target)?;
        if pos.adjacent(&target_pos) {
            if let Some(entity) = self.entities.get_mut(&octo) {
                entity.add_resource();
            }
            self.remove_entity(target, scheduler);
            return Ok(true);
        }
        let next = self.next_position_octo(pos, target_pos);
        self.step(octo, next, scheduler);
        Ok(false)
    }

    /// Crab hunting. On arrival it destroys `target`.
    pub fn move_to_crab(
        &mut self,
        crab: EntityId,
        target: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Result<bool> {
        let (pos, target_pos) = self.positions_of(crab, target)?;
        if pos.adjacent(&target_pos) {
            self.remove_entity(target, scheduler);
            return Ok(true);
        }
        let next = self.next_position_crab(pos, target_pos);
        self.step(crab, next, scheduler);
        Ok(false)
    }

    fn positions_of(&self, mover: EntityId, target: EntityId) -> Result<(Point, Point)> {
        let pos = self
            .entity(mover)
            .ok_or(Error::UnknownEntity(mover))?
            .position();
        let target_pos = self
            .entity(target)
            .ok_or(Error::UnknownEntity(target))?
            .position();
        Ok((pos, target_pos))
    }

    /// Move `mover` onto `next`, evicting whatever was there.
    fn step(&mut self, mover: EntityId, next: Point, scheduler: &mut EventScheduler) {
        let Some(pos) = self.entity(mover).map(Entity::position) else {
            return;
        };
        if next == pos {
            return;
        }
        if let Some(occupant) = self.occupant_at(next) {
            if occupant != mover {
                debug!(%mover, evicted = %occupant, pos = %next, "Evicting occupant");
                self.remove_entity(occupant, scheduler);
            }
        }
        self.move_entity(mover, next);
    }

    /// Swap a full octopus for an empty one and start its schedule.
    pub fn transform_full(
        &mut self,
        id: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Result<EntityId> {
        let entity = self.octopus(id)?;
        let replacement = entity.emptied();
        self.replace(id, replacement, scheduler)
    }

    /// Swap a not-full octopus that reached its limit for a full one.
    ///
    /// Returns `false` and changes nothing while it can still eat.
    pub fn transform_not_full(
        &mut self,
        id: EntityId,
        scheduler: &mut EventScheduler,
    ) -> Result<bool> {
        let entity = self.octopus(id)?;
        if entity.resource_count() < entity.resource_limit() {
            return Ok(false);
        }
        let replacement = entity.filled();
        self.replace(id, replacement, scheduler)?;
        Ok(true)
    }

    fn octopus(&self, id: EntityId) -> Result<&Entity> {
        let entity = self.entity(id).ok_or(Error::UnknownEntity(id))?;
        if !entity.kind().is_octopus() {
            return Err(Error::Validation(format!(
                "cannot transform {} ({}): not an octopus",
                entity.id(),
                entity.kind()
            )));
        }
        Ok(entity)
    }

    fn replace(
        &mut self,
        id: EntityId,
        replacement: Entity,
        scheduler: &mut EventScheduler,
    ) -> Result<EntityId> {
        let position = replacement.position();
        self.remove_entity(id, scheduler);
        let new_id = self.try_add_entity(replacement)?;
        if let Some(entity) = self.entities.get(&new_id) {
            debug!(old = %id, new = %new_id, entity_id = entity.id(), kind = %entity.kind(), %position, "Entity transformed");
            scheduler.schedule_actions(new_id, entity);
        }
        Ok(new_id)
    }

    /// Verify that occupancy and entity positions agree.
    pub fn check_consistency(&self) -> Result<()> {
        for (index, cell) in self.occupancy.iter().enumerate() {
            if let Some(id) = cell {
                let pos = self.index_to_pos(index);
                match self.entities.get(id) {
                    Some(entity) if entity.position() == pos => {}
                    Some(entity) => {
                        return Err(Error::Validation(format!(
                            "cell {} points at {} which is at {}",
                            pos,
                            id,
                            entity.position()
                        )))
                    }
                    None => {
                        return Err(Error::Validation(format!(
                            "cell {} points at removed entity {}",
                            pos, id
                        )))
                    }
                }
            }
        }

        for (id, entity) in self.entities() {
            let pos = entity.position();
            if !self.within_bounds(pos) {
                return Err(Error::Validation(format!("{} is out of bounds at {}", id, pos)));
            }
            if self.occupant_at(pos) != Some(id) {
                return Err(Error::Validation(format!(
                    "{} at {} is not recorded in the occupancy grid",
                    id, pos
                )));
            }
        }

        Ok(())
    }

    fn pos_to_index(&self, pos: Point) -> usize {
        pos.y as usize * self.num_cols as usize + pos.x as usize
    }

    fn index_to_pos(&self, index: usize) -> Point {
        let cols = self.num_cols as usize;
        // Indices stay below MAX_CELLS, so both halves fit in an i32.
        Point::new((index % cols) as i32, (index / cols) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageSequence;

    fn images() -> ImageSequence {
        ImageSequence::single(ImageHandle::new("img"))
    }

    fn world(rows: i32, cols: i32) -> WorldModel {
        WorldModel::new(rows, cols, Background::new("water", images())).unwrap()
    }

    fn rock(x: i32, y: i32) -> Entity {
        Entity::obstacle("rock", Point::new(x, y), images())
    }

    #[test]
    fn test_world_creation() {
        let world = world(4, 6);
        assert_eq!(world.num_rows(), 4);
        assert_eq!(world.num_cols(), 6);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(
            world.get_background_image(Point::new(5, 3)),
            Some(&ImageHandle::new("img"))
        );
        assert!(world.get_background_image(Point::new(6, 0)).is_none());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let background = Background::new("water", images());
        let result = WorldModel::new(50_000, 50_000, background.clone());
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = WorldModel::new(i32::MAX, i32::MAX, background.clone());
        assert!(matches!(result, Err(Error::Validation(_))));

        let empty = WorldModel::new(-3, 4, background).unwrap();
        assert_eq!(empty.num_rows(), 0);
        assert!(!empty.within_bounds(Point::new(0, 0)));
    }

    #[test]
    fn test_bounds() {
        let world = world(3, 5);
        assert!(world.within_bounds(Point::new(0, 0)));
        assert!(world.within_bounds(Point::new(4, 2)));
        assert!(!world.within_bounds(Point::new(5, 0)));
        assert!(!world.within_bounds(Point::new(0, 3)));
        assert!(!world.within_bounds(Point::new(-1, 1)));
        assert!(!world.is_occupied(Point::new(-1, 1)));
    }

    #[test]
    fn test_set_background() {
        let mut world = world(3, 3);
        let sand = Background::new("sand", ImageSequence::single(ImageHandle::new("sand")));
        world.set_background(Point::new(1, 1), sand.clone());
        world.set_background(Point::new(9, 9), sand);

        assert_eq!(world.background(Point::new(1, 1)).unwrap().id, "sand");
        assert_eq!(world.background(Point::new(0, 1)).unwrap().id, "water");
    }

    #[test]
    fn test_try_add_entity_rejects_occupied() {
        let mut world = world(5, 5);
        assert!(world.try_add_entity(rock(2, 2)).is_ok());

        let err = world.try_add_entity(rock(2, 2)).unwrap_err();
        assert!(matches!(err, Error::OccupiedCell { position } if position == Point::new(2, 2)));
        assert_eq!(world.entity_count(), 1);

        let err = world.try_add_entity(rock(5, 0)).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
        assert!(world.check_consistency().is_ok());
    }

    #[test]
    fn test_add_entity_ignores_bad_cells() {
        let mut world = world(5, 5);
        let first = world.add_entity(rock(1, 1));
        assert!(first.is_some());
        assert!(world.add_entity(rock(1, 1)).is_none());
        assert!(world.add_entity(rock(-1, 1)).is_none());

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.occupant_at(Point::new(1, 1)), first);
    }

    #[test]
    fn test_find_open_around_scan_order() {
        let mut world = world(5, 5);
        assert_eq!(world.find_open_around(Point::new(2, 2)), Some(Point::new(1, 1)));

        world.add_entity(rock(1, 1));
        world.add_entity(rock(2, 1));
        assert_eq!(world.find_open_around(Point::new(2, 2)), Some(Point::new(3, 1)));

        // Corner: out-of-bounds cells are skipped.
        assert_eq!(world.find_open_around(Point::new(0, 0)), Some(Point::new(0, 0)));
    }

    #[test]
    fn test_find_open_around_full_neighbourhood() {
        let mut world = world(2, 2);
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            world.add_entity(rock(x, y));
        }
        assert_eq!(world.find_open_around(Point::new(0, 0)), None);
    }

    #[test]
    fn test_find_nearest() {
        let mut world = world(10, 10);
        let far = world
            .add_entity(Entity::fish("far", Point::new(9, 9), 100, images()))
            .unwrap();
        world.add_entity(rock(1, 1));
        let near = world
            .add_entity(Entity::fish("near", Point::new(3, 3), 100, images()))
            .unwrap();

        assert_eq!(world.find_nearest(Point::new(0, 0), EntityKind::Fish), Some(near));
        assert_eq!(world.find_nearest(Point::new(8, 8), EntityKind::Fish), Some(far));
        assert_eq!(world.find_nearest(Point::new(0, 0), EntityKind::Crab), None);
    }

    #[test]
    fn test_find_nearest_ties_prefer_first_inserted() {
        let mut world = world(10, 10);
        let first = world
            .add_entity(Entity::fish("a", Point::new(6, 5), 100, images()))
            .unwrap();
        world
            .add_entity(Entity::fish("b", Point::new(4, 5), 100, images()))
            .unwrap();

        let origin = Point::new(5, 5);
        assert_eq!(world.find_nearest(origin, EntityKind::Fish), Some(first));
        assert_eq!(world.find_nearest(origin, EntityKind::Fish), Some(first));
    }

    #[test]
    fn test_move_entity() {
        let mut world = world(5, 5);
        let id = world.add_entity(rock(0, 0)).unwrap();
        let blocker = world.add_entity(rock(2, 0)).unwrap();

        assert!(world.move_entity(id, Point::new(1, 0)));
        assert_eq!(world.occupant_at(Point::new(1, 0)), Some(id));
        assert!(!world.is_occupied(Point::new(0, 0)));

        assert!(!world.move_entity(id, Point::new(1, 0)));
        assert!(!world.move_entity(id, Point::new(-1, 0)));
        assert!(!world.move_entity(id, Point::new(2, 0)));
        assert_eq!(world.occupant_at(Point::new(2, 0)), Some(blocker));
        assert!(world.check_consistency().is_ok());
    }

    #[test]
    fn test_octo_step_prefers_horizontal() {
        let mut world = world(5, 5);
        let pos = Point::new(1, 1);
        assert_eq!(world.next_position_octo(pos, Point::new(4, 4)), Point::new(2, 1));
        assert_eq!(world.next_position_octo(pos, Point::new(1, 4)), Point::new(1, 2));

        world.add_entity(rock(2, 1));
        assert_eq!(world.next_position_octo(pos, Point::new(4, 4)), Point::new(1, 2));

        world.add_entity(rock(1, 2));
        assert_eq!(world.next_position_octo(pos, Point::new(4, 4)), pos);
    }

    #[test]
    fn test_crab_step_passes_through_fish() {
        let mut world = world(5, 5);
        world.add_entity(Entity::fish("fish", Point::new(2, 1), 100, images()));
        let pos = Point::new(1, 1);

        assert_eq!(world.next_position_crab(pos, Point::new(4, 1)), Point::new(2, 1));
        assert_eq!(world.next_position_octo(pos, Point::new(4, 1)), pos);
    }

    #[test]
    fn test_remove_entity_cancels_events() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let fish = world
            .add_entity(Entity::fish("fish", Point::new(2, 2), 100, images()))
            .unwrap();
        scheduler.schedule_actions(fish, world.entity(fish).unwrap());
        assert_eq!(scheduler.pending_count(fish), 1);

        let removed = world.remove_entity(fish, &mut scheduler).unwrap();
        assert_eq!(removed.id(), "fish");
        assert_eq!(scheduler.pending_count(fish), 0);
        assert!(scheduler.is_empty());
        assert!(!world.is_occupied(Point::new(2, 2)));
        assert!(world.remove_entity(fish, &mut scheduler).is_none());
    }

    #[test]
    fn test_move_to_not_full_eats_when_adjacent() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let octo = world
            .add_entity(Entity::octo_not_full("octo", Point::new(0, 0), 2, 500, 100, images()))
            .unwrap();
        let fish = world
            .add_entity(Entity::fish("fish", Point::new(3, 0), 100, images()))
            .unwrap();
        scheduler.schedule_actions(fish, world.entity(fish).unwrap());

        assert!(!world.move_to_not_full(octo, fish, &mut scheduler).unwrap());
        assert_eq!(world.entity(octo).unwrap().position(), Point::new(1, 0));
        assert!(!world.move_to_not_full(octo, fish, &mut scheduler).unwrap());
        assert_eq!(world.entity(octo).unwrap().position(), Point::new(2, 0));

        assert!(world.move_to_not_full(octo, fish, &mut scheduler).unwrap());
        assert_eq!(world.entity(octo).unwrap().resource_count(), 1);
        assert!(!world.contains(fish));
        assert_eq!(scheduler.pending_count(fish), 0);
        assert!(world.check_consistency().is_ok());
    }

    #[test]
    fn test_move_to_full_stops_when_adjacent() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let octo = world
            .add_entity(Entity::octo_full("octo", Point::new(1, 1), 2, 500, 100, images()))
            .unwrap();
        let atlantis = world
            .add_entity(Entity::atlantis("atlantis", Point::new(2, 2), 0, images()))
            .unwrap();

        assert!(world.move_to_full(octo, atlantis, &mut scheduler).unwrap());
        assert_eq!(world.entity(octo).unwrap().position(), Point::new(1, 1));
        assert!(world.contains(atlantis));
    }

    #[test]
    fn test_move_to_crab_evicts_fish_in_path() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let crab = world
            .add_entity(Entity::crab("crab", Point::new(0, 0), 100, 60, images()))
            .unwrap();
        let fish = world
            .add_entity(Entity::fish("fish", Point::new(1, 0), 100, images()))
            .unwrap();
        scheduler.schedule_actions(fish, world.entity(fish).unwrap());
        let grass = world
            .add_entity(Entity::sgrass("grass", Point::new(4, 0), 1000, images()))
            .unwrap();

        assert!(!world.move_to_crab(crab, grass, &mut scheduler).unwrap());
        assert_eq!(world.entity(crab).unwrap().position(), Point::new(1, 0));
        assert!(!world.contains(fish));
        assert_eq!(scheduler.pending_count(fish), 0);

        assert!(!world.move_to_crab(crab, grass, &mut scheduler).unwrap());
        assert!(!world.move_to_crab(crab, grass, &mut scheduler).unwrap());
        assert_eq!(world.entity(crab).unwrap().position(), Point::new(3, 0));
        assert!(world.move_to_crab(crab, grass, &mut scheduler).unwrap());
        assert!(!world.contains(grass));
        assert!(world.check_consistency().is_ok());
    }

    #[test]
    fn test_move_to_unknown_entity_is_an_error() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let crab = world
            .add_entity(Entity::crab("crab", Point::new(0, 0), 100, 60, images()))
            .unwrap();
        let result = world.move_to_crab(crab, EntityId(99), &mut scheduler);
        assert!(matches!(result, Err(Error::UnknownEntity(EntityId(99)))));
    }

    #[test]
    fn test_transform_not_full_waits_for_limit() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let octo = world
            .add_entity(Entity::octo_not_full("octo", Point::new(2, 2), 1, 500, 100, images()))
            .unwrap();
        scheduler.schedule_actions(octo, world.entity(octo).unwrap());

        assert!(!world.transform_not_full(octo, &mut scheduler).unwrap());
        assert!(world.contains(octo));

        world.entity_mut(octo).unwrap().add_resource();
        assert!(world.transform_not_full(octo, &mut scheduler).unwrap());
        assert!(!world.contains(octo));
        assert_eq!(scheduler.pending_count(octo), 0);

        let (new_id, full) = world.get_occupant(Point::new(2, 2)).unwrap();
        assert_eq!(full.kind(), EntityKind::OctoFull);
        assert_eq!(full.id(), "octo");
        assert_eq!(full.resource_count(), 1);
        assert_eq!(scheduler.pending_count(new_id), 2);
    }

    #[test]
    fn test_transform_full_resets_resources() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let octo = world
            .add_entity(Entity::octo_full("octo", Point::new(2, 2), 3, 500, 100, images()))
            .unwrap();

        let new_id = world.transform_full(octo, &mut scheduler).unwrap();
        let octo = world.entity(new_id).unwrap();
        assert_eq!(octo.kind(), EntityKind::OctoNotFull);
        assert_eq!(octo.resource_count(), 0);
        assert_eq!(octo.resource_limit(), 3);
        assert_eq!(scheduler.pending_count(new_id), 2);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_transform_rejects_non_octopus() {
        let mut world = world(5, 5);
        let mut scheduler = EventScheduler::default();
        let id = world.add_entity(rock(1, 1)).unwrap();
        assert!(matches!(
            world.transform_full(id, &mut scheduler),
            Err(Error::Validation(_))
        ));
        assert!(world.contains(id));
    }
}
