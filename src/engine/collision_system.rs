use super::*;
use crate::constants::{COLLISION_FACTOR, TIMER_EPSILON};

impl GameEngine {
    /// The shared power timer is the master clock: when it runs out every ghost calms down,
    /// whatever its own countdown says.
    pub(super) fn update_power_timer(&mut self, dt: f64) {
        if self.power_remaining <= 0.0 {
            return;
        }
        self.power_remaining -= dt;
        if self.power_remaining > TIMER_EPSILON {
            return;
        }
        self.power_remaining = 0.0;
        for ghost in &mut self.ghosts {
            ghost.calm();
        }
        self.events.push(RuntimeEvent::PowerEnded);
    }

    pub(super) fn resolve_ghost_collisions(&mut self) {
        for idx in 0..self.ghosts.len() {
            let reach = (self.player.radius + self.ghosts[idx].mover.radius) * COLLISION_FACTOR;
            if self.player.pos.distance(self.ghosts[idx].mover.pos) >= reach {
                continue;
            }

            let ghost_id = self.ghosts[idx].id.clone();
            if self.ghosts[idx].is_frightened() {
                self.score += GHOST_POINTS;
                self.stats.ghosts += 1;
                self.ghosts[idx].respawn(&self.geometry);
                self.events.push(RuntimeEvent::GhostEaten { ghost_id });
            } else if self.outcome == Outcome::Playing {
                self.events.push(RuntimeEvent::PlayerCaught { ghost_id });
                self.finish(Outcome::Lost);
            }
        }
    }
}
