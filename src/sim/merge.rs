//! Same-rank merge resolution
//!
//! Collision-start notifications are processed in arrival order. A pair
//! merges only if both bodies are unclaimed balls of the same rank; both are
//! claimed before anything else happens so no ball can be consumed twice.
//! Ranks are read from the tags the bodies carry.

use super::chain::BallTypeChain;
use super::physics::{CollisionPair, PhysicsWorld};
use super::state::{EventKind, GameEvent, Playfield, Score};

/// Turns same-rank collisions into promotions or terminal bonuses
#[derive(Debug, Clone, Copy)]
pub struct MergeResolver {
    promotion_bonus: u64,
    terminal_bonus: u64,
}

impl MergeResolver {
    pub fn new(promotion_bonus: u64, terminal_bonus: u64) -> Self {
        Self {
            promotion_bonus,
            terminal_bonus,
        }
    }

    /// Resolve one tick of notifications. Returns the number of merges.
    pub fn resolve<W: PhysicsWorld>(
        &self,
        pairs: &[CollisionPair],
        chain: &BallTypeChain,
        playfield: &mut Playfield<W>,
        score: &mut Score,
        events: &mut Vec<GameEvent>,
    ) -> u32 {
        let mut merges = 0;

        for pair in pairs {
            // Walls and removed bodies carry no tag
            let (Some(tag_a), Some(tag_b)) = (playfield.tag(pair.a), playfield.tag(pair.b)) else {
                continue;
            };
            let (Some(a), Some(b)) = (
                playfield.ball_for_handle(pair.a),
                playfield.ball_for_handle(pair.b),
            ) else {
                continue;
            };
            if a.id == b.id || a.merge_claimed || b.merge_claimed {
                continue;
            }
            if tag_a.rank != tag_b.rank {
                continue;
            }
            let Some(consumed) = chain.get(tag_a.rank).cloned() else {
                continue;
            };

            let (id_a, id_b) = (a.id, b.id);
            let (handle_a, handle_b) = (a.handle, b.handle);
            let (Some(pos_a), Some(pos_b)) = (playfield.position(a), playfield.position(b)) else {
                continue;
            };

            playfield.claim(id_a);
            playfield.claim(id_b);
            let mid = (pos_a + pos_b) / 2.0;
            playfield.remove_body(handle_a);
            playfield.remove_body(handle_b);

            let kind = match chain.successor(consumed.rank) {
                Some(next) => {
                    let new_id = playfield.insert_ball(next, mid);
                    score.add(self.promotion_bonus);
                    log::debug!(
                        "Merged #{id_a} + #{id_b} (rank {}) -> #{new_id} (rank {}) at ({:.1}, {:.1}), score {}",
                        consumed.rank,
                        next.rank,
                        mid.x,
                        mid.y,
                        score.current()
                    );
                    EventKind::Promote
                }
                None => {
                    score.add(self.terminal_bonus);
                    log::debug!(
                        "Terminal merge #{id_a} + #{id_b} at ({:.1}, {:.1}), score {}",
                        mid.x,
                        mid.y,
                        score.current()
                    );
                    EventKind::Terminal
                }
            };

            events.push(GameEvent {
                kind,
                pos: mid,
                rank: consumed.rank,
                visual_key: consumed.visual_key,
            });
            merges += 1;
        }

        playfield.purge_removed();
        merges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::physics::{BallTag, BodyHandle, BodyProperties};
    use crate::sim::state::Container;
    use crate::sim::world::{SimpleWorld, Wall};
    use glam::Vec2;

    /// Bodies removed during a tick stay in the world until the next step
    #[derive(Debug, Default)]
    struct DeferredWorld {
        bodies: Vec<(BodyHandle, Vec2, BallTag)>,
        doomed: Vec<BodyHandle>,
        next_index: u32,
    }

    impl PhysicsWorld for DeferredWorld {
        fn insert_body(
            &mut self,
            position: Vec2,
            _radius: f32,
            _properties: &BodyProperties,
            tag: BallTag,
        ) -> BodyHandle {
            let handle = BodyHandle::new(self.next_index, 0);
            self.next_index += 1;
            self.bodies.push((handle, position, tag));
            handle
        }

        fn remove_body(&mut self, handle: BodyHandle) {
            self.doomed.push(handle);
        }

        fn step(&mut self, _dt: f32) {
            let doomed = std::mem::take(&mut self.doomed);
            self.bodies.retain(|(h, ..)| !doomed.contains(h));
        }

        fn collisions_since_last_tick(&mut self) -> Vec<CollisionPair> {
            Vec::new()
        }

        fn body_tag(&self, handle: BodyHandle) -> Option<BallTag> {
            self.bodies
                .iter()
                .find(|(h, ..)| *h == handle)
                .map(|(_, _, tag)| *tag)
        }

        fn body_position(&self, handle: BodyHandle) -> Option<Vec2> {
            self.bodies
                .iter()
                .find(|(h, ..)| *h == handle)
                .map(|(_, pos, _)| *pos)
        }

        fn live_body_positions(&self) -> Vec<(BodyHandle, Vec2)> {
            self.bodies.iter().map(|(h, pos, _)| (*h, *pos)).collect()
        }
    }

    struct Rig<W: PhysicsWorld> {
        chain: BallTypeChain,
        playfield: Playfield<W>,
        score: Score,
        events: Vec<GameEvent>,
        resolver: MergeResolver,
    }

    fn simple_rig() -> Rig<SimpleWorld> {
        let container = Container::default();
        Rig::with_world(SimpleWorld::new(container, 0.0))
    }

    impl<W: PhysicsWorld> Rig<W> {
        fn with_world(world: W) -> Self {
            let container = Container::default();
            Self {
                chain: BallTypeChain::default(),
                playfield: Playfield::new(world, container, BodyProperties::default()),
                score: Score::new(),
                events: Vec::new(),
                resolver: MergeResolver::new(PROMOTION_BONUS, TERMINAL_BONUS),
            }
        }

        fn add(&mut self, rank: usize, x: f32, y: f32) -> u32 {
            let ty = self.chain.type_at(rank).clone();
            self.playfield.insert_ball(&ty, Vec2::new(x, y))
        }

        fn pair(&self, a: u32, b: u32) -> CollisionPair {
            let ha = self.playfield.ball(a).unwrap().handle;
            let hb = self.playfield.ball(b).unwrap().handle;
            CollisionPair::new(ha, hb)
        }

        fn resolve(&mut self, pairs: &[CollisionPair]) -> u32 {
            self.resolver.resolve(
                pairs,
                &self.chain,
                &mut self.playfield,
                &mut self.score,
                &mut self.events,
            )
        }
    }

    #[test]
    fn test_same_rank_promotes_at_midpoint() {
        let mut rig = simple_rig();
        let a = rig.add(2, 100.0, 400.0);
        let b = rig.add(2, 140.0, 420.0);
        let pair = rig.pair(a, b);

        assert_eq!(rig.resolve(&[pair]), 1);
        let live = rig.playfield.live_balls();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].rank, 3);
        assert_eq!(live[0].pos, Vec2::new(120.0, 410.0));
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
        assert_eq!(rig.events.len(), 1);
        assert_eq!(rig.events[0].kind, EventKind::Promote);
        assert_eq!(rig.events[0].rank, 2);
        assert_eq!(rig.events[0].visual_key, "ball3.png");
        assert_eq!(rig.playfield.world().body_count(), 1);
    }

    #[test]
    fn test_terminal_merge_leaves_nothing() {
        let mut rig = simple_rig();
        let a = rig.add(8, 150.0, 400.0);
        let b = rig.add(8, 270.0, 400.0);
        let pair = rig.pair(a, b);

        assert_eq!(rig.resolve(&[pair]), 1);
        assert!(rig.playfield.live_balls().is_empty());
        assert_eq!(rig.playfield.record_count(), 0);
        assert_eq!(rig.score.current(), TERMINAL_BONUS);
        assert_eq!(rig.events[0].kind, EventKind::Terminal);
        assert_eq!(rig.events[0].pos, Vec2::new(210.0, 400.0));
    }

    #[test]
    fn test_different_ranks_do_not_merge() {
        let mut rig = simple_rig();
        let a = rig.add(0, 100.0, 400.0);
        let b = rig.add(1, 130.0, 400.0);
        let pair = rig.pair(a, b);

        assert_eq!(rig.resolve(&[pair]), 0);
        assert_eq!(rig.playfield.live_balls().len(), 2);
        assert_eq!(rig.score.current(), 0);
        assert!(rig.events.is_empty());
    }

    #[test]
    fn test_three_way_collision_merges_once() {
        let mut rig = simple_rig();
        let a = rig.add(1, 100.0, 400.0);
        let b = rig.add(1, 140.0, 400.0);
        let c = rig.add(1, 180.0, 400.0);
        let pairs = [rig.pair(a, b), rig.pair(b, c)];

        assert_eq!(rig.resolve(&pairs), 1);
        let live = rig.playfield.live_balls();
        assert_eq!(live.len(), 2);
        let survivor = rig.playfield.ball(c).unwrap();
        assert!(!survivor.merge_claimed);
        assert_eq!(survivor.ball_type.rank, 1);
        assert!(live.iter().any(|v| v.rank == 2));
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
    }

    #[test]
    fn test_duplicate_notification_is_idempotent() {
        let mut rig = simple_rig();
        let a = rig.add(0, 100.0, 400.0);
        let b = rig.add(0, 130.0, 400.0);
        let pair = rig.pair(a, b);
        let flipped = CollisionPair::new(pair.b, pair.a);

        assert_eq!(rig.resolve(&[pair, flipped, pair]), 1);
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
        // Handles from a previous tick are unknown now
        assert_eq!(rig.resolve(&[pair]), 0);
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
    }

    #[test]
    fn test_wall_notifications_are_ignored() {
        let mut rig = simple_rig();
        let a = rig.add(0, 100.0, 400.0);
        let ha = rig.playfield.ball(a).unwrap().handle;
        let wall = rig.playfield.world().wall_handle(Wall::Bottom);

        assert_eq!(rig.resolve(&[CollisionPair::new(ha, wall)]), 0);
        assert_eq!(rig.playfield.live_balls().len(), 1);
    }

    #[test]
    fn test_self_pair_is_ignored() {
        let mut rig = simple_rig();
        let a = rig.add(0, 100.0, 400.0);
        let pair = rig.pair(a, a);
        assert_eq!(rig.resolve(&[pair]), 0);
        assert_eq!(rig.playfield.live_balls().len(), 1);
    }

    #[test]
    fn test_chain_reaction_within_one_tick_is_deferred() {
        // The freshly merged ball is not in this tick's notifications
        let mut rig = simple_rig();
        let a = rig.add(0, 100.0, 400.0);
        let b = rig.add(0, 130.0, 400.0);
        let c = rig.add(1, 115.0, 420.0);
        let pair = rig.pair(a, b);
        rig.resolve(&[pair]);

        let live = rig.playfield.live_balls();
        assert_eq!(live.iter().filter(|v| v.rank == 1).count(), 2);
        assert!(rig.playfield.ball(c).is_some());
    }

    #[test]
    fn test_claim_holds_while_removal_is_pending() {
        let mut rig = Rig::with_world(DeferredWorld::default());
        let a = rig.add(1, 100.0, 400.0);
        let b = rig.add(1, 140.0, 400.0);
        let c = rig.add(1, 180.0, 400.0);
        let pairs = [rig.pair(a, b), rig.pair(b, c), rig.pair(a, c)];

        // Bodies of `a` and `b` are still in the world after the first merge
        assert_eq!(rig.resolve(&pairs), 1);
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
        assert!(rig.playfield.ball(a).unwrap().merge_claimed);
        assert!(rig.playfield.ball(b).unwrap().merge_claimed);
        assert!(!rig.playfield.ball(c).unwrap().merge_claimed);
        let live = rig.playfield.live_balls();
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|v| v.id != a && v.id != b));
    }

    #[test]
    fn test_claimed_ball_seen_again_next_tick() {
        let mut rig = Rig::with_world(DeferredWorld::default());
        let a = rig.add(1, 100.0, 400.0);
        let b = rig.add(1, 140.0, 400.0);
        let c = rig.add(1, 180.0, 400.0);
        let first = rig.pair(a, b);
        let second = rig.pair(b, c);
        assert_eq!(rig.resolve(&[first]), 1);

        assert_eq!(rig.resolve(&[first, second]), 0);
        assert_eq!(rig.score.current(), PROMOTION_BONUS);
        assert_eq!(rig.events.len(), 1);
        assert_eq!(rig.playfield.record_count(), 4);

        // Records go once the world has actually dropped the bodies
        rig.playfield.world_mut().step(SIM_DT);
        rig.resolve(&[]);
        assert_eq!(rig.playfield.record_count(), 2);
        assert!(rig.playfield.ball(a).is_none());
        assert!(rig.playfield.ball(b).is_none());
    }

    #[test]
    fn test_rank_is_read_from_body_tag() {
        let mut rig = Rig::with_world(DeferredWorld::default());
        let a = rig.add(2, 100.0, 400.0);
        let b = rig.add(2, 140.0, 400.0);
        let pair = rig.pair(a, b);
        // Retag `b` in the world only: the tags now disagree
        for body in rig.playfield.world_mut().bodies.iter_mut() {
            if body.0 == pair.b {
                body.2.rank = 3;
            }
        }
        assert_eq!(rig.resolve(&[pair]), 0);
        assert_eq!(rig.playfield.live_balls().len(), 2);
    }
}
