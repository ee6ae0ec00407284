//! Anchor registry: per-target anchors and their found/lost transitions.

use std::sync::Arc;

use nalgebra::Matrix4;
use parking_lot::RwLock;

use crate::error::{Result, SessionError};
use crate::geometry::{display_transform, post_transform};
use crate::system::events::{EventEmitter, SessionEvent};
use crate::system::messages::PoseUpdate;

use super::types::{TargetDimensions, TargetIndex};

/// Snapshot of an anchor's placement as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    /// Display transform (`world · post`). Identity until first detection.
    pub matrix: Matrix4<f32>,
    pub visible: bool,
}

impl AnchorPose {
    fn hidden() -> Self {
        Self {
            matrix: Matrix4::identity(),
            visible: false,
        }
    }
}

/// Renderable placeholder following one target.
///
/// The post-transform is fixed at creation. The pose is replaced as a whole
/// value on every update so a concurrent render pass never observes a
/// partially written transform.
#[derive(Debug)]
pub struct Anchor {
    target_index: TargetIndex,
    post_transform: Matrix4<f32>,
    pose: RwLock<AnchorPose>,
}

/// Shared handle returned to the host.
pub type AnchorHandle = Arc<Anchor>;

impl Anchor {
    fn new(target_index: TargetIndex, dims: TargetDimensions) -> Self {
        Self {
            target_index,
            post_transform: post_transform(dims),
            pose: RwLock::new(AnchorPose::hidden()),
        }
    }

    pub fn target_index(&self) -> TargetIndex {
        self.target_index
    }

    pub fn post_transform(&self) -> &Matrix4<f32> {
        &self.post_transform
    }

    /// Consistent copy of the current pose.
    pub fn pose(&self) -> AnchorPose {
        *self.pose.read()
    }

    pub fn is_visible(&self) -> bool {
        self.pose.read().visible
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.pose.read().matrix
    }

    fn replace_pose(&self, pose: AnchorPose) {
        *self.pose.write() = pose;
    }
}

/// Registry of all anchors in a session.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    dimensions: Vec<TargetDimensions>,
    anchors: Vec<AnchorHandle>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the dimensions reported by the tracker at registration.
    pub fn set_target_dimensions(&mut self, dimensions: Vec<TargetDimensions>) {
        self.dimensions = dimensions;
    }

    pub fn target_dimensions(&self) -> &[TargetDimensions] {
        &self.dimensions
    }

    pub fn anchors(&self) -> &[AnchorHandle] {
        &self.anchors
    }

    /// Create an invisible anchor for `target_index`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownTarget`] if the target has no registered
    /// dimensions (including any call before the tracker is initialized), and
    /// [`SessionError::DegenerateTarget`] if its width or height is not positive.
    pub fn create_anchor(&mut self, target_index: TargetIndex) -> Result<AnchorHandle> {
        let dims = *self
            .dimensions
            .get(target_index.0)
            .ok_or(SessionError::UnknownTarget(target_index))?;
        if !(dims.width > 0.0 && dims.height > 0.0) {
            return Err(SessionError::DegenerateTarget {
                target_index,
                width: dims.width,
                height: dims.height,
            });
        }

        let anchor = Arc::new(Anchor::new(target_index, dims));
        self.anchors.push(Arc::clone(&anchor));
        tracing::debug!(
            target = %target_index,
            width = dims.width,
            height = dims.height,
            "anchor created"
        );
        Ok(anchor)
    }

    /// Route one pose update to every anchor of its target.
    ///
    /// `targetFound` / `targetLost` are emitted only on visibility edges and
    /// always before the new visibility is stored.
    pub fn apply_pose_update(&self, update: &PoseUpdate, events: &EventEmitter) {
        let target_index = update.target_index;
        for anchor in self
            .anchors
            .iter()
            .filter(|a| a.target_index == target_index)
        {
            let was_visible = anchor.is_visible();
            match &update.world_matrix {
                Some(world) => {
                    let matrix = display_transform(world, &anchor.post_transform);
                    if !was_visible {
                        events.emit(SessionEvent::TargetFound { target_index });
                    }
                    anchor.replace_pose(AnchorPose {
                        matrix,
                        visible: true,
                    });
                }
                None => {
                    if was_visible {
                        events.emit(SessionEvent::TargetLost { target_index });
                    }
                    anchor.replace_pose(AnchorPose {
                        matrix: anchor.matrix(),
                        visible: false,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_elements() -> [f32; 16] {
        let mut m = [0.0f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        m
    }

    fn registry_with_targets() -> AnchorRegistry {
        let mut registry = AnchorRegistry::new();
        registry.set_target_dimensions(vec![
            TargetDimensions::new(1.0, 1.5),
            TargetDimensions::new(2.0, 2.0),
        ]);
        registry
    }

    #[test]
    fn test_create_anchor_requires_known_target() {
        let mut registry = AnchorRegistry::new();
        let err = registry.create_anchor(TargetIndex::new(0)).unwrap_err();
        assert!(matches!(err, SessionError::UnknownTarget(TargetIndex(0))));

        let mut registry = registry_with_targets();
        assert!(registry.create_anchor(TargetIndex::new(1)).is_ok());
        assert!(matches!(
            registry.create_anchor(TargetIndex::new(2)),
            Err(SessionError::UnknownTarget(TargetIndex(2)))
        ));
        assert_eq!(registry.anchors().len(), 1);
    }

    #[test]
    fn test_degenerate_target_rejects_anchor() {
        let mut registry = AnchorRegistry::new();
        registry.set_target_dimensions(vec![
            TargetDimensions::new(1.0, -2.0),
            TargetDimensions::new(1.0, 1.0),
        ]);

        let err = registry.create_anchor(TargetIndex::new(0)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::DegenerateTarget {
                target_index: TargetIndex(0),
                ..
            }
        ));
        assert!(registry.create_anchor(TargetIndex::new(1)).is_ok());
        assert_eq!(registry.anchors().len(), 1);
    }

    #[test]
    fn test_new_anchor_is_invisible_with_post_transform() {
        let mut registry = registry_with_targets();
        let anchor = registry.create_anchor(TargetIndex::new(0)).unwrap();

        assert!(!anchor.is_visible());
        assert_relative_eq!(anchor.post_transform()[(0, 0)], 1.0);
        assert_relative_eq!(anchor.post_transform()[(1, 3)], 0.75);
    }

    #[test]
    fn test_edge_triggered_found_lost_sequence() {
        let mut registry = registry_with_targets();
        let anchor = registry.create_anchor(TargetIndex::new(0)).unwrap();
        let events = EventEmitter::new();
        let rx = events.subscribe();

        let t = TargetIndex::new(0);
        let world = identity_elements();
        for update in [
            PoseUpdate::found(t, world),
            PoseUpdate::found(t, world),
            PoseUpdate::lost(t),
            PoseUpdate::lost(t),
            PoseUpdate::found(t, world),
        ] {
            registry.apply_pose_update(&update, &events);
        }

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                SessionEvent::TargetFound { target_index: t },
                SessionEvent::TargetLost { target_index: t },
                SessionEvent::TargetFound { target_index: t },
            ]
        );
        assert!(anchor.is_visible());
    }

    #[test]
    fn test_repeated_detection_does_not_refire_found() {
        let mut registry = registry_with_targets();
        registry.create_anchor(TargetIndex::new(1)).unwrap();
        let events = EventEmitter::new();
        let rx = events.subscribe();

        let update = PoseUpdate::found(TargetIndex::new(1), identity_elements());
        for _ in 0..5 {
            registry.apply_pose_update(&update, &events);
        }
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_lost_before_found_is_silent() {
        let mut registry = registry_with_targets();
        registry.create_anchor(TargetIndex::new(0)).unwrap();
        let events = EventEmitter::new();
        let rx = events.subscribe();

        registry.apply_pose_update(&PoseUpdate::lost(TargetIndex::new(0)), &events);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_pose_composes_world_with_post() {
        let mut registry = registry_with_targets();
        let anchor = registry.create_anchor(TargetIndex::new(1)).unwrap();
        let events = EventEmitter::new();

        let mut world = identity_elements();
        world[12] = 10.0; // translate x
        registry.apply_pose_update(&PoseUpdate::found(TargetIndex::new(1), world), &events);

        let pose = anchor.pose();
        assert!(pose.visible);
        // post: scale 2, offset (1, 1, 0); world adds +10 on x.
        assert_relative_eq!(pose.matrix[(0, 0)], 2.0);
        assert_relative_eq!(pose.matrix[(0, 3)], 11.0);
        assert_relative_eq!(pose.matrix[(1, 3)], 1.0);
    }

    #[test]
    fn test_lost_keeps_last_matrix() {
        let mut registry = registry_with_targets();
        let anchor = registry.create_anchor(TargetIndex::new(1)).unwrap();
        let events = EventEmitter::new();

        let mut world = identity_elements();
        world[13] = 4.0;
        registry.apply_pose_update(&PoseUpdate::found(TargetIndex::new(1), world), &events);
        let before = anchor.matrix();
        registry.apply_pose_update(&PoseUpdate::lost(TargetIndex::new(1)), &events);

        assert!(!anchor.is_visible());
        assert_eq!(anchor.matrix(), before);
    }

    #[test]
    fn test_anchors_sharing_a_target_each_emit() {
        let mut registry = registry_with_targets();
        let a = registry.create_anchor(TargetIndex::new(0)).unwrap();
        let b = registry.create_anchor(TargetIndex::new(0)).unwrap();
        let other = registry.create_anchor(TargetIndex::new(1)).unwrap();
        let events = EventEmitter::new();
        let rx = events.subscribe();

        registry.apply_pose_update(
            &PoseUpdate::found(TargetIndex::new(0), identity_elements()),
            &events,
        );

        assert!(a.is_visible() && b.is_visible());
        assert!(!other.is_visible());
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_updates_for_other_targets_interleave_in_order() {
        let mut registry = registry_with_targets();
        registry.create_anchor(TargetIndex::new(0)).unwrap();
        registry.create_anchor(TargetIndex::new(1)).unwrap();
        let events = EventEmitter::new();
        let rx = events.subscribe();

        let (t0, t1) = (TargetIndex::new(0), TargetIndex::new(1));
        for update in [
            PoseUpdate::found(t1, identity_elements()),
            PoseUpdate::found(t0, identity_elements()),
            PoseUpdate::lost(t1),
        ] {
            registry.apply_pose_update(&update, &events);
        }

        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                SessionEvent::TargetFound { target_index: t1 },
                SessionEvent::TargetFound { target_index: t0 },
                SessionEvent::TargetLost { target_index: t1 },
            ]
        );
    }
}
