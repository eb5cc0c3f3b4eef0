//! End-to-end pooling behavior through the registry and a real scene

use std::rc::Rc;

use approx::assert_relative_eq;

use crate::foundation::math::{Placement, Quat, Vec3};
use crate::pool::PoolRegistry;
use crate::scene::{ObjectHandle, Prefab, Scene};

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        scene: Scene,
        pools: PoolRegistry<Scene>,
        prefab: Rc<Prefab>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                pools: PoolRegistry::new(),
                prefab: Rc::new(Prefab::new("asteroid")),
            }
        }

        fn get(&mut self) -> ObjectHandle {
            self.pools.get(&mut self.scene, &self.prefab, &Placement::origin())
        }

        fn retire(&mut self, handle: ObjectHandle) {
            assert!(self.scene.set_active(handle, false));
        }

        fn indices_consistent(&self) -> bool {
            self.pools
                .container_for(&self.prefab)
                .is_some_and(|container| container.indices_consistent())
        }
    }

    #[test]
    fn test_retired_instance_is_reused_without_growth() {
        let mut fx = Fixture::new();
        let first = fx.get();
        fx.retire(first);

        let again = fx.get();

        assert_eq!(again, first);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 1);
        assert!(fx.scene.is_active(again));
    }

    #[test]
    fn test_pools_never_cross_prototypes() {
        let mut fx = Fixture::new();
        let other = Rc::new(Prefab::new("asteroid"));
        let mine = fx.get();
        fx.retire(mine);

        let theirs = fx.pools.get(&mut fx.scene, &other, &Placement::origin());

        assert_ne!(theirs, mine);
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 1);
        assert_eq!(fx.pools.instance_count(&other), 1);
    }

    #[test]
    fn test_indices_track_positions_through_churn() {
        let mut fx = Fixture::new();
        let handles: Vec<ObjectHandle> = (0..8).map(|_| fx.get()).collect();

        for (step, handle) in handles.iter().enumerate() {
            if step % 3 != 1 {
                fx.retire(*handle);
                assert!(fx.indices_consistent());
            }
        }
        fx.scene.set_active(handles[3], true);
        assert!(fx.indices_consistent());
        fx.scene.destroy(handles[1]);
        assert!(fx.indices_consistent());
        fx.scene.destroy(handles[6]);
        assert!(fx.indices_consistent());
        for _ in 0..4 {
            fx.get();
            assert!(fx.indices_consistent());
        }
    }

    #[test]
    fn test_destroy_anywhere_shrinks_by_one() {
        let mut fx = Fixture::new();
        let handles: Vec<ObjectHandle> = (0..6).map(|_| fx.get()).collect();
        fx.retire(handles[4]);
        fx.retire(handles[5]);

        // One active, one pooled, then the first slot.
        for (expected, victim) in [(5, handles[2]), (4, handles[5]), (3, handles[0])] {
            fx.scene.destroy(victim);
            assert_eq!(fx.pools.instance_count(&fx.prefab), expected);
            assert!(fx.indices_consistent());
        }
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 1);
    }

    #[test]
    fn test_external_reactivation_leaves_the_pool() {
        let mut fx = Fixture::new();
        let first = fx.get();
        let second = fx.get();
        fx.retire(first);
        fx.retire(second);

        fx.scene.set_active(first, true);
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 1);

        assert_eq!(fx.get(), second);
        let fresh = fx.get();
        assert_ne!(fresh, first);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 3);
    }

    #[test]
    fn test_first_get_on_empty_pool_creates() {
        let mut fx = Fixture::new();
        assert_eq!(fx.pools.instance_count(&fx.prefab), 0);

        let handle = fx.get();

        assert_eq!(fx.pools.instance_count(&fx.prefab), 1);
        assert_eq!(fx.scene.instantiated_count(), 1);
        assert!(fx.scene.is_active(handle));
    }

    #[test]
    fn test_third_get_returns_retired_first() {
        let mut fx = Fixture::new();
        let first = fx.get();
        let _second = fx.get();
        fx.retire(first);

        let third = fx.get();

        assert_eq!(third, first);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 2);
    }

    #[test]
    fn test_externally_reactivated_instance_is_never_handed_out() {
        let mut fx = Fixture::new();
        let created = fx.pools.create_instances(&mut fx.scene, &fx.prefab, 3, false);
        let (i1, i2, i3) = (created[0], created[1], created[2]);
        fx.retire(i1);
        fx.retire(i2);
        fx.retire(i3);

        fx.scene.set_active(i2, true);
        let a = fx.get();
        let b = fx.get();

        assert_ne!(a, i2);
        assert_ne!(b, i2);
        let mut got = vec![a, b];
        let mut expected = vec![i1, i3];
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 3);
    }

    #[test]
    fn test_create_instances_fills_only_the_shortfall() {
        let mut fx = Fixture::new();
        fx.get();
        fx.get();

        let created = fx.pools.create_instances(&mut fx.scene, &fx.prefab, 5, false);

        assert_eq!(created.len(), 3);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 5);
        assert_eq!(fx.scene.instantiated_count(), 5);
    }

    #[test]
    fn test_destroy_instances_disposes_active_and_pooled() {
        let mut fx = Fixture::new();
        let handles: Vec<ObjectHandle> = (0..5).map(|_| fx.get()).collect();
        for handle in &handles[2..] {
            fx.retire(*handle);
        }
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 3);

        fx.pools.destroy_instances::<Prefab>(&mut fx.scene);

        assert_eq!(fx.pools.instance_count(&fx.prefab), 0);
        assert_eq!(fx.scene.destroyed_count(), 5);
        assert!(handles.iter().all(|handle| !fx.scene.contains(*handle)));
    }

    #[test]
    fn test_reused_instance_takes_new_placement() {
        let mut fx = Fixture::new();
        let parent = fx.scene.spawn("ship", &Placement::origin());
        let handle = fx.get();
        fx.retire(handle);

        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        let placement = Placement::at_rotated(Vec3::new(5.0, -10.0, 10.0), rotation).with_parent(parent);
        let reused = fx.pools.get(&mut fx.scene, &fx.prefab, &placement);

        assert_eq!(reused, handle);
        assert_eq!(fx.scene.parent(reused), Some(parent));
        let position = fx.scene.position(reused).unwrap_or_else(Vec3::zeros);
        assert_relative_eq!(position, Vec3::new(5.0, -10.0, 10.0), epsilon = 1e-6);
        let applied = fx.scene.rotation(reused).unwrap_or_else(Quat::identity);
        assert_relative_eq!(applied.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_destroying_parent_removes_pooled_children() {
        let mut fx = Fixture::new();
        let ship = fx.scene.spawn("ship", &Placement::origin());
        let attached = fx.pools.get(&mut fx.scene, &fx.prefab, &Placement::origin().with_parent(ship));
        let loose = fx.get();
        fx.retire(loose);

        fx.scene.destroy(ship);

        assert!(!fx.scene.contains(attached));
        assert_eq!(fx.pools.instance_count(&fx.prefab), 1);
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 1);
        assert!(fx.indices_consistent());
    }

    #[test]
    fn test_disabling_parent_retires_attached_instances() {
        let mut fx = Fixture::new();
        let turret = fx.scene.spawn("turret", &Placement::origin());
        let flash = fx.pools.get(&mut fx.scene, &fx.prefab, &Placement::origin().with_parent(turret));

        fx.retire(turret);
        assert!(!fx.scene.is_active(flash));
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 1);
        assert!(fx.indices_consistent());

        assert!(fx.scene.set_active(turret, true));
        assert!(fx.scene.is_active(flash));
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 0);
        assert!(fx.indices_consistent());
    }

    #[test]
    fn test_instance_retired_by_parent_is_reused_elsewhere() {
        let mut fx = Fixture::new();
        let turret = fx.scene.spawn("turret", &Placement::origin());
        let flash = fx.pools.get(&mut fx.scene, &fx.prefab, &Placement::origin().with_parent(turret));
        fx.retire(turret);

        let reused = fx.get();

        assert_eq!(reused, flash);
        assert!(fx.scene.is_active(reused));
        assert_eq!(fx.scene.parent(reused), None);
        assert_eq!(fx.pools.instance_count(&fx.prefab), 1);
        assert_eq!(fx.pools.pooled_count(&fx.prefab), 0);
        assert!(fx.indices_consistent());
    }
}
