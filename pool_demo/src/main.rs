//! Pool demo: a turret firing bullets that burst into explosions
//!
//! Runs a fixed number of simulated frames against the reference scene.
//! Pools are pre-warmed from `config/pools.toml`, bullets and explosions are
//! retired by deactivating them, and a context reset halfway through shows
//! persistent pools surviving while the rest are torn down.
//!
//! Run with `RUST_LOG=instance_pool=trace` to watch every retire and reuse.

use std::rc::Rc;

use instance_pool::foundation::logging;
use instance_pool::prelude::*;
use rand::prelude::*;

// Configuration constants
const FRAMES: usize = 240;
const FRAME_TIME: f32 = 1.0 / 60.0;
const FIRE_INTERVAL: usize = 3;
const BULLET_SPEED: f32 = 20.0;
const BULLET_LIFETIME: f32 = 0.75;
const EXPLOSION_LIFETIME: f32 = 0.4;
const STATS_INTERVAL: usize = 60;

const REGISTRY_CONFIG: &str = "pool_demo/config/registry.ron";
const INITIALIZER_CONFIG: &str = "pool_demo/config/pools.toml";

/// Something on screen with a timer
struct Timed {
    handle: ObjectHandle,
    age: f32,
    lifetime: f32,
    velocity: Vec3,
}

impl Timed {
    const fn new(handle: ObjectHandle, lifetime: f32, velocity: Vec3) -> Self {
        Self {
            handle,
            age: 0.0,
            lifetime,
            velocity,
        }
    }
}

struct PoolDemo {
    scene: Scene,
    pools: PoolRegistry<Scene>,
    catalog: NamedPrototypes,
    bullet: Rc<Prefab>,
    explosion: Rc<Prefab>,
    muzzle_flash: Rc<Prefab>,
    turret: ObjectHandle,
    bullets: Vec<Timed>,
    explosions: Vec<Timed>,
    flash: Option<ObjectHandle>,
    rng: StdRng,
}

impl PoolDemo {
    fn new(config: PoolConfig) -> Self {
        let mut scene = Scene::new();
        let turret = scene.spawn("turret", &Placement::origin());
        scene.mark_persistent(turret);

        let bullet = Rc::new(Prefab::new("bullet"));
        let explosion = Rc::new(Prefab::new("explosion"));
        let muzzle_flash = Rc::new(Prefab::new("muzzle_flash").with_pivot(Vec3::new(0.0, 0.0, 0.5)));

        let mut catalog = NamedPrototypes::new();
        catalog.insert("bullet", &bullet);
        catalog.insert("explosion", &explosion);
        catalog.insert("muzzle_flash", &muzzle_flash);

        let mut pools = PoolRegistry::with_config(config);
        pools.register_type::<Prefab>();

        Self {
            scene,
            pools,
            catalog,
            bullet,
            explosion,
            muzzle_flash,
            turret,
            bullets: Vec::new(),
            explosions: Vec::new(),
            flash: None,
            rng: StdRng::seed_from_u64(0x5EED),
        }
    }

    fn prewarm(&mut self, initializer: &mut PoolInitializer) {
        let report = initializer.run(&mut self.pools, &mut self.scene, &self.catalog);
        if !report.skipped.is_empty() {
            log::warn!("Pre-warm skipped: {:?}", report.skipped);
        }
    }

    fn update(&mut self, frame: usize) {
        if let Some(flash) = self.flash.take() {
            self.scene.deactivate(&flash);
        }
        if frame % FIRE_INTERVAL == 0 {
            self.fire();
        }

        self.advance_bullets();
        self.advance_explosions();
    }

    fn fire(&mut self) {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let direction = Vec3::new(angle.cos(), 0.0, angle.sin());
        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), -angle);

        let bullet = self.pools.get(&mut self.scene, &self.bullet, &Placement::at_rotated(Vec3::zeros(), rotation));
        self.bullets.push(Timed::new(bullet, BULLET_LIFETIME, direction * BULLET_SPEED));

        let flash_placement = Placement::at_rotated(Vec3::zeros(), rotation).with_parent(self.turret);
        self.flash = Some(self.pools.get(&mut self.scene, &self.muzzle_flash, &flash_placement));
    }

    fn advance_bullets(&mut self) {
        let mut impacts = Vec::new();
        for bullet in &mut self.bullets {
            bullet.age += FRAME_TIME;
            if let Some(object) = self.scene.get_mut(bullet.handle) {
                object.position += bullet.velocity * FRAME_TIME;
            }
        }

        let scene = &mut self.scene;
        self.bullets.retain(|bullet| {
            if bullet.age < bullet.lifetime {
                return true;
            }
            if let Some(position) = scene.position(bullet.handle) {
                impacts.push(position);
            }
            scene.deactivate(&bullet.handle);
            false
        });

        for position in impacts {
            let scale = self.rng.gen_range(0.8..1.2);
            let explosion = self.pools.get(&mut self.scene, &self.explosion, &Placement::at(position));
            self.explosions
                .push(Timed::new(explosion, EXPLOSION_LIFETIME * scale, Vec3::zeros()));
        }
    }

    fn advance_explosions(&mut self) {
        let scene = &mut self.scene;
        self.explosions.retain_mut(|explosion| {
            explosion.age += FRAME_TIME;
            if explosion.age < explosion.lifetime {
                return true;
            }
            scene.deactivate(&explosion.handle);
            false
        });
    }

    fn reset_context(&mut self) {
        let destroyed = self.scene.reset_context();
        self.bullets.clear();
        self.explosions.clear();
        log::info!("Context reset destroyed {} objects", destroyed);
    }

    fn log_stats(&self, frame: usize) {
        log::info!(
            "Frame {:>3}: {} | bullets {} pooled, explosions {} pooled, flashes {} pooled",
            frame,
            self.pools.stats(),
            self.pools.pooled_count(&self.bullet),
            self.pools.pooled_count(&self.explosion),
            self.pools.pooled_count(&self.muzzle_flash),
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match PoolConfig::load_from_file(REGISTRY_CONFIG) {
        Ok(config) => (config, None),
        Err(err) => (PoolConfig::default(), Some(err)),
    };
    logging::init_with_level(&config.log_level);
    if let Some(err) = config_error {
        log::warn!("Using default pool settings ({}): {}", REGISTRY_CONFIG, err);
    }

    let mut initializer = PoolInitializer::from_file(INITIALIZER_CONFIG)?;
    log::info!(
        "Loaded {} pre-warm elements ({} instances)",
        initializer.config().elements.len(),
        initializer.config().total_quantity()
    );

    let mut demo = PoolDemo::new(config);
    demo.prewarm(&mut initializer);
    demo.log_stats(0);

    for frame in 1..=FRAMES {
        demo.update(frame);

        if frame == FRAMES / 2 {
            demo.reset_context();
            demo.prewarm(&mut initializer);
        }
        if frame % STATS_INTERVAL == 0 {
            demo.log_stats(frame);
        }
    }

    log::info!(
        "Scene created {} objects for {} frames; {} live at shutdown",
        demo.scene.instantiated_count(),
        FRAMES,
        demo.scene.len()
    );
    demo.pools.shutdown(&mut demo.scene);
    log::info!("{} objects left after shutdown", demo.scene.len());

    Ok(())
}
