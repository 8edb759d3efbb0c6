//! End-to-end scenarios across the controller, the pool and the C ABI.

use std::ffi::CString;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::automaton::grid::tests::assert_invariants;
use crate::ffi::*;
use crate::{CellMarker, Coord, LifeConfig, Simulation};

/// Seeded soup: roughly `density` of the cells in `[lo, hi)^3`.
fn soup(seed: u64, lo: i32, hi: i32, density: f64) -> Vec<Coord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells = Vec::new();
    for z in lo..hi {
        for y in lo..hi {
            for x in lo..hi {
                if rng.random::<f64>() < density {
                    cells.push(Coord::new(x, y, z));
                }
            }
        }
    }
    cells
}

fn sim_with(grid_size: u32, worker_threads: u8) -> Simulation {
    Simulation::new(LifeConfig {
        grid_size,
        worker_threads,
        ..LifeConfig::default()
    })
    .unwrap()
}

fn sorted_live(s: &Simulation) -> Vec<Coord> {
    let mut cells: Vec<Coord> = s.live_cells().collect();
    cells.sort_unstable();
    cells
}

fn assert_bound(s: &Simulation) {
    let stats = s.stats();
    assert_eq!(stats.pool.active + stats.unrepresented, stats.live_cells);
    assert!(stats.pool.active <= s.pool().hard_cap());
    for coord in s.live_cells() {
        if let Some(marker) = s.instance(coord) {
            assert_eq!(marker.position, Some(coord));
        }
    }
}

#[test]
fn test_soup_keeps_invariants_over_many_steps() {
    let mut s = sim_with(12, 1);
    for c in soup(7, 2, 10, 0.35) {
        s.request_add_cell(c);
    }
    assert_bound(&s);

    for _ in 0..12 {
        let before = s.live_count();
        let delta = s.step().clone();
        assert_eq!(
            s.live_count() + delta.removed.len(),
            before + delta.added.len()
        );
        assert!(delta.added.is_disjoint(&delta.removed));
        assert_invariants(s.grid());
        assert_bound(&s);
    }
    assert_eq!(s.cycle_count(), 12);
}

#[test]
fn test_parallel_controller_matches_single_threaded() {
    let mut single = sim_with(14, 1);
    let mut parallel = sim_with(14, 4);
    for c in soup(42, 1, 13, 0.30) {
        single.request_add_cell(c);
        parallel.request_add_cell(c);
    }

    for _ in 0..8 {
        let a = single.step().clone();
        let b = parallel.step().clone();
        assert_eq!(a, b);
        assert_eq!(sorted_live(&single), sorted_live(&parallel));
    }
    assert_eq!(single.stats(), parallel.stats());
}

#[test]
fn test_still_life_keeps_its_instances() {
    let mut s = sim_with(8, 1);
    let cube: Vec<Coord> = (0..8)
        .map(|i| Coord::new(3 + (i & 1), 3 + ((i >> 1) & 1), 3 + ((i >> 2) & 1)))
        .collect();
    for &c in &cube {
        s.request_add_cell(c);
    }
    let ids: Vec<_> = cube.iter().map(|&c| s.instance_id(c).unwrap()).collect();
    let total = s.pool().total();

    s.set_speed(8.0).unwrap();
    s.start();
    let deltas = s.tick(Duration::from_secs(1));

    assert_eq!(deltas.len(), 8);
    assert!(deltas.iter().all(|d| d.is_empty()));
    assert_eq!(s.cycle_count(), 8);
    for (c, id) in cube.iter().zip(ids) {
        assert_eq!(s.instance_id(*c), Some(id));
        assert_eq!(s.instance(*c).unwrap().placements, 1);
    }
    assert_eq!(s.pool().total(), total);
}

#[test]
fn test_isolated_cell_dies_and_returns_instance() {
    let mut s = Simulation::<CellMarker>::new(LifeConfig {
        grid_size: 6,
        prewarm: false,
        ..LifeConfig::default()
    })
    .unwrap();
    let c = Coord::new(2, 2, 2);
    s.request_add_cell(c);
    let id = s.instance_id(c).unwrap();

    let delta = s.step().clone();

    assert!(delta.removed.contains(&c));
    assert!(delta.added.is_empty());
    assert!(!s.pool().is_active(id));
    assert_eq!(s.stats().frontier_cells, 0);

    // Without prewarm the released instance is the only inactive one,
    // so it is reused under a fresh id
    s.request_add_cell(Coord::new(0, 0, 0));
    let reused = s.instance_id(Coord::new(0, 0, 0)).unwrap();
    assert_eq!(reused.index(), id.index());
    assert_ne!(reused, id);
    assert_eq!(s.pool().total(), 1);
}

#[test]
fn test_ffi_session() {
    let json = CString::new(
        r#"{
            "grid_size": 10,
            "steps_per_second": 4.0,
            "worker_threads": 2,
            "rule": { "survival": { "min": 5, "max": 7 }, "birth": { "min": 6, "max": 6 } }
        }"#,
    )
    .unwrap();

    unsafe {
        let sim = vl_create_from_json(json.as_ptr());
        assert!(!sim.is_null());

        for (x, y, z) in [(6, 5, 5), (4, 5, 5), (5, 6, 5), (5, 4, 5), (5, 5, 6), (5, 5, 4)] {
            assert_eq!(vl_add_cell(sim, x, y, z), 1);
        }
        assert_eq!(vl_live_count(sim), 6);

        vl_start(sim);
        assert_eq!(vl_tick(sim, 250_000), 1);

        let mut added = [0i32; 3];
        assert_eq!(vl_copy_added(sim, added.as_mut_ptr(), 1), 1);
        assert_eq!(added, [5, 5, 5]);
        assert_eq!(vl_live_count(sim), 1);

        let mut live = [0i32; 3];
        assert_eq!(vl_copy_live_cells(sim, live.as_mut_ptr(), 1), 1);
        assert_eq!(live, [5, 5, 5]);

        // A lone cell dies on the next step
        assert_eq!(vl_step(sim), 1);
        assert_eq!(vl_live_count(sim), 0);
        assert_eq!(vl_cycle_count(sim), 2);

        assert_eq!(vl_resize(sim, 20), 0);
        assert_eq!(vl_add_cell(sim, 19, 19, 19), 1);
        vl_reset(sim);
        assert_eq!(vl_live_count(sim), 0);
        assert_eq!(vl_cycle_count(sim), 0);
        assert_eq!((*sim).pool().active_count(), 0);

        vl_destroy(sim);
    }
}

#[test]
fn test_region_round_trip_between_simulations() {
    let mut source = sim_with(10, 1);
    for c in soup(3, 0, 10, 0.20) {
        source.request_add_cell(c);
    }

    let mut buffer = vec![0u8; 1000];
    assert_eq!(
        source.extract_region(&mut buffer, Coord::new(0, 0, 0), Coord::new(10, 10, 10)),
        1000
    );

    let mut target: Simulation<CellMarker> = sim_with(10, 1);
    assert_eq!(
        target.import_region(&buffer, Coord::new(0, 0, 0), Coord::new(10, 10, 10)),
        1000
    );

    assert_eq!(sorted_live(&source), sorted_live(&target));
    assert_bound(&target);

    source.step();
    target.step();
    assert_eq!(sorted_live(&source), sorted_live(&target));
}
