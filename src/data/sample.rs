//! Synthetic patch-clamp-style recordings.
//!
//! Builds a small forest shaped like the real exports this engine consumes:
//! a recording root owning the `time` and `sweep` coordinates, child nodes
//! per condition with current/voltage variables, and a handful of
//! timestamped events. Deterministic for a given config (seeded RNG), so
//! tests can assert on derived values.

use ndarray::{ArrayD, IxDyn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::Event;
use crate::events::EventOverlay;
use crate::forest::{Coord, Forest, NodeId, Variable};

/// Shape and signal parameters of the generated recording.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Samples per sweep.
    pub n_time: usize,
    /// Sample interval in seconds.
    pub dt: f64,
    pub n_sweeps: usize,
    /// Peak amplitude of the evoked current (pA).
    pub amp_pa: f64,
    /// Decay constant of the evoked current (s).
    pub tau_s: f64,
    /// Holding current (pA).
    pub baseline_pa: f64,
    /// Gaussian noise sigma on the current (pA).
    pub noise_pa: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            n_time: 100,
            dt: 0.01,
            n_sweeps: 3,
            amp_pa: 200.0,
            tau_s: 0.1,
            baseline_pa: -20.0,
            noise_pa: 1.0,
            seed: 42,
        }
    }
}

/// A generated recording: the forest, its event overlay, and the handles a
/// caller usually wants next.
#[derive(Debug, Clone)]
pub struct SampleRecording {
    pub forest: Forest,
    pub overlay: EventOverlay,
    pub root: NodeId,
    pub baseline: NodeId,
    pub stim: NodeId,
}

/// Generate the recording described by `config`.
///
/// # Panics
/// Panics on a degenerate config (zero sizes, non-positive `dt`/`tau_s`).
/// The generator feeds demos and tests; a nonsense shape is a programming
/// error, not a data error.
pub fn generate_recording(config: &SampleConfig) -> SampleRecording {
    assert!(config.n_time > 0, "n_time must be > 0");
    assert!(config.n_sweeps > 0, "n_sweeps must be > 0");
    assert!(config.dt > 0.0 && config.dt.is_finite(), "dt must be > 0");
    assert!(
        config.tau_s > 0.0 && config.tau_s.is_finite(),
        "tau_s must be > 0"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_pa.max(f64::MIN_POSITIVE))
        .expect("sigma validated above");

    let time: Vec<f64> = (0..config.n_time).map(|i| i as f64 * config.dt).collect();

    let mut forest = Forest::new();
    let root = forest.add_root("recording");
    {
        let node = forest.node_mut(root).unwrap();
        node.set_coord("time", Coord::new(time.clone(), "s"));
        node.set_coord(
            "sweep",
            Coord::new((0..config.n_sweeps).map(|s| s as f64).collect(), ""),
        );
        node.set_attr("source", "synthetic");
        node.set_attr("amplifier", "model cell");
    }

    let shape = IxDyn(&[config.n_time, config.n_sweeps]);

    // Baseline condition: holding current only.
    let baseline = forest.add_child(root, "baseline");
    {
        let mut im = Vec::with_capacity(config.n_time * config.n_sweeps);
        let mut vm = Vec::with_capacity(config.n_time * config.n_sweeps);
        for _ in 0..config.n_time {
            for _ in 0..config.n_sweeps {
                im.push(config.baseline_pa + noise.sample(&mut rng));
                vm.push(-65.0 + 0.1 * noise.sample(&mut rng));
            }
        }
        let node = forest.node_mut(baseline).unwrap();
        node.set_variable(
            "Im",
            Variable::new(
                ArrayD::from_shape_vec(shape.clone(), im).expect("shape matches"),
                vec!["time".into(), "sweep".into()],
                "pA",
            ),
        );
        node.set_variable(
            "Vm",
            Variable::new(
                ArrayD::from_shape_vec(shape.clone(), vm).expect("shape matches"),
                vec!["time".into(), "sweep".into()],
                "mV",
            ),
        );
    }

    // Stimulated condition: an exponentially decaying evoked current, with a
    // small per-sweep rundown so sweeps are distinguishable.
    let stim = forest.add_child(root, "stim");
    {
        let mut im = Vec::with_capacity(config.n_time * config.n_sweeps);
        for &t in &time {
            for s in 0..config.n_sweeps {
                let amp = config.amp_pa * (1.0 - 0.05 * s as f64);
                let evoked = amp * (-t / config.tau_s).exp();
                im.push(config.baseline_pa + evoked + noise.sample(&mut rng));
            }
        }
        let node = forest.node_mut(stim).unwrap();
        node.set_variable(
            "Im",
            Variable::new(
                ArrayD::from_shape_vec(shape, im).expect("shape matches"),
                vec!["time".into(), "sweep".into()],
                "pA",
            ),
        );
    }

    let mut overlay = EventOverlay::new();
    let t_end = (config.n_time - 1) as f64 * config.dt;
    overlay.add_event(root, Event::new(0.0, "recording start"));
    overlay.add_event(stim, Event::new(0.0, "stim on"));
    overlay.add_event(stim, Event::new((3.0 * config.tau_s).min(t_end), "stim off"));

    SampleRecording {
        forest,
        overlay,
        root,
        baseline,
        stim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SliceSelection, Visibility};
    use crate::fit::fit;
    use crate::index::{build_index, lookup};
    use crate::models::ModelRegistry;
    use crate::slice::extract;

    #[test]
    fn generated_forest_indexes_cleanly() {
        let rec = generate_recording(&SampleConfig::default());
        let vis = Visibility {
            show_data_vars: true,
            show_own_coords: true,
            show_inherited_coords: true,
        };
        let entries = build_index(&rec.forest, &vis).unwrap();
        assert_eq!(entries.len(), 3);

        let stim = lookup(&entries, "/recording/stim").unwrap();
        assert_eq!(stim.data_vars, vec!["Im"]);
        assert!(stim.own_coords.is_empty());
        assert_eq!(stim.inherited_coords, vec!["time", "sweep"]);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_recording(&SampleConfig::default());
        let b = generate_recording(&SampleConfig::default());
        let sel = SliceSelection::new("/recording/stim", "Im", "time").fix("sweep", 0);
        let sa = extract(&a.forest, &sel).unwrap();
        let sb = extract(&b.forest, &sel).unwrap();
        assert_eq!(sa.y, sb.y);
    }

    #[test]
    fn stim_slice_carries_inherited_time_axis() {
        let config = SampleConfig::default();
        let rec = generate_recording(&config);
        let sel = SliceSelection::new("/recording/stim", "Im", "time").fix("sweep", 1);
        let slice = extract(&rec.forest, &sel).unwrap();
        assert_eq!(slice.len(), config.n_time);
        assert_eq!(slice.x_units, "s");
        assert_eq!(slice.y_units, "pA");
    }

    #[test]
    fn events_land_on_their_nodes() {
        let rec = generate_recording(&SampleConfig::default());
        let on_stim = rec.overlay.events_in_range(rec.stim, 0.0, 10.0);
        let texts: Vec<&str> = on_stim.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["stim on", "stim off"]);
        assert!(rec
            .overlay
            .events_in_range(rec.baseline, 0.0, 10.0)
            .is_empty());
    }

    /// End-to-end: select -> extract -> fit recovers the generator's signal.
    #[test]
    fn pipeline_recovers_generator_parameters() {
        let config = SampleConfig {
            n_time: 200,
            noise_pa: 0.5,
            ..SampleConfig::default()
        };
        let rec = generate_recording(&config);

        let sel = SliceSelection::new("/recording/stim", "Im", "time").fix("sweep", 0);
        let slice = extract(&rec.forest, &sel).unwrap();

        let registry = ModelRegistry::builtin();
        let mut spec = registry.default_spec("exponential").unwrap();
        spec.params[0].init = 100.0;
        spec.params[1].init = 0.05;
        spec.params[2].init = -10.0;
        let result = fit(&slice, &spec, &registry).unwrap();

        assert!(result.converged);
        let a = result.param("a").unwrap().value;
        let b = result.param("b").unwrap().value;
        let c = result.param("c").unwrap().value;
        assert!((a - config.amp_pa).abs() / config.amp_pa < 0.1, "a = {a}");
        assert!((b - config.tau_s).abs() / config.tau_s < 0.1, "b = {b}");
        assert!((c - config.baseline_pa).abs() < 2.0, "c = {c}");
    }
}
