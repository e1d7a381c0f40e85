// Procedural animated background
// Three looping sine-wave ribbons plus a static field of random points

use std::f32::consts::TAU;
use std::time::Duration;

use rand::Rng;

/// One sine-wave ribbon band.
///
/// The band is a horizontal strip whose upper and lower boundaries follow
/// the same sine curve, half a thickness apart. Its phase loops linearly
/// over `period` with no start/stop control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveLayer {
    /// Seconds for the phase to sweep a full 2π
    pub period: f32,
    /// Peak vertical displacement in pixels
    pub amplitude: f32,
    /// Horizontal length of one full cycle in pixels
    pub wavelength: f32,
    /// Vertical extent of the band in pixels
    pub thickness: f32,
    /// Offset of the band midline from the canvas center, in pixels
    pub offset: f32,
    /// Band color, non-premultiplied RGBA
    pub color: [u8; 4],
}

/// The three ribbons of the backdrop. Fixed for every view instance.
pub const WAVE_LAYERS: [WaveLayer; 3] = [
    WaveLayer {
        period: 20.0,
        amplitude: 8.0,
        wavelength: 200.0,
        thickness: 40.0,
        offset: 0.0,
        color: [77, 102, 153, 38],
    },
    WaveLayer {
        period: 15.0,
        amplitude: 12.0,
        wavelength: 300.0,
        thickness: 35.0,
        offset: 100.0,
        color: [51, 77, 128, 31],
    },
    WaveLayer {
        period: 25.0,
        amplitude: 10.0,
        wavelength: 250.0,
        thickness: 30.0,
        offset: -100.0,
        color: [77, 102, 153, 26],
    },
];

impl WaveLayer {
    /// Phase at `elapsed`, looping over the period; always in [0, 2π)
    pub fn phase_at(&self, elapsed: Duration) -> f32 {
        (elapsed.as_secs_f32() / self.period).fract() * TAU
    }

    /// Midline of the band on a canvas of the given height
    pub fn midline(&self, canvas_height: f32) -> f32 {
        canvas_height / 2.0 + self.offset
    }

    /// Center curve of the band at horizontal position `x`
    pub fn center_y(&self, x: f32, phase: f32, canvas_height: f32) -> f32 {
        (x / self.wavelength * TAU + phase).sin() * self.amplitude + self.midline(canvas_height)
    }

    /// Upper boundary curve of the band
    pub fn top_y(&self, x: f32, phase: f32, canvas_height: f32) -> f32 {
        self.center_y(x, phase, canvas_height) - self.thickness / 2.0
    }

    /// Lower boundary curve of the band
    pub fn bottom_y(&self, x: f32, phase: f32, canvas_height: f32) -> f32 {
        self.center_y(x, phase, canvas_height) + self.thickness / 2.0
    }
}

/// One decorative point. Position is in unit coordinates so the field
/// survives window resizes without re-randomizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    /// Radius in pixels
    pub radius: f32,
    /// Opacity in 0..1
    pub opacity: f32,
}

/// The animated backdrop: fixed wave parameters plus a point field that is
/// randomized once per view instance, never per frame.
pub struct Background {
    pub layers: [WaveLayer; 3],
    pub points: Vec<Point>,
}

impl Background {
    pub fn new(point_count: usize, rng: &mut impl Rng) -> Self {
        let points = (0..point_count)
            .map(|_| Point {
                x: rng.gen_range(0.0..1.0),
                y: rng.gen_range(0.0..1.0),
                radius: rng.gen_range(1.0..2.0),
                opacity: rng.gen_range(0.05..0.15),
            })
            .collect();
        Self {
            layers: WAVE_LAYERS,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn boundaries_are_periodic_in_phase() {
        let layer = WAVE_LAYERS[0];
        for step in 0..200 {
            let x = step as f32 * 7.3;
            let phase = 1.234;
            let top = layer.top_y(x, phase, 600.0);
            let wrapped = layer.top_y(x, phase + TAU, 600.0);
            assert!(
                (top - wrapped).abs() < 1e-2,
                "top boundary not periodic at x={}: {} vs {}",
                x,
                top,
                wrapped
            );
            let bottom = layer.bottom_y(x, phase, 600.0);
            let wrapped = layer.bottom_y(x, phase + TAU, 600.0);
            assert!((bottom - wrapped).abs() < 1e-2);
        }
    }

    #[test]
    fn band_is_exactly_one_thickness_tall() {
        for layer in WAVE_LAYERS {
            let d = layer.bottom_y(123.0, 0.5, 600.0) - layer.top_y(123.0, 0.5, 600.0);
            assert!((d - layer.thickness).abs() < 1e-4);
        }
    }

    #[test]
    fn phase_loops_over_the_period() {
        for layer in WAVE_LAYERS {
            let t = Duration::from_secs_f32(layer.period * 0.25);
            let next_lap = t + Duration::from_secs_f32(layer.period);
            assert!((layer.phase_at(t) - layer.phase_at(next_lap)).abs() < 1e-2);
            for secs in [0.0, 3.7, 14.99, 100.0] {
                let phase = layer.phase_at(Duration::from_secs_f32(secs));
                assert!((0.0..TAU).contains(&phase), "phase {} out of range", phase);
            }
        }
    }

    #[test]
    fn restart_keeps_waves_but_rerolls_points() {
        let mut rng = StdRng::seed_from_u64(7);
        let first = Background::new(40, &mut rng);
        let second = Background::new(40, &mut rng);

        assert_eq!(first.layers, second.layers);
        assert_eq!(first.points.len(), second.points.len());
        assert_ne!(first.points, second.points);
    }

    #[test]
    fn points_stay_in_their_ranges() {
        let mut rng = StdRng::seed_from_u64(42);
        let bg = Background::new(200, &mut rng);
        assert_eq!(bg.points.len(), 200);
        for p in &bg.points {
            assert!((0.0..1.0).contains(&p.x));
            assert!((0.0..1.0).contains(&p.y));
            assert!((1.0..2.0).contains(&p.radius));
            assert!((0.05..0.15).contains(&p.opacity));
        }
    }
}
