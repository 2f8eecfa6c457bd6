use std::time::Duration;

use rand::Rng;

use crate::config::ScreenshotConfig;

/// Draws the capture instants for one block, as offsets from the block start.
///
/// Candidates closer than `min_spacing_secs` to an accepted offset are redrawn
/// up to `max_retries` times; after that the violating candidate nearest to
/// satisfying the spacing, the one with the widest gap, is taken.
pub fn plan_block_offsets<R: Rng + ?Sized>(rng: &mut R, config: &ScreenshotConfig) -> Vec<Duration> {
    let block_ms = config.block().as_millis().max(1) as u64;
    let spacing_ms = config.min_spacing_secs.saturating_mul(1000);
    let mut accepted: Vec<u64> = Vec::with_capacity(config.shots_per_block);

    for _ in 0..config.shots_per_block {
        let mut best: Option<(u64, u64)> = None;

        for _ in 0..=config.max_retries {
            let candidate = rng.gen_range(0..block_ms);
            let gap = nearest_gap(&accepted, candidate);
            if gap >= spacing_ms {
                best = Some((candidate, gap));
                break;
            }
            if best.map_or(true, |(_, best_gap)| gap > best_gap) {
                best = Some((candidate, gap));
            }
        }

        if let Some((offset, _)) = best {
            accepted.push(offset);
        }
    }

    accepted.sort_unstable();
    accepted.into_iter().map(Duration::from_millis).collect()
}

fn nearest_gap(accepted: &[u64], candidate: u64) -> u64 {
    accepted
        .iter()
        .map(|offset| offset.abs_diff(candidate))
        .min()
        .unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    NotCapturing,
    TooIdle { active_secs: u64, idle_secs: u64 },
    Capture { active_secs: u64, idle_secs: u64 },
}

/// Fire-time decision: capture only when the preceding window was mostly active.
pub fn evaluate(is_capturing: bool, idle_this_cycle: u64, config: &ScreenshotConfig) -> Evaluation {
    if !is_capturing {
        return Evaluation::NotCapturing;
    }
    let window = config.evaluation_window_secs;
    let idle_secs = idle_this_cycle.min(window);
    let active_secs = window - idle_secs;

    if active_secs >= config.min_active_secs {
        Evaluation::Capture {
            active_secs,
            idle_secs,
        }
    } else {
        Evaluation::TooIdle {
            active_secs,
            idle_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn offsets_fall_inside_block_with_spacing() {
        let config = ScreenshotConfig::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let offsets = plan_block_offsets(&mut rng, &config);

            assert_eq!(offsets.len(), 5);
            assert!(offsets.iter().all(|offset| *offset < Duration::from_secs(600)));
            for pair in offsets.windows(2) {
                assert!(pair[1] - pair[0] >= Duration::from_secs(30), "seed {seed}: {pair:?}");
            }
        }
    }

    #[test]
    fn crowded_block_still_yields_every_shot() {
        let config = ScreenshotConfig {
            block_secs: 60,
            shots_per_block: 5,
            min_spacing_secs: 30,
            ..ScreenshotConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let offsets = plan_block_offsets(&mut rng, &config);
        assert_eq!(offsets.len(), 5);
        assert!(offsets.iter().all(|offset| *offset < Duration::from_secs(60)));
    }

    #[test]
    fn exhausted_retries_take_the_widest_gap_drawn() {
        let config = ScreenshotConfig {
            block_secs: 60,
            shots_per_block: 2,
            min_spacing_secs: 120,
            max_retries: 5,
            ..ScreenshotConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let mut replay = rng.clone();
        let offsets = plan_block_offsets(&mut rng, &config);

        let first = replay.gen_range(0..60_000u64);
        let mut widest = replay.gen_range(0..60_000u64);
        for _ in 0..config.max_retries {
            let candidate = replay.gen_range(0..60_000u64);
            if candidate.abs_diff(first) > widest.abs_diff(first) {
                widest = candidate;
            }
        }
        let mut expected = vec![first, widest];
        expected.sort_unstable();
        let expected: Vec<Duration> = expected.into_iter().map(Duration::from_millis).collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn mostly_idle_window_skips_capture() {
        let config = ScreenshotConfig::default();
        assert_eq!(
            evaluate(true, 20, &config),
            Evaluation::TooIdle {
                active_secs: 10,
                idle_secs: 20
            }
        );
    }

    #[test]
    fn half_active_window_captures() {
        let config = ScreenshotConfig::default();
        assert_eq!(
            evaluate(true, 15, &config),
            Evaluation::Capture {
                active_secs: 15,
                idle_secs: 15
            }
        );
        assert_eq!(evaluate(false, 0, &config), Evaluation::NotCapturing);
    }

    #[test]
    fn idle_beyond_window_is_clamped() {
        let config = ScreenshotConfig::default();
        assert_eq!(
            evaluate(true, 95, &config),
            Evaluation::TooIdle {
                active_secs: 0,
                idle_secs: 30
            }
        );
    }
}
