/// Heights at one position of a slice, as seen by the grounding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionProfile {
    /// Lowest block at the position.
    pub lowest: Option<i32>,
    /// Height of the highest block, and whether it is water.
    pub top: Option<(i32, bool)>,
}

impl PositionProfile {
    fn top_is_water(&self) -> bool {
        matches!(self.top, Some((_, true)))
    }
}

/// Vertical offset to apply to each position so staircases rest on the ground.
///
/// The lowest position of a range and every position reachable from it by climbing
/// (never stepping down) form a span that is pushed down to height 0. Whatever is left
/// on either side is handled the same way on its own.
pub fn ground_shifts(profile: &[PositionProfile]) -> Vec<i32> {
    let mut shifts = vec![0; profile.len()];
    ground_range(profile, &mut shifts);
    shifts
}

fn ground_range(profile: &[PositionProfile], shifts: &mut [i32]) {
    let Some((lowest_z, lowest)) = profile
        .iter()
        .enumerate()
        .filter_map(|(z, p)| p.lowest.map(|h| (z, h)))
        .min_by_key(|&(_, h)| h)
    else {
        return;
    };

    let mut running = lowest;
    let mut end = lowest_z + 1;
    for (z, position) in profile.iter().enumerate().skip(lowest_z + 1) {
        match position.top {
            Some((height, false)) if height >= running => {
                running = height;
                end = z + 1;
            }
            _ => break,
        }
    }

    // Going north the water test looks at the position just left behind, so a water
    // column can still end a span on this side.
    running = lowest;
    let mut start = lowest_z;
    for z in (0..lowest_z).rev() {
        if profile[z + 1].top_is_water() {
            break;
        }
        match profile[z].top {
            Some((height, _)) if height >= running => {
                running = height;
                start = z;
            }
            _ => break,
        }
    }

    for shift in &mut shifts[start..end] {
        *shift -= lowest;
    }

    let (north, rest) = shifts.split_at_mut(start);
    let south = &mut rest[end - start..];
    ground_range(&profile[..start], north);
    ground_range(&profile[end..], south);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land(height: i32) -> PositionProfile {
        PositionProfile {
            lowest: Some(height),
            top: Some((height, false)),
        }
    }

    fn water(lowest: i32, top: i32) -> PositionProfile {
        PositionProfile {
            lowest: Some(lowest),
            top: Some((top, true)),
        }
    }

    fn heights(profile: &[PositionProfile], shifts: &[i32]) -> Vec<i32> {
        profile
            .iter()
            .zip(shifts)
            .map(|(p, s)| p.lowest.unwrap_or_default() + s)
            .collect()
    }

    #[test]
    fn test_empty_profile() {
        assert!(ground_shifts(&[]).is_empty());
        assert_eq!(ground_shifts(&[PositionProfile::default(); 3]), vec![0, 0, 0]);
    }

    #[test]
    fn test_single_slope_drops_to_zero() {
        let profile: Vec<_> = [5, 4, 3, 4, 6].into_iter().map(land).collect();
        let shifts = ground_shifts(&profile);
        assert_eq!(heights(&profile, &shifts), vec![2, 1, 0, 1, 3]);
    }

    #[test]
    fn test_each_valley_reaches_zero() {
        let profile: Vec<_> = [0, 1, 2, 1, 2, 3, 7, 5, 6].into_iter().map(land).collect();
        let shifts = ground_shifts(&profile);
        assert_eq!(heights(&profile, &shifts), vec![0, 1, 2, 0, 1, 2, 6, 0, 1]);
    }

    #[test]
    fn test_descent_ends_span() {
        let profile: Vec<_> = [3, 4, 2, 5].into_iter().map(land).collect();
        let shifts = ground_shifts(&profile);
        // lowest is position 2; north climbs 4 but stops at the drop to 3
        assert_eq!(shifts, vec![-3, -2, -2, -2]);
    }

    #[test]
    fn test_water_stops_southward_span() {
        let profile = vec![land(2), land(3), water(2, 4), land(5)];
        let shifts = ground_shifts(&profile);
        assert_eq!(shifts, vec![-2, -2, -2, -2]);
        // the first span is only the two land positions
        let first = ground_shifts(&profile[..3]);
        assert_eq!(first, vec![-2, -2, -2]);
        let land_only = ground_shifts(&[land(2), land(3), water(9, 9), land(9)]);
        assert_eq!(land_only, vec![-2, -2, -9, -9]);
    }

    #[test]
    fn test_water_included_north_but_not_beyond() {
        let profile = vec![land(6), water(5, 5), land(1)];
        let shifts = ground_shifts(&profile);
        assert_eq!(shifts, vec![-6, -1, -1]);
    }
}
