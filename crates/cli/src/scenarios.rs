//! Canned multi-drone flight scenarios for manual demonstration, in the
//! shape of the reference deployment's flight-path scenarios but expressed
//! in the engine's own Cartesian coordinates instead of geodetic ones.

/// One drone's straight-line flight within a [`Scenario`].
pub struct ScenarioDrone {
    pub drone_id: String,
    pub start: [f64; 3],
    pub end: [f64; 3],
}

/// A named scenario: a handful of drones and the straight-line paths they
/// fly.
pub struct Scenario {
    pub name: &'static str,
    pub drones: Vec<ScenarioDrone>,
}

/// Two drones on a head-on collision course through the origin (§8
/// scenario 2).
pub fn head_on() -> Scenario {
    Scenario {
        name: "head-on",
        drones: vec![
            ScenarioDrone {
                drone_id: "demo-alpha".into(),
                start: [-50.0, 0.0, 10.0],
                end: [50.0, 0.0, 10.0],
            },
            ScenarioDrone {
                drone_id: "demo-beta".into(),
                start: [50.0, 0.0, 10.0],
                end: [-50.0, 0.0, 10.0],
            },
        ],
    }
}

/// Two drones flying parallel tracks with enough lateral separation that
/// neither ever enters the other's safety buffer.
pub fn parallel() -> Scenario {
    Scenario {
        name: "parallel",
        drones: vec![
            ScenarioDrone {
                drone_id: "demo-alpha".into(),
                start: [-50.0, 0.0, 10.0],
                end: [50.0, 0.0, 10.0],
            },
            ScenarioDrone {
                drone_id: "demo-beta".into(),
                start: [-50.0, 30.0, 10.0],
                end: [50.0, 30.0, 10.0],
            },
        ],
    }
}

/// Four drones converging on the origin from the cardinal directions.
pub fn converging() -> Scenario {
    let offset = 60.0;
    let legs = [
        ("demo-north", [0.0, offset, 10.0]),
        ("demo-south", [0.0, -offset, 10.0]),
        ("demo-east", [offset, 0.0, 10.0]),
        ("demo-west", [-offset, 0.0, 10.0]),
    ];
    Scenario {
        name: "converging",
        drones: legs
            .into_iter()
            .map(|(id, start)| ScenarioDrone {
                drone_id: id.into(),
                start,
                end: [0.0, 0.0, 10.0],
            })
            .collect(),
    }
}

/// Look up a scenario by name, as passed on the command line.
pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        "head-on" => Some(head_on()),
        "parallel" => Some(parallel()),
        "converging" => Some(converging()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_on_scenario_has_two_drones_on_opposing_legs() {
        let scenario = head_on();
        assert_eq!(scenario.drones.len(), 2);
        assert_eq!(scenario.drones[0].start, scenario.drones[1].end);
    }

    #[test]
    fn converging_scenario_has_four_drones_meeting_at_the_origin() {
        let scenario = converging();
        assert_eq!(scenario.drones.len(), 4);
        assert!(scenario.drones.iter().all(|d| d.end == [0.0, 0.0, 10.0]));
    }

    #[test]
    fn by_name_rejects_unknown_scenarios() {
        assert!(by_name("nonexistent").is_none());
    }
}
