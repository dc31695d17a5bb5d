use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;
use std::thread::*;
use std::time::Duration;

use crossbeam_channel as cbc;
use rand::Rng;
use serde_json::json;

use elevator::building::building::Building;
use elevator::occupant::actor::OccupantHandle;
use elevator::occupant::occupant::{OccupantEvent, State};
use elevator::request::Direction;
use elevator::util::config::SimulationConfig;

fn print_line(source: &str, event: serde_json::Value) {
    let line = json!({
        "time": chrono::Local::now().to_rfc3339(),
        "source": source,
        "event": event,
    });
    println!("{}", line);
}

/// Any floor but `current`.
fn random_floor<R: Rng>(rng: &mut R, current: u8, floor_count: u8) -> u8 {
    let floor = rng.gen_range(1, floor_count);
    if floor >= current {
        floor + 1
    } else {
        floor
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Config file is the only, optional, argument
    let config_path = env::args().nth(1).map(PathBuf::from);
    let config = match SimulationConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };
    let building = match Building::new(config.building_config()) {
        Ok(building) => building,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };
    let floor_count = building.floor_count();

    let elevator_events_rx = match building.subscribe_elevator_events() {
        Ok(rx) => rx,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    // Every occupant's events end up on one channel
    let (occupant_events_tx, occupant_events_rx) = cbc::unbounded::<OccupantEvent>();
    let mut rng = rand::thread_rng();
    let mut occupants: HashMap<usize, OccupantHandle> = HashMap::new();
    let mut destinations: HashMap<usize, u8> = HashMap::new();
    for _ in 0..config.occupants {
        let weight = if config.min_occupant_weight < config.max_occupant_weight {
            rng.gen_range(config.min_occupant_weight, config.max_occupant_weight)
        } else {
            config.min_occupant_weight
        };
        let (handle, events_rx) = match building.add_occupant(weight) {
            Ok(session) => session,
            Err(e) => {
                log::error!("{}", e);
                continue;
            }
        };
        {
            let occupant_events_tx = occupant_events_tx.clone();
            spawn(move || {
                for event in events_rx.iter() {
                    if occupant_events_tx.send(event).is_err() {
                        break;
                    }
                }
            });
        }
        let destination = random_floor(&mut rng, 1, floor_count);
        match handle.request_elevator(Direction::Up) {
            Ok(elevator_id) => log::info!(
                "occupant {} ({:.0} lbs) heading for floor {}, elevator {} assigned",
                handle.id(),
                weight,
                destination,
                elevator_id
            ),
            Err(e) => log::warn!("occupant {}: {}", handle.id(), e),
        }
        destinations.insert(handle.id(), destination);
        occupants.insert(handle.id(), handle);
    }
    drop(occupant_events_tx);

    let deadline = cbc::after(Duration::from_secs(config.deadline_secs));
    let mut trips = 0;
    while trips < config.trips {
        cbc::select! {
            recv(elevator_events_rx) -> a => {
                match a {
                    Ok(event) => print_line("elevator", json!(event)),
                    Err(_) => break,
                }
            },
            recv(occupant_events_rx) -> a => {
                let event = match a {
                    Ok(event) => event,
                    Err(_) => break,
                };
                print_line("occupant", json!(event));
                if let OccupantEvent::StateChanged { occupant_id, previous, current } = event {
                    let handle = match occupants.get(&occupant_id) {
                        Some(handle) => handle,
                        None => continue,
                    };
                    match (previous, current) {
                        (_, State::Riding) => {
                            let destination = destinations.get(&occupant_id).copied().unwrap_or(1);
                            if let Err(e) = handle.request_floor(destination) {
                                log::warn!("occupant {}: {}", occupant_id, e);
                            }
                        }
                        (State::Riding, State::None) => {
                            trips += 1;
                            let here = match handle.info() {
                                Ok(info) => info.current_floor,
                                Err(e) => {
                                    log::warn!("occupant {}: {}", occupant_id, e);
                                    continue;
                                }
                            };
                            let destination = random_floor(&mut rng, here, floor_count);
                            destinations.insert(occupant_id, destination);
                            if let Err(e) = handle.request_elevator(Direction::between(here, destination)) {
                                log::warn!("occupant {}: {}", occupant_id, e);
                            }
                        }
                        _ => {}
                    }
                }
            },
            recv(deadline) -> _ => {
                log::warn!("deadline reached after {} trips", trips);
                break;
            }
        }
    }

    log::info!("{} trips done, shutting down", trips);
    drop(building);
}
