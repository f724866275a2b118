//! Headless loopback demo.
//!
//! Runs an authoritative server and a predicting client in one process,
//! connected by an in-memory link with fixed latency and periodic packet
//! loss. A scripted player walks, sprints, jumps and crouches through a
//! low-gravity region while the client reconciles against the server's
//! snapshots.
//!
//! `RUST_LOG=debug` shows every replay, `RUST_LOG=trace` every prediction.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glam::{Vec2, Vec3};
use vantage_game::{
    FrameInput, InputSampler, LandingTracker, ReconcileOutcome, Simulation, SimulationConfig, TickClock,
    TickListener, Volume, VolumeKind,
};
use vantage_physics::{CharacterMotor, PlaneWorld, Tick};
use vantage_protocol::{decode, encode, Delivery, NetMessage};

const PLAYER: u32 = 1;
const FRAME_RATE: u32 = 120;
const DEMO_SECONDS: u32 = 12;
const LATENCY_TICKS: Tick = 3;
const DROP_EVERY: u64 = 9;

/// One direction of the in-memory link.
#[derive(Default)]
struct Link {
    in_flight: VecDeque<(Tick, Vec<u8>)>,
    sent: u64,
    dropped: u64,
}

impl Link {
    fn send(&mut self, now: Tick, message: &NetMessage) {
        self.sent += 1;
        if self.sent % DROP_EVERY == 0 {
            self.dropped += 1;
            return;
        }
        match encode(message) {
            Ok(bytes) => self.in_flight.push_back((now + LATENCY_TICKS, bytes)),
            Err(err) => log::error!("failed to encode message: {}", err),
        }
    }

    fn receive(&mut self, now: Tick) -> Vec<NetMessage> {
        let mut delivered = Vec::new();
        while self.in_flight.front().is_some_and(|(at, _)| *at <= now) {
            let Some((_, bytes)) = self.in_flight.pop_front() else {
                break;
            };
            match decode(&bytes) {
                Ok(message) => delivered.push(message),
                Err(err) => log::error!("failed to decode message: {}", err),
            }
        }
        delivered
    }
}

struct ServerPeer {
    simulation: Simulation,
    /// Clock tick the server starts simulating on, so the client leads it.
    start_after: Tick,
    inbound: Arc<Mutex<Link>>,
    outbound: Arc<Mutex<Link>>,
}

impl TickListener for ServerPeer {
    fn on_tick(&mut self, clock_tick: Tick) {
        if clock_tick <= self.start_after {
            return;
        }

        for message in lock(&self.inbound).receive(clock_tick) {
            if let Err(err) = message.deliver(&mut self.simulation) {
                log::warn!("server rejected message: {}", err);
            }
        }

        self.simulation.tick(&[]);

        let mut outbound = lock(&self.outbound);
        for outgoing in self.simulation.drain_outgoing() {
            outbound.send(clock_tick, &NetMessage::from(outgoing));
        }
    }
}

struct ClientPeer {
    simulation: Simulation,
    sampler: InputSampler,
    inbound: Arc<Mutex<Link>>,
    outbound: Arc<Mutex<Link>>,
    corrections: u32,
    replayed_ticks: usize,
}

impl TickListener for ClientPeer {
    fn on_tick(&mut self, clock_tick: Tick) {
        for message in lock(&self.inbound).receive(clock_tick) {
            match message.deliver(&mut self.simulation) {
                Ok(Delivery::Reconciled(ReconcileOutcome::Applied { replayed })) if replayed > 0 => {
                    self.corrections += 1;
                    self.replayed_ticks += replayed;
                }
                Ok(_) => {}
                Err(err) => log::warn!("client rejected message: {}", err),
            }
        }

        let input = self.sampler.sample();
        let report = self.simulation.tick(&[(PLAYER, input)]);
        for failure in &report.failures {
            log::warn!("client tick {} failed: {}", report.tick, failure);
        }

        let mut outbound = lock(&self.outbound);
        for outgoing in self.simulation.drain_outgoing() {
            outbound.send(clock_tick, &NetMessage::from(outgoing));
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scripted player input for a frame.
fn scripted_frame(frame: u32) -> FrameInput {
    let seconds = frame as f32 / FRAME_RATE as f32;
    let mut input = FrameInput {
        vertical: 1.0,
        ..Default::default()
    };

    match seconds {
        s if s < 2.0 => {}
        s if s < 4.0 => {
            input.sprint = true;
            input.look_delta = Vec2::new(0.002, 0.0);
        }
        s if s < 5.0 => input.jump = frame % (FRAME_RATE / 2) == 0,
        s if s < 7.0 => {
            input.crouch = true;
            input.sprint = true;
            input.horizontal = 1.0;
        }
        s if s < 9.0 => input.look_delta = Vec2::new(-0.003, 0.001),
        _ => {
            input.vertical = 0.0;
            input.jump = frame % FRAME_RATE == 0;
        }
    }
    input
}

fn build_world() -> Arc<dyn CharacterMotor> {
    Arc::new(PlaneWorld::flat(0.0))
}

fn low_gravity_region() -> Volume {
    Volume::new(
        Vec3::new(12.0, -1.0, -20.0),
        Vec3::new(20.0, 10.0, 20.0),
        VolumeKind::Gravity(Vec3::new(0.0, -3.0, 0.0)),
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::default();
    let world = build_world();

    let client_to_server = Arc::new(Mutex::new(Link::default()));
    let server_to_client = Arc::new(Mutex::new(Link::default()));

    let mut server = Simulation::server(config.clone());
    server.add_volume(low_gravity_region());
    let server_landings = Arc::new(Mutex::new(LandingTracker::new()));
    server.add_listener(Box::new(server_landings.clone()));

    let mut client = Simulation::client(config.clone());
    client.add_volume(low_gravity_region());
    let client_landings = Arc::new(Mutex::new(LandingTracker::new()));
    client.add_listener(Box::new(client_landings.clone()));

    let spawn = Vec3::new(0.0, 0.5, 0.0);
    if let Err(err) = server
        .spawn_entity(PLAYER, false, world.clone(), spawn)
        .and_then(|_| client.spawn_entity(PLAYER, true, world.clone(), spawn))
    {
        log::error!("failed to spawn player: {}", err);
        return;
    }

    let server = Arc::new(Mutex::new(ServerPeer {
        simulation: server,
        start_after: LATENCY_TICKS + 2,
        inbound: client_to_server.clone(),
        outbound: server_to_client.clone(),
    }));
    let client = Arc::new(Mutex::new(ClientPeer {
        sampler: InputSampler::new(config.look, &config.movement),
        simulation: client,
        inbound: server_to_client.clone(),
        outbound: client_to_server.clone(),
        corrections: 0,
        replayed_ticks: 0,
    }));

    let mut clock = TickClock::new(config.tick_rate);
    clock.subscribe(1, server.clone());
    clock.subscribe(2, client.clone());

    log::info!(
        "running {}s at {} ticks/s, {} ticks latency, dropping every {}th packet",
        DEMO_SECONDS,
        config.tick_rate,
        LATENCY_TICKS,
        DROP_EVERY
    );

    let frame_duration = Duration::from_secs(1) / FRAME_RATE;
    for frame in 0..FRAME_RATE * DEMO_SECONDS {
        lock(&client).sampler.record_frame(&scripted_frame(frame));

        if clock.advance(frame_duration) > 0 && clock.tick() % config.tick_rate == 0 {
            let client = lock(&client);
            if let Some(targets) = client.simulation.render_targets(PLAYER) {
                log::info!(
                    "tick {:>4}: position ({:6.2}, {:5.2}, {:6.2}) {:?} crouch height {:.2} camera yaw {:.2}",
                    clock.tick(),
                    targets.position.x,
                    targets.position.y,
                    targets.position.z,
                    targets.ground_phase,
                    targets.crouch_height,
                    client.sampler.local_look().yaw
                );
            }
        }
    }

    clock.unsubscribe(1);
    clock.unsubscribe(2);

    let server = lock(&server);
    let client = lock(&client);
    let (Some(authoritative), Some(predicted)) =
        (server.simulation.entity(PLAYER), client.simulation.entity(PLAYER))
    else {
        return;
    };

    log::info!(
        "server at tick {}, client at tick {} ({} ticks ahead)",
        server.simulation.current_tick(),
        client.simulation.current_tick(),
        client.simulation.current_tick().saturating_sub(server.simulation.current_tick())
    );
    log::info!(
        "client corrected {} times, replaying {} ticks",
        client.corrections,
        client.replayed_ticks
    );
    let (upstream_sent, upstream_dropped) = {
        let link = lock(&client_to_server);
        (link.sent, link.dropped)
    };
    let (downstream_sent, downstream_dropped) = {
        let link = lock(&server_to_client);
        (link.sent, link.dropped)
    };
    log::info!(
        "packets: client->server {} sent / {} dropped, server->client {} sent / {} dropped",
        upstream_sent,
        upstream_dropped,
        downstream_sent,
        downstream_dropped
    );
    log::info!(
        "final positions: server {:?}, client {:?}",
        authoritative.physical.position,
        predicted.physical.position
    );
    log::info!(
        "landings: {} genuine on server, {} audible on client",
        lock(&server_landings).genuine_landings().len(),
        lock(&client_landings).audible_landings().len()
    );
}
