//! Toy arena: agents slide along a rail under swinging double pendulums.
//!
//! The pendulums follow closed-form periodic motion instead of a physics
//! engine, which is enough to give the networks something to dodge.

use pendulum_evo::neuroevo::population::{AgentIndex, Arena, Step};

const MOVE_SPEED: f64 = 5.0;
const RAIL_HALF_WIDTH: f64 = 8.0;
const HIT_RADIUS: f64 = 0.6;

#[derive(Clone, Copy, Debug)]
pub struct DoublePendulum {
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub link_length: f64,
    pub ball_length: f64,
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
}

/// Position and horizontal velocity of one pendulum mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mass {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
}

impl DoublePendulum {
    /// The lower segment swings at twice the frequency of the upper one.
    pub fn masses(&self, t: f64) -> (Mass, Mass) {
        let w1 = self.frequency;
        let w2 = 2.0 * self.frequency;
        let theta_1 = self.amplitude * (w1 * t + self.phase).sin();
        let theta_2 = self.amplitude * (w2 * t + self.phase).sin();
        let omega_1 = self.amplitude * w1 * (w1 * t + self.phase).cos();
        let omega_2 = self.amplitude * w2 * (w2 * t + self.phase).cos();

        let link = Mass {
            x: self.anchor_x + self.link_length * theta_1.sin(),
            y: self.anchor_y - self.link_length * theta_1.cos(),
            vx: self.link_length * theta_1.cos() * omega_1,
        };
        let ball = Mass {
            x: link.x + self.ball_length * theta_2.sin(),
            y: link.y - self.ball_length * theta_2.cos(),
            vx: link.vx + self.ball_length * theta_2.cos() * omega_2,
        };
        (link, ball)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Rider {
    x: f64,
    clock: f64,
}

pub struct PendulumArena {
    pendulums: Vec<DoublePendulum>,
    riders: Vec<Rider>,
}

impl PendulumArena {
    pub fn new(pendulums: Vec<DoublePendulum>) -> PendulumArena {
        PendulumArena { pendulums, riders: Vec::new() }
    }

    /// Riders spawn at x = 0, clear of both balls, and get swept sooner or
    /// later unless they move.
    pub fn standard() -> PendulumArena {
        PendulumArena::new(vec![
            DoublePendulum {
                anchor_x: -1.5,
                anchor_y: 3.2,
                link_length: 1.5,
                ball_length: 1.5,
                amplitude: 1.0,
                frequency: 1.3,
                phase: 1.0,
            },
            DoublePendulum {
                anchor_x: 2.5,
                anchor_y: 3.2,
                link_length: 1.5,
                ball_length: 1.5,
                amplitude: 1.0,
                frequency: 0.9,
                phase: 2.5,
            },
        ])
    }
}

impl Arena for PendulumArena {
    /// Own position, then link position/velocity and ball position/velocity
    /// of every pendulum.
    fn input_size(&self) -> usize {
        1 + 4 * self.pendulums.len()
    }

    fn reset(&mut self, population_size: usize) {
        self.riders = vec![Rider::default(); population_size];
    }

    fn sense(&self, agent: AgentIndex) -> Vec<f64> {
        let rider = self.riders[agent.0];
        let mut inputs = Vec::with_capacity(self.input_size());
        inputs.push(rider.x / 10.0);
        for pendulum in &self.pendulums {
            let (link, ball) = pendulum.masses(rider.clock);
            inputs.extend([link.x / 10.0, link.vx / 5.0, ball.x / 10.0, ball.vx / 5.0]);
        }
        inputs
    }

    fn act(&mut self, agent: AgentIndex, outputs: &[f64], dt: f64) -> Step {
        let pendulums = &self.pendulums;
        let rider = &mut self.riders[agent.0];
        rider.x += outputs[0] * MOVE_SPEED * dt;
        rider.clock += dt;

        let hit = pendulums.iter().any(|pendulum| {
            let (_, ball) = pendulum.masses(rider.clock);
            (ball.x - rider.x).hypot(ball.y) < HIT_RADIUS
        });
        let alive = !hit && rider.x.abs() <= RAIL_HALF_WIDTH;
        Step { alive, reward: dt }
    }
}
