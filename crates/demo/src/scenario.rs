//! The scripted run: who watches what, and the wizard's tampering loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use thiserror::Error;

use scry::{
    CallError, DEFAULT_SURFACE, GazeError, ObserverError, ObserverId, Scry, SurfaceName,
    SurfaceRef, Target, gaze,
};
use scry_core::value::opt_str;

use crate::config::DemoConfig;
use crate::crystal_ball::{CrystalBall, WATCHED, crystal_ball};
use crate::narrator::Narrator;

type Ball = Arc<Target<CrystalBall>>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("setup failed: {0}")]
    Gaze(#[from] GazeError),

    #[error("call failed: {0}")]
    Call(#[from] CallError),

    #[error("crystal ball has no scry surface")]
    MissingSurface,

    #[error("method {0} is not watched")]
    NotWatched(&'static str),

    #[error("observer on {0} was registered twice")]
    AlreadyRecorded(&'static str),
}

/// What happened during a run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub turns: usize,
    pub shattered: bool,
    pub final_state: CrystalBall,
    pub script: Vec<String>,
}

fn surface_of(ball: &Target<CrystalBall>) -> Result<SurfaceRef<'_, CrystalBall>, ScenarioError> {
    ball.surface(DEFAULT_SURFACE)
        .ok_or(ScenarioError::MissingSurface)
}

/// Surface lookup from inside an observer.
fn observer_surface(
    ball: &Target<CrystalBall>,
) -> Result<SurfaceRef<'_, CrystalBall>, ObserverError> {
    ball.surface(DEFAULT_SURFACE)
        .ok_or_else(|| ObserverError::failed("crystal ball has no scry surface"))
}

/// Remember the id of an observer that later refers to itself.
fn record(
    slot: &OnceLock<ObserverId>,
    id: ObserverId,
    method: &'static str,
) -> Result<(), ScenarioError> {
    slot.set(id)
        .map_err(|_| ScenarioError::AlreadyRecorded(method))
}

/// The witch puts the ball back whenever it moves and leaves once it shatters.
struct Witch;

impl Witch {
    fn guard(ball: &Ball, narrator: &Narrator) -> Result<(), ScenarioError> {
        let move_back: Arc<OnceLock<ObserverId>> = Arc::default();
        let cry_out: Arc<OnceLock<ObserverId>> = Arc::default();

        let (b, n, me) = (Arc::clone(ball), narrator.clone(), Arc::clone(&move_back));
        let id = surface_of(ball)?
            .watch("move", move |_| {
                n.say("Witch", "Who moved this? I'm putting it back where it belongs.");
                // Quietly, or she would hear her own move and loop forever.
                if let Some(me) = me.get() {
                    observer_surface(&b)?.quietly("move", *me, &[json!(0), json!(0)])?;
                }
                n.say("Witch", "And now the ball is filthy. I can fix that!");
                b.call("polish", &[])?;
                Ok(())
            })
            .ok_or(ScenarioError::NotWatched("move"))?;
        record(&move_back, id, "move")?;

        let (b, n) = (Arc::clone(ball), narrator.clone());
        let (mine_move, mine_cry) = (Arc::clone(&move_back), Arc::clone(&cry_out));
        let id = surface_of(ball)?
            .watch("shatter", move |args| {
                let device = opt_str(args, 0).unwrap_or("something");
                n.say(
                    "Witch",
                    format!(
                        "Curses! Who brought a {device} in here? My crystal ball is shattered! I'm leaving!"
                    ),
                );
                let ids: Vec<ObserverId> = [mine_move.get(), mine_cry.get()]
                    .into_iter()
                    .flatten()
                    .copied()
                    .collect();
                observer_surface(&b)?.unwatch(ids);
                Ok(())
            })
            .ok_or(ScenarioError::NotWatched("shatter"))?;
        record(&cry_out, id, "shatter")?;
        Ok(())
    }
}

/// The cat admires the ball after every polish and hisses when it breaks.
struct Cat;

impl Cat {
    fn keep(ball: &Ball, narrator: &Narrator) -> Result<(), ScenarioError> {
        let b = Arc::clone(ball);
        surface_of(ball)?
            .watch("polish", move |_| {
                b.call("admire", &[json!("The cat")])?;
                Ok(())
            })
            .ok_or(ScenarioError::NotWatched("polish"))?;

        let n = narrator.clone();
        surface_of(ball)?
            .watch("shatter", move |_| {
                n.say("Cat", "Hssss!");
                Ok(())
            })
            .ok_or(ScenarioError::NotWatched("shatter"))?;
        Ok(())
    }
}

/// The wizard moves the ball around and gets clumsier with every move.
struct Wizard {
    rng: StdRng,
    times_moved: u32,
}

impl Wizard {
    const CLUMSINESS: f64 = 0.28;

    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            times_moved: 0,
        }
    }

    /// One turn. Returns whether the ball broke.
    fn tamper(&mut self, ball: &Ball, narrator: &Narrator) -> Result<bool, ScenarioError> {
        narrator.say("Wizard", "Tee hee! I'm moving the crystal ball!");
        let breaks = self.rng.r#gen::<f64>() < Self::CLUMSINESS * f64::from(self.times_moved);
        if breaks {
            ball.call("shatter", &[json!("clumsy wizard")])?;
            narrator.say("Wizard", "Ooops! I'll fix it.");
            ball.call("fix", &[])?;
            ball.call("move", &[json!(0), json!(0)])?;
            ball.call("polish", &[])?;
        } else {
            let x = self.rng.gen_range(1..=5);
            let y = self.rng.gen_range(1..=5);
            ball.call("move", &[json!(x), json!(y)])?;
            self.times_moved += 1;
        }
        Ok(breaks)
    }
}

/// Run the scenario until the ball is fixed after breaking, or the turns run out.
pub fn run(config: &DemoConfig) -> Result<Outcome, ScenarioError> {
    let narrator = Narrator::new();
    let mut ball = crystal_ball(0, 0, narrator.clone());
    // `admire` stays unwatched: nobody cares whether the ball is admired.
    gaze(&mut ball, WATCHED, SurfaceName::default())?;
    let ball: Ball = Arc::new(ball);

    Witch::guard(&ball, &narrator)?;
    Cat::keep(&ball, &narrator)?;

    let stop = Arc::new(AtomicBool::new(false));
    let s = Arc::clone(&stop);
    surface_of(&ball)?
        .watch("fix", move |_| {
            s.store(true, Ordering::SeqCst);
            Ok(())
        })
        .ok_or(ScenarioError::NotWatched("fix"))?;

    let mut wizard = Wizard::new(config.seed);
    let mut turns = 0;
    let mut shattered = false;
    let result = loop {
        if turns == config.max_turns || stop.load(Ordering::SeqCst) {
            break Ok(());
        }
        turns += 1;
        tracing::debug!(turn = turns, "wizard tampers");
        match wizard.tamper(&ball, &narrator) {
            Ok(broke) => shattered |= broke,
            Err(err) => break Err(err),
        }
        if !config.pause.is_zero() {
            std::thread::sleep(config.pause);
        }
    };

    // Observers hold the ball; clearing them releases it even on failure.
    surface_of(&ball)?.unwatch_all(None);
    result?;

    ball.call("move", &[json!(0), json!(0)])?;
    ball.call("polish", &[])?;

    let final_state = ball.with_state(CrystalBall::clone)?;
    tracing::info!(turns, shattered, "scenario finished");
    Ok(Outcome {
        turns,
        shattered,
        final_state,
        script: narrator.lines(),
    })
}
